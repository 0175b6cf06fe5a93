use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::record::VitalsRecord,
    views::templates,
};

/// Characters of the symptoms text shown in a history entry.
pub const HEADLINE_CHARS: usize = 30;

/// Label used when a record has no symptoms.
pub const CHECKUP_LABEL: &str = "Checkup";

#[derive(Serialize)]
struct HistoryItem<'a> {
    date: &'a str,
    headline: String,
    bp_sys: &'a str,
    bp_dia: &'a str,
    glucose: &'a str,
}

/// Short description of a record: the start of its symptoms, or the
/// check-up label when none were entered.
pub fn headline(symptoms: &str) -> String {
    if symptoms.is_empty() {
        return CHECKUP_LABEL.to_string();
    }
    let head: String = symptoms.chars().take(HEADLINE_CHARS).collect();
    format!("{}...", head)
}

/// Renders the history list markup for `records`, in the order given.
///
/// The output always replaces whatever list was shown before; an empty
/// slice renders the "no records" placeholder.
pub fn render(records: &[VitalsRecord]) -> Result<String> {
    let items: Vec<HistoryItem<'_>> = records
        .iter()
        .map(|r| HistoryItem {
            date: &r.date,
            headline: headline(&r.symptoms),
            bp_sys: &r.bp_sys,
            bp_dia: &r.bp_dia,
            glucose: &r.glucose,
        })
        .collect();

    templates()
        .get_template("history.html")
        .and_then(|t| t.render(minijinja::context! { items => items }))
        .map_err(|e| AppError::Internal(format!("history template: {}", e)))
}
