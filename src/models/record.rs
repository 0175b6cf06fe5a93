use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::PersistenceError;

/// The vitals form as submitted by the page.
///
/// Every field is free text and may be missing; nothing is validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsForm {
    pub bp_sys: String,
    pub bp_dia: String,
    pub glucose: String,
    pub heart: String,
    pub chronic: String,
    pub symptoms: String,
}

/// A record that has been collected but not yet analyzed or stored.
#[derive(Debug, Clone)]
pub struct VitalsDraft {
    pub owner_uid: String,
    pub vitals: VitalsForm,
    /// Calendar date as shown to the user, e.g. `10/18/2026`.
    pub date: String,
    pub created_at: DateTime<Utc>,
}

impl VitalsDraft {
    /// Captures `form` for `owner_uid` at the current instant.
    pub fn capture(owner_uid: impl Into<String>, form: VitalsForm) -> Self {
        let created_at = Utc::now();
        Self {
            owner_uid: owner_uid.into(),
            vitals: form,
            date: display_date(&created_at.with_timezone(&Local)),
            created_at,
        }
    }

    /// Attaches the analysis text, producing the record that gets persisted.
    pub fn into_record(self, ai_analysis: String) -> VitalsRecord {
        let VitalsForm {
            bp_sys,
            bp_dia,
            glucose,
            heart,
            chronic,
            symptoms,
        } = self.vitals;

        VitalsRecord {
            id: Uuid::new_v4(),
            owner_uid: self.owner_uid,
            bp_sys,
            bp_dia,
            glucose,
            heart,
            chronic,
            symptoms,
            date: self.date,
            created_at: self.created_at,
            ai_analysis,
        }
    }
}

/// Formats a date the way the dashboard displays it (`M/D/YYYY`).
pub fn display_date<Tz: chrono::TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-m/%-d/%Y").to_string()
}

/// Represents one stored vitals check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsRecord {
    /// The unique identifier for the record.
    pub id: Uuid,
    /// The principal that owns the record.
    pub owner_uid: String,
    /// Systolic blood pressure.
    pub bp_sys: String,
    /// Diastolic blood pressure.
    pub bp_dia: String,
    /// Glucose level.
    pub glucose: String,
    /// Heart rate.
    pub heart: String,
    /// Chronic conditions.
    pub chronic: String,
    /// Symptoms at the time of the check.
    pub symptoms: String,
    /// The date shown in the history list.
    pub date: String,
    /// The instant the record was created; drives ordering.
    pub created_at: DateTime<Utc>,
    /// The analysis returned by the inference endpoint.
    pub ai_analysis: String,
}

impl TryFrom<&Row> for VitalsRecord {
    type Error = PersistenceError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        fn column<'a, T: tokio_postgres::types::FromSql<'a>>(
            row: &'a Row,
            name: &str,
        ) -> Result<T, PersistenceError> {
            row.try_get(name)
                .map_err(|_| PersistenceError::MissingData(name.to_string()))
        }

        Ok(Self {
            id: column(row, "id")?,
            owner_uid: column(row, "owner_uid")?,
            bp_sys: column(row, "bp_sys")?,
            bp_dia: column(row, "bp_dia")?,
            glucose: column(row, "glucose")?,
            heart: column(row, "heart")?,
            chronic: column(row, "chronic")?,
            symptoms: column(row, "symptoms")?,
            date: column(row, "display_date")?,
            created_at: column(row, "created_at")?,
            ai_analysis: column(row, "ai_analysis")?,
        })
    }
}
