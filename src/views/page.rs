use crate::{
    error::{AppError, Result},
    services::session_gate::GateView,
    views::templates,
};

/// Renders the whole page.
///
/// Exactly one of the two regions is visible: the sign-in region for
/// [`GateView::LoggedOut`], the dashboard (with the display name and the
/// history list) otherwise. `busy` renders the analyze button disabled.
pub fn render(view: &GateView, client_id: &str, busy: bool) -> Result<String> {
    let (signed_in, display_name, history_html) = match view {
        GateView::LoggedOut => (false, "", ""),
        GateView::Dashboard {
            display_name,
            history_html,
        } => (true, display_name.as_str(), history_html.as_str()),
    };

    templates()
        .get_template("page.html")
        .and_then(|t| {
            t.render(minijinja::context! {
                signed_in => signed_in,
                display_name => display_name,
                history_html => history_html,
                client_id => client_id,
                busy => busy,
            })
        })
        .map_err(|e| AppError::Internal(format!("page template: {}", e)))
}
