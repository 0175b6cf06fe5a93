//! The analyze-and-save flow behind the analyze button.

use serde::Serialize;

use crate::{
    error::Result,
    models::{
        record::{VitalsDraft, VitalsForm, VitalsRecord},
        session::Session,
    },
    services::{analysis, history, records},
    state::AppState,
    views,
};

/// What the page shows after a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmissionOutcome {
    pub analysis: String,
    pub history_html: String,
}

/// Runs one submission for the signed-in user.
///
/// The analyze control stays engaged for the whole flow and is restored on
/// every exit path. A failed analysis returns before anything is written.
/// There is no transaction: if the write fails after a successful analysis,
/// the analysis is lost. Once the write succeeds the submission has
/// succeeded; a failed history reload falls back to the last displayed list,
/// or to the new record alone.
pub async fn submit(state: &AppState, session: &Session, form: VitalsForm) -> Result<SubmissionOutcome> {
    let owner = session.owner();
    let _control = state.submit_controls.engage(owner);

    let draft = VitalsDraft::capture(owner, form);
    tracing::info!("🩺 Vitals submitted by {} ({})", owner, draft.date);

    let digest = history::summarize(state.records.as_ref(), owner).await?;
    let analysis = analysis::analyze(state.inference.as_ref(), &draft.vitals, &digest).await?;

    let record = draft.into_record(analysis.clone());
    records::insert(state.records.as_ref(), Some(session), &record).await?;

    let history_html = match history::reload(state, owner).await {
        Ok(markup) => markup,
        Err(e) => {
            tracing::warn!("⚠️ History reload failed after saving {}: {}", record.id, e);
            fallback_history(state, owner, &record)
        }
    };

    Ok(SubmissionOutcome {
        analysis,
        history_html,
    })
}

fn fallback_history(state: &AppState, owner: &str, record: &VitalsRecord) -> String {
    if let Some(markup) = state.board.current(owner) {
        return markup;
    }
    views::history::render(std::slice::from_ref(record)).unwrap_or_else(|e| {
        tracing::warn!("⚠️ Could not render fallback history: {}", e);
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{AnalysisError, AppError, AuthError, PersistenceError};
    use crate::models::session::Principal;
    use crate::repositories::memory::{MemoryRecordStore, MemorySessionStore};
    use crate::repositories::record::RecordStore;
    use crate::services::{analysis::InferenceClient, identity::IdentityProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct NoSignIn;

    #[async_trait]
    impl IdentityProvider for NoSignIn {
        async fn verify(&self, _: &str) -> std::result::Result<Principal, AuthError> {
            Err(AuthError::Rejected("unused".into()))
        }
    }

    /// Records prompts and answers with a canned reply or failure.
    struct Scripted {
        reply: std::result::Result<String, u16>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InferenceClient for Scripted {
        async fn predict(&self, prompt: &str) -> std::result::Result<String, AnalysisError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(AnalysisError::Status {
                    status: *status,
                    body: "upstream failure".into(),
                }),
            }
        }
    }

    fn setup(reply: std::result::Result<String, u16>) -> (AppState, Arc<MemoryRecordStore>, Arc<Scripted>) {
        let records = Arc::new(MemoryRecordStore::new());
        let inference = Arc::new(Scripted {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let state = AppState::from_parts(
            Config::in_memory("client"),
            records.clone(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(NoSignIn),
            inference.clone(),
        );
        (state, records, inference)
    }

    fn session() -> Session {
        Session::new(
            Principal {
                uid: "uid-ada".into(),
                display_name: "Ada".into(),
            },
            chrono::Duration::hours(1),
        )
    }

    fn form(symptoms: &str) -> VitalsForm {
        VitalsForm {
            bp_sys: "150".into(),
            bp_dia: "100".into(),
            glucose: "200".into(),
            heart: "95".into(),
            chronic: "hypertension".into(),
            symptoms: symptoms.into(),
        }
    }

    #[tokio::test]
    async fn successful_submission_persists_and_refreshes() {
        let (state, records, inference) = setup(Ok("Monitor closely.".into()));

        let outcome = submit(&state, &session(), form("headache")).await.unwrap();

        assert_eq!(outcome.analysis, "Monitor closely.");
        assert_eq!(records.insert_count(), 1);
        assert!(outcome.history_html.contains("headache..."));
        assert!(!state.submit_controls.is_engaged("uid-ada"));

        let stored = records.query("uid-ada", None).await.unwrap();
        assert_eq!(stored[0].ai_analysis, "Monitor closely.");
        assert_eq!(stored[0].bp_sys, "150");

        let prompts = inference.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("PATIENT HISTORY: No previous history available.\n"));
    }

    #[tokio::test]
    async fn second_submission_sees_first_in_digest() {
        let (state, _, inference) = setup(Ok("ok".into()));

        submit(&state, &session(), form("first")).await.unwrap();
        submit(&state, &session(), form("second")).await.unwrap();

        let prompts = inference.prompts.lock().unwrap();
        assert!(prompts[1].contains("Symptoms: first]"));
        assert!(prompts[1].contains("CURRENT SYMPTOMS: second"));
    }

    #[tokio::test]
    async fn failed_analysis_persists_nothing_and_restores_control() {
        let (state, records, _) = setup(Err(503));

        let err = submit(&state, &session(), form("dizzy")).await.unwrap_err();

        assert!(matches!(err, AppError::Analysis(AnalysisError::Status { status: 503, .. })));
        assert!(err.alert_message().starts_with("Error connecting to AI: "));
        assert_eq!(records.insert_count(), 0);
        assert!(!state.submit_controls.is_engaged("uid-ada"));
    }

    /// Accepts writes, but every read after the first write fails.
    #[derive(Default)]
    struct ReadsFailAfterWrite {
        inner: MemoryRecordStore,
        written: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for ReadsFailAfterWrite {
        async fn insert(&self, record: &VitalsRecord) -> std::result::Result<(), PersistenceError> {
            self.inner.insert(record).await?;
            self.written.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn query(
            &self,
            owner: &str,
            limit: Option<usize>,
        ) -> std::result::Result<Vec<VitalsRecord>, PersistenceError> {
            if self.written.load(Ordering::SeqCst) {
                return Err(PersistenceError::MissingData("read down".into()));
            }
            self.inner.query(owner, limit).await
        }
    }

    #[tokio::test]
    async fn saved_submission_survives_failed_history_reload() {
        let records = Arc::new(ReadsFailAfterWrite::default());
        let state = AppState::from_parts(
            Config::in_memory("client"),
            records.clone(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(NoSignIn),
            Arc::new(Scripted {
                reply: Ok("Rest and recheck.".into()),
                prompts: Mutex::new(Vec::new()),
            }),
        );

        let outcome = submit(&state, &session(), form("chest tightness")).await.unwrap();

        assert_eq!(outcome.analysis, "Rest and recheck.");
        assert!(outcome.history_html.contains("chest tightness..."));
        assert_eq!(records.inner.insert_count(), 1);
        assert!(!state.submit_controls.is_engaged("uid-ada"));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previously_displayed_history() {
        let (state, _, _) = setup(Ok("ok".into()));
        let ticket = state.board.begin("uid-ada");
        state.board.publish(&ticket, "<p>shown before</p>".into());
        let record = VitalsDraft::capture("uid-ada", form("x")).into_record("ok".into());

        assert_eq!(fallback_history(&state, "uid-ada", &record), "<p>shown before</p>");
    }
}
