//! Builds the analysis prompt and calls the inference endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{error::AnalysisError, models::record::VitalsForm};

/// Fixed instructions appended to every prompt.
const INSTRUCTIONS: &str = "TASK: act as a senior doctor. Analyze the risk. Be kind but direct.\n\
If the history shows a worsening trend, mention it.\n\
Keep the response under 100 words.";

/// Sends a prompt to an inference service and returns its analysis.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn predict(&self, prompt: &str) -> Result<String, AnalysisError>;
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    analysis: String,
}

/// `InferenceClient` speaking the `POST /predict` JSON protocol.
///
/// No timeout is configured: a hung endpoint holds the request until the
/// transport gives up.
#[derive(Clone)]
pub struct HttpInferenceClient {
    client: Client,
    predict_url: String,
}

impl HttpInferenceClient {
    /// `base_url` is the service root, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            predict_url: format!("{}/predict", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn predict(&self, prompt: &str) -> Result<String, AnalysisError> {
        let response = self
            .client
            .post(&self.predict_url)
            .json(&PredictRequest { prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AnalysisError::Status { status, body });
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;
        Ok(parsed.analysis)
    }
}

/// Builds the prompt sent to the inference endpoint.
pub fn build_prompt(vitals: &VitalsForm, digest: &str) -> String {
    format!(
        "PATIENT HISTORY: {digest}\n\
         CURRENT VITALS: BP {sys}/{dia}, Heart Rate {heart}, Glucose {glucose}.\n\
         CHRONIC CONDITIONS: {chronic}\n\
         CURRENT SYMPTOMS: {symptoms}\n\
         \n\
         {INSTRUCTIONS}",
        sys = vitals.bp_sys,
        dia = vitals.bp_dia,
        heart = vitals.heart,
        glucose = vitals.glucose,
        chronic = vitals.chronic,
        symptoms = vitals.symptoms,
    )
}

/// Asks the inference endpoint to analyze `vitals` in light of `digest`.
pub async fn analyze(
    client: &dyn InferenceClient,
    vitals: &VitalsForm,
    digest: &str,
) -> Result<String, AnalysisError> {
    let prompt = build_prompt(vitals, digest);
    tracing::debug!("🧠 Sending {} byte prompt to inference endpoint", prompt.len());
    let analysis = client.predict(&prompt).await?;
    tracing::info!("✅ Analysis received ({} bytes)", analysis.len());
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals() -> VitalsForm {
        VitalsForm {
            bp_sys: "140".into(),
            bp_dia: "95".into(),
            glucose: "180".into(),
            heart: "88".into(),
            chronic: "type 2 diabetes".into(),
            symptoms: "blurred vision".into(),
        }
    }

    #[test]
    fn prompt_embeds_digest_and_vitals() {
        let digest = "[Date: 1/1/2026, BP: 130/90, Sugar: 150, Symptoms: none]";
        let prompt = build_prompt(&vitals(), digest);

        assert!(prompt.starts_with(&format!("PATIENT HISTORY: {}\n", digest)));
        assert!(prompt.contains("CURRENT VITALS: BP 140/95, Heart Rate 88, Glucose 180.\n"));
        assert!(prompt.contains("CHRONIC CONDITIONS: type 2 diabetes\n"));
        assert!(prompt.contains("CURRENT SYMPTOMS: blurred vision\n"));
    }

    #[test]
    fn prompt_ends_with_fixed_instructions() {
        let prompt = build_prompt(&vitals(), "No previous history available.");
        assert!(prompt.ends_with("Keep the response under 100 words."));
        assert!(prompt.contains("If the history shows a worsening trend, mention it."));
    }

    #[test]
    fn predict_url_has_single_slash() {
        let client = HttpInferenceClient::new("http://127.0.0.1:8000/");
        assert_eq!(client.predict_url, "http://127.0.0.1:8000/predict");
    }

    struct Echo;

    #[async_trait]
    impl InferenceClient for Echo {
        async fn predict(&self, prompt: &str) -> Result<String, AnalysisError> {
            Ok(prompt.lines().next().unwrap_or_default().to_string())
        }
    }

    #[tokio::test]
    async fn analyze_relays_client_answer() {
        let answer = analyze(&Echo, &vitals(), "digest").await.unwrap();
        assert_eq!(answer, "PATIENT HISTORY: digest");
    }
}
