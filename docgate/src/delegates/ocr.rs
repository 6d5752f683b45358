//! OCR delegate for the ocr.space form API.
//!
//! The upstream fetches the document itself, so callers pass a publicly reachable URL (usually
//! one returned by the upload endpoint).

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{DelegateOutcome, record_outcome};
use crate::config::OcrConfig;

/// OCR engine selected on every request.
const OCR_ENGINE: &str = "2";

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(rename = "IsErroredOnProcessing", default)]
    is_errored_on_processing: bool,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: Option<String>,
}

impl OcrResponse {
    /// Non-empty page texts joined with newlines.
    fn joined_text(self) -> String {
        self.parsed_results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|result| result.parsed_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct OcrClient {
    client: Client,
    config: OcrConfig,
}

impl OcrClient {
    pub fn new(client: Client, config: OcrConfig) -> Self {
        Self { client, config }
    }

    /// Run OCR on the document at `file_url`.
    #[instrument(skip(self))]
    pub async fn recognize(&self, file_url: &str) -> DelegateOutcome<String> {
        let outcome = self.recognize_inner(file_url).await;
        record_outcome("ocr", &outcome);
        outcome
    }

    async fn recognize_inner(&self, file_url: &str) -> DelegateOutcome<String> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|key| !key.is_empty()) else {
            debug!("No OCR API key configured, skipping upstream call");
            return DelegateOutcome::Empty;
        };

        let form = [
            ("apikey", api_key),
            ("url", file_url),
            ("OCREngine", OCR_ENGINE),
            ("scale", "true"),
            ("isTable", "true"),
        ];

        let response = match self
            .client
            .post(self.config.url.clone())
            .timeout(self.config.timeout)
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DelegateOutcome::Failed(format!("OCR request failed: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            return DelegateOutcome::Failed(format!("OCR upstream returned HTTP {status}"));
        }

        let parsed: OcrResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return DelegateOutcome::Failed(format!("failed to parse OCR response: {e}")),
        };

        let errored = parsed.is_errored_on_processing;
        let error_message = parsed.error_message.clone();
        let text = parsed.joined_text();

        if !text.is_empty() {
            DelegateOutcome::Success(text)
        } else if errored {
            let detail = error_message.map(|m| m.to_string()).unwrap_or_else(|| "unknown error".to_string());
            DelegateOutcome::Failed(format!("OCR processing error: {detail}"))
        } else {
            DelegateOutcome::Empty
        }
    }
}
