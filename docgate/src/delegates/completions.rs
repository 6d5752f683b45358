//! Chat completion delegate: plain chat and JSON field extraction against an OpenAI-compatible
//! `/chat/completions` endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{DelegateOutcome, FieldMap, SchemaDescriptor, record_outcome};
use crate::config::OpenAiConfig;

/// Sampling temperature for free-form chat.
pub const CHAT_TEMPERATURE: f64 = 0.2;
/// Sampling temperature for structured extraction.
pub const EXTRACTION_TEMPERATURE: f64 = 0.0;

const EXTRACTION_SYSTEM_PROMPT: &str = "Extract and return JSON matching the provided schema keys only.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Value],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completion API.
pub struct CompletionClient {
    client: Client,
    config: OpenAiConfig,
}

impl CompletionClient {
    pub fn new(client: Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.as_str().trim_end_matches('/'))
    }

    /// Forward `messages` verbatim and return the first choice's text.
    #[instrument(skip_all, fields(messages = messages.len()))]
    pub async fn complete(&self, messages: &[Value]) -> DelegateOutcome<String> {
        let outcome = self.chat(messages, CHAT_TEMPERATURE, None).await;
        record_outcome("chat", &outcome);
        outcome
    }

    /// Ask the model for a JSON object holding exactly `schema`'s keys.
    ///
    /// A successful answer is always projected onto the schema; an answer that is not a JSON
    /// object counts as a failed call.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn extract_fields(&self, text: &str, schema: &SchemaDescriptor) -> DelegateOutcome<FieldMap> {
        let messages = extraction_messages(text, schema);
        let response_format = json!({ "type": "json_object" });

        let outcome = match self.chat(&messages, EXTRACTION_TEMPERATURE, Some(response_format)).await {
            DelegateOutcome::Success(content) => match serde_json::from_str::<Value>(&content) {
                Ok(answer) if answer.is_object() => DelegateOutcome::Success(schema.project(&answer)),
                Ok(_) => DelegateOutcome::Failed("extraction answer is not a JSON object".to_string()),
                Err(e) => DelegateOutcome::Failed(format!("extraction answer is not valid JSON: {e}")),
            },
            DelegateOutcome::Empty => DelegateOutcome::Empty,
            DelegateOutcome::Failed(reason) => DelegateOutcome::Failed(reason),
        };
        record_outcome("extract", &outcome);
        outcome
    }

    async fn chat(&self, messages: &[Value], temperature: f64, response_format: Option<Value>) -> DelegateOutcome<String> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|key| !key.is_empty()) else {
            debug!("No completion API key configured, skipping upstream call");
            return DelegateOutcome::Empty;
        };

        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature,
            response_format,
        };

        let response = match self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(self.config.timeout)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DelegateOutcome::Failed(format!("completion request failed: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return DelegateOutcome::Failed(format!("HTTP {status} - {body}"));
        }

        let parsed: ChatCompletionResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return DelegateOutcome::Failed(format!("failed to parse completion response: {e}")),
        };

        match parsed.choices.into_iter().next().and_then(|choice| choice.message.content) {
            Some(content) if !content.is_empty() => DelegateOutcome::Success(content),
            _ => DelegateOutcome::Empty,
        }
    }
}

/// System and user messages for a structured extraction request.
pub fn extraction_messages(text: &str, schema: &SchemaDescriptor) -> Vec<Value> {
    let user = format!(
        "Text:\n{text}\n\nSchema keys:\n{}\nReturn valid JSON.",
        schema.key_list_literal()
    );

    vec![
        json!({ "role": "system", "content": EXTRACTION_SYSTEM_PROMPT }),
        json!({ "role": "user", "content": user }),
    ]
}
