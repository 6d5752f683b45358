use axum::{
    Form,
    extract::State,
    response::Html,
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::{
    AppState,
    activity_log::{ActivityEntry, ActivityKind},
    delegates::SchemaDescriptor,
    errors::{Error, Result},
};

/// Form inputs holding extracted values are named `field_<key>`.
const FIELD_PREFIX: &str = "field_";

#[derive(Debug, Default, Deserialize)]
pub struct OcrForm {
    #[serde(default)]
    pub file_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PrefillForm {
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
    /// JSON-encoded turns so far
    #[serde(default)]
    pub transcript: String,
}

/// One displayed chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

fn render(state: &AppState, name: &str, ctx: minijinja::Value) -> Result<Html<String>> {
    let html = state
        .templates
        .get_template(name)
        .and_then(|template| template.render(ctx))
        .map_err(|e| Error::Internal {
            operation: format!("render {name}: {e}"),
        })?;
    Ok(Html(html))
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// `GET /ui`: ask for the document URL.
pub async fn start(State(state): State<AppState>) -> Result<Html<String>> {
    render(&state, "index.html", context! {})
}

/// `POST /ui/ocr`: read the document and show its text for review.
#[instrument(skip_all)]
pub async fn ocr_step(State(state): State<AppState>, Form(form): Form<OcrForm>) -> Result<Html<String>> {
    if blank(&form.file_url) {
        return render(&state, "index.html", context! { error => "file_url required" });
    }

    let outcome = state.ocr.recognize(&form.file_url).await;
    state
        .activity_log
        .record(ActivityEntry::new(
            ActivityKind::Ocr,
            form.file_url.clone(),
            Some(outcome.label().to_string()),
        ))
        .await;

    render(
        &state,
        "ocr.html",
        context! { file_url => form.file_url, text => outcome.into_value_or_default() },
    )
}

/// `POST /ui/prefill`: extract the default fields from the reviewed text.
#[instrument(skip_all)]
pub async fn prefill_step(State(state): State<AppState>, Form(form): Form<PrefillForm>) -> Result<Html<String>> {
    if blank(&form.text) {
        return render(
            &state,
            "ocr.html",
            context! { file_url => form.file_url, text => form.text, error => "text required" },
        );
    }

    let schema = SchemaDescriptor::default();
    let fields = state
        .completions
        .extract_fields(&form.text, &schema)
        .await
        .into_value_or_else(|| schema.empty_fields());

    render(
        &state,
        "prefill.html",
        context! { file_url => form.file_url, text => form.text, fields => fields },
    )
}

/// `POST /ui/esign`: start signing with the reviewed field values.
#[instrument(skip_all)]
pub async fn esign_step(
    State(state): State<AppState>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Html<String>> {
    let input = |name: &str| {
        form.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    };
    let fields: Map<String, Value> = form
        .iter()
        .filter_map(|(name, value)| {
            name.strip_prefix(FIELD_PREFIX)
                .map(|key| (key.to_string(), Value::String(value.clone())))
        })
        .collect();
    let file_url = input("file_url");

    if blank(file_url) {
        return render(
            &state,
            "prefill.html",
            context! {
                file_url => file_url,
                text => input("text"),
                fields => fields,
                error => "document_url required",
            },
        );
    }

    let session = state.esign.start_session(file_url, &fields).await;
    render(&state, "esign.html", context! { session => session, fields => fields })
}

/// Parse the hidden transcript, dropping it entirely if it has been tampered into something else.
fn parse_transcript(raw: &str) -> Vec<ChatTurn> {
    if blank(raw) {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::debug!("Discarding unparseable chat transcript: {}", e);
        Vec::new()
    })
}

fn render_chat(state: &AppState, transcript: &[ChatTurn], error: Option<&str>) -> Result<Html<String>> {
    let transcript_json = serde_json::to_string(transcript).map_err(|e| Error::Internal {
        operation: format!("serialize chat transcript: {e}"),
    })?;
    render(
        state,
        "chat.html",
        context! { transcript => transcript, transcript_json => transcript_json, error => error },
    )
}

/// `GET /ui/chat`: empty conversation.
pub async fn chat_page(State(state): State<AppState>) -> Result<Html<String>> {
    render_chat(&state, &[], None)
}

/// `POST /ui/chat`: send one message with the conversation so far.
#[instrument(skip_all)]
pub async fn chat_step(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Result<Html<String>> {
    let mut transcript = parse_transcript(&form.transcript);

    if blank(&form.message) {
        return render_chat(&state, &transcript, Some("message required"));
    }

    transcript.push(ChatTurn {
        role: "user".to_string(),
        content: form.message,
    });

    let messages: Vec<Value> = transcript
        .iter()
        .map(|turn| serde_json::json!({ "role": turn.role, "content": turn.content }))
        .collect();
    let reply = state.completions.complete(&messages).await.into_value_or_default();

    if reply.is_empty() {
        return render_chat(&state, &transcript, Some("The assistant is unavailable right now."));
    }

    transcript.push(ChatTurn {
        role: "assistant".to_string(),
        content: reply,
    });
    render_chat(&state, &transcript, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esign::mock::MOCK_SIGNING_URL;
    use crate::test_utils::{completion_body, create_test_config, create_test_server, with_ocr, with_openai};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Page text with the template engine's escaped slashes restored.
    fn page(response: &axum_test::TestResponse) -> String {
        response.text().replace("&#x2f;", "/")
    }

    #[tokio::test]
    async fn test_start_page_needs_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(create_test_config(dir.path())).await;

        let response = server.get("/ui").await;
        response.assert_status_ok();
        assert!(response.header("content-type").to_str().unwrap().starts_with("text/html"));
        assert!(page(&response).contains(r#"action="/ui/ocr""#));
    }

    #[tokio::test]
    async fn test_ocr_step_missing_url_renders_inline_error() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(create_test_config(dir.path())).await;

        let response = server.post("/ui/ocr").form(&[("file_url", "  ")]).await;
        response.assert_status_ok();
        assert!(response.text().contains("file_url required"));
    }

    #[tokio::test]
    async fn test_ocr_step_carries_url_forward() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ParsedResults": [{ "ParsedText": "Name: Asha & Co" }]
            })))
            .mount(&upstream)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(with_ocr(create_test_config(dir.path()), &upstream)).await;

        let response = server
            .post("/ui/ocr")
            .form(&[("file_url", "http://files.test/files/a.pdf")])
            .await;
        response.assert_status_ok();

        let html = page(&response);
        assert!(html.contains(r#"name="file_url" value="http://files.test/files/a.pdf""#));
        assert!(html.contains("Name: Asha &amp; Co"));
    }

    #[tokio::test]
    async fn test_prefill_step_renders_default_fields() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body(r#"{"name": "Asha Rao", "mobile": "98450"}"#)),
            )
            .mount(&upstream)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(with_openai(create_test_config(dir.path()), &upstream)).await;

        let response = server
            .post("/ui/prefill")
            .form(&[("file_url", "http://files.test/files/a.pdf"), ("text", "Name: Asha Rao")])
            .await;
        response.assert_status_ok();

        let html = response.text();
        for key in ["name", "dob", "address", "mobile"] {
            assert!(html.contains(&format!(r#"name="field_{key}""#)));
        }
        assert!(html.contains(r#"value="Asha Rao""#));
        assert!(html.contains(r#"name="text" value="Name: Asha Rao""#));
    }

    #[tokio::test]
    async fn test_prefill_step_requires_text() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(create_test_config(dir.path())).await;

        let response = server
            .post("/ui/prefill")
            .form(&[("file_url", "http://files.test/files/a.pdf"), ("text", "")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("text required"));
    }

    #[tokio::test]
    async fn test_esign_step_shows_signing_link() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(create_test_config(dir.path())).await;

        let response = server
            .post("/ui/esign")
            .form(&[
                ("file_url", "http://files.test/files/a.pdf"),
                ("text", "Name: Asha Rao"),
                ("field_name", "Asha Rao"),
                ("field_dob", ""),
            ])
            .await;
        response.assert_status_ok();

        let html = page(&response);
        assert!(html.contains(MOCK_SIGNING_URL));
        assert!(html.contains("Asha Rao"));

        // Fields are listed in the order the form sent them
        let name_at = html.find("<dt>name</dt>").unwrap();
        let dob_at = html.find("<dt>dob</dt>").unwrap();
        assert!(name_at < dob_at);
    }

    #[tokio::test]
    async fn test_esign_step_unsupported_provider_and_missing_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config(dir.path());
        config.esign.provider = "aadhaar".to_string();
        let server = create_test_server(config).await;

        let response = server
            .post("/ui/esign")
            .form(&[("file_url", "http://files.test/files/a.pdf"), ("field_name", "A")])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Unsupported e-sign provider"));

        let response = server.post("/ui/esign").form(&[("field_name", "A")]).await;
        response.assert_status_ok();
        assert!(response.text().contains("document_url required"));
    }

    #[tokio::test]
    async fn test_chat_step_appends_turns() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "user", "content": "Hi" },
                    { "role": "assistant", "content": "Hello!" },
                    { "role": "user", "content": "What is a DOB?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Date of birth.")))
            .expect(1)
            .mount(&upstream)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(with_openai(create_test_config(dir.path()), &upstream)).await;

        let transcript = serde_json::to_string(&vec![
            ChatTurn {
                role: "user".to_string(),
                content: "Hi".to_string(),
            },
            ChatTurn {
                role: "assistant".to_string(),
                content: "Hello!".to_string(),
            },
        ])
        .unwrap();

        let response = server
            .post("/ui/chat")
            .form(&[("message", "What is a DOB?"), ("transcript", transcript.as_str())])
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Date of birth."));
    }

    #[tokio::test]
    async fn test_chat_step_without_model_shows_notice() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_test_server(create_test_config(dir.path())).await;

        server.get("/ui/chat").await.assert_status_ok();

        let response = server
            .post("/ui/chat")
            .form(&[("message", "Hello"), ("transcript", "not json")])
            .await;
        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("The assistant is unavailable right now."));
        assert!(html.contains("Hello"));
    }

    #[test]
    fn test_parse_transcript_tolerates_garbage() {
        assert!(parse_transcript("").is_empty());
        assert!(parse_transcript("{").is_empty());
        assert_eq!(
            parse_transcript(r#"[{"role":"user","content":"x"}]"#),
            vec![ChatTurn {
                role: "user".to_string(),
                content: "x".to_string()
            }]
        );
    }
}
