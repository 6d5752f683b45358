//! OpenAPI documentation for the JSON API, served by Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::{api, auth::API_KEY_HEADER, errors, esign};

/// Security scheme for the `x-api-key` header.
struct ApiKeySecurityAddon;

impl Modify for ApiKeySecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "ApiKeyAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    API_KEY_HEADER,
                    "Shared gateway key. Include it in every protected request:\n\n\
                    ```\nx-api-key: YOUR_API_KEY\n```\n\n\
                    The gateway rejects all protected requests when no key is configured.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&ApiKeySecurityAddon),
    paths(
        api::handlers::health::health,
        api::handlers::ocr::ocr,
        api::handlers::prefill::prefill,
        api::handlers::chat::chat,
        api::handlers::uploads::upload,
        api::handlers::esign::start,
        api::handlers::esign::callback,
    ),
    components(
        schemas(
            errors::ErrorBody,
            api::models::health::HealthResponse,
            api::models::ocr::OcrRequest,
            api::models::ocr::OcrResponse,
            api::models::prefill::PrefillRequest,
            api::models::prefill::PrefillResponse,
            api::models::chat::ChatRequest,
            api::models::chat::ChatResponse,
            api::models::uploads::UploadResponse,
            api::models::esign::EsignStartRequest,
            api::models::esign::EsignCallbackResponse,
            esign::SigningSession,
        )
    ),
    tags(
        (name = "health", description = "Liveness check."),
        (name = "uploads", description = "Store PDFs and images and serve them back from `/files/{name}`."),
        (name = "ocr", description = "Read text from a document URL."),
        (name = "prefill", description = "Extract form fields from unstructured text.

Pass a `schema` object whose keys are the fields you want. The response always has exactly those keys."),
        (name = "chat", description = "Single-call chat completions."),
        (name = "esign", description = "Start signing sessions and receive provider callbacks."),
    ),
    info(
        title = "docgate API",
        version = "1.0.0",
        description = "Document intake gateway: upload, OCR, field extraction, chat and e-signature.

## Authentication

Protected endpoints require the gateway key in the `x-api-key` header.

## Errors

Errors are returned as `{\"error\": \"message\"}` with an HTTP status code. Upstream failures
(OCR, language model) are not errors: the affected value comes back empty instead.",
    )
)]
pub struct ApiDoc;
