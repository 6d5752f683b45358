use axum::{Json, extract::State};
use tracing::instrument;

use crate::{
    AppState,
    activity_log::{ActivityEntry, ActivityKind},
    api::models::ocr::{OcrRequest, OcrResponse},
    auth::RequireApiKey,
    errors::Result,
    validation::{LenientJson, require_field},
};

#[utoipa::path(
    post,
    path = "/ocr",
    tag = "ocr",
    summary = "Read text from a document",
    description = "Runs OCR on a publicly reachable document URL. OCR failures are not errors: the \
    response carries empty text instead.",
    request_body = OcrRequest,
    responses(
        (status = 200, description = "Recognized text (possibly empty)", body = OcrResponse),
        (status = 400, description = "file_url missing", body = crate::errors::ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = crate::errors::ErrorBody),
    ),
    security(("ApiKeyAuth" = []))
)]
#[instrument(skip_all)]
pub async fn ocr(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    LenientJson(request): LenientJson<OcrRequest>,
) -> Result<Json<OcrResponse>> {
    let file_url = require_field("file_url", request.file_url.as_deref())?;

    let outcome = state.ocr.recognize(file_url).await;
    state
        .activity_log
        .record(ActivityEntry::new(ActivityKind::Ocr, file_url, Some(outcome.label().to_string())))
        .await;

    Ok(Json(OcrResponse {
        text: outcome.into_value_or_default(),
    }))
}
