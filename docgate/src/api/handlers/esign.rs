use axum::{
    Json,
    extract::{Query, State},
};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::esign::{EsignCallbackQuery, EsignCallbackResponse, EsignStartRequest},
    auth::RequireApiKey,
    errors::Result,
    esign::SigningSession,
    validation::{LenientJson, require_field},
};

/// Status echoed when the provider omits one.
const UNKNOWN_STATUS: &str = "unknown";

#[utoipa::path(
    post,
    path = "/esign/start",
    tag = "esign",
    summary = "Start a signing session",
    description = "Asks the configured e-sign provider for a signing link. Providers without an \
    integration answer with an empty `signing_url` and an `error` marker rather than failing.",
    request_body = EsignStartRequest,
    responses(
        (status = 200, description = "Signing session (check `error`)", body = SigningSession),
        (status = 400, description = "document_url missing", body = crate::errors::ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = crate::errors::ErrorBody),
    ),
    security(("ApiKeyAuth" = []))
)]
#[instrument(skip_all)]
pub async fn start(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    LenientJson(request): LenientJson<EsignStartRequest>,
) -> Result<Json<SigningSession>> {
    let document_url = require_field("document_url", request.document_url.as_deref())?;
    let fields = request.fields.unwrap_or_default();

    Ok(Json(state.esign.start_session(document_url, &fields).await))
}

#[utoipa::path(
    get,
    path = "/esign/callback",
    tag = "esign",
    summary = "Signing completion callback",
    description = "Called by the provider when the signer finishes. Echoes the reported status.",
    params(EsignCallbackQuery),
    responses(
        (status = 200, description = "Echoed status", body = EsignCallbackResponse),
    )
)]
#[instrument(skip_all)]
pub async fn callback(Query(query): Query<EsignCallbackQuery>) -> Json<EsignCallbackResponse> {
    let status = query
        .status
        .filter(|status| !status.is_empty())
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
    info!(status = %status, "E-sign callback received");

    Json(EsignCallbackResponse { status })
}
