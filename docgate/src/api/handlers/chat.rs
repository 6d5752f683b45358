use axum::{Json, extract::State};
use tracing::instrument;

use crate::{
    AppState,
    api::models::chat::{ChatRequest, ChatResponse},
    auth::RequireApiKey,
    errors::Result,
    validation::LenientJson,
};

#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    summary = "Chat with the language model",
    description = "Forwards the messages unchanged and returns the first reply. The reply is empty \
    when the model is not configured or the upstream call fails.",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Model reply (possibly empty)", body = ChatResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::errors::ErrorBody),
    ),
    security(("ApiKeyAuth" = []))
)]
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    LenientJson(request): LenientJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let messages = request.messages.unwrap_or_default();
    let reply = state.completions.complete(&messages).await.into_value_or_default();

    Ok(Json(ChatResponse { reply }))
}
