use axum::{Json, extract::State};
use tracing::instrument;

use crate::{
    AppState,
    api::models::prefill::{PrefillRequest, PrefillResponse},
    auth::RequireApiKey,
    delegates::SchemaDescriptor,
    errors::Result,
    validation::LenientJson,
};

#[utoipa::path(
    post,
    path = "/prefill",
    tag = "prefill",
    summary = "Extract form fields from text",
    description = "Asks the language model to extract the schema's fields from the text. The \
    response always contains exactly the schema's keys; anything the model could not supply is an \
    empty string.",
    request_body = PrefillRequest,
    responses(
        (status = 200, description = "Extracted fields", body = PrefillResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::errors::ErrorBody),
    ),
    security(("ApiKeyAuth" = []))
)]
#[instrument(skip_all)]
pub async fn prefill(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    LenientJson(request): LenientJson<PrefillRequest>,
) -> Result<Json<PrefillResponse>> {
    let text = request.text.unwrap_or_default();
    let schema = SchemaDescriptor::from_request(request.schema);

    let fields = state
        .completions
        .extract_fields(&text, &schema)
        .await
        .into_value_or_else(|| schema.empty_fields());

    Ok(Json(PrefillResponse { fields }))
}
