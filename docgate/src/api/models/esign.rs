use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EsignStartRequest {
    /// Document to be signed
    pub document_url: Option<String>,
    /// Values to pre-populate in the signing session
    #[schema(value_type = Option<Object>)]
    pub fields: Option<Map<String, Value>>,
}

/// Query parameters sent by the provider when the signer finishes
#[derive(Debug, Deserialize, IntoParams)]
pub struct EsignCallbackQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EsignCallbackResponse {
    pub status: String,
}
