use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct OcrRequest {
    /// Publicly reachable URL of the document to read
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OcrResponse {
    /// Recognized text; empty when OCR is unavailable or failed
    pub text: String,
}
