use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::delegates::FieldMap;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PrefillRequest {
    /// Unstructured text to extract fields from
    pub text: Option<String>,
    /// Field names to extract, as an object whose values are ignored. Defaults to
    /// `name`, `dob`, `address` and `mobile`.
    #[schema(value_type = Option<Object>)]
    pub schema: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrefillResponse {
    /// Exactly the schema's keys; missing values are empty strings
    #[schema(value_type = Object)]
    pub fields: FieldMap,
}
