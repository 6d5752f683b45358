//! Schema descriptors for structured extraction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Extracted field values keyed by schema field name, in schema order.
pub type FieldMap = Map<String, Value>;

/// Keys used when the caller does not supply a schema.
pub const DEFAULT_SCHEMA_KEYS: &[&str] = &["name", "dob", "address", "mobile"];

/// The set of field names an extraction must produce.
///
/// Only the keys of the caller's object matter, kept in the order the caller sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SchemaDescriptor(Vec<String>);

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self(DEFAULT_SCHEMA_KEYS.iter().map(|key| key.to_string()).collect())
    }
}

impl From<Map<String, Value>> for SchemaDescriptor {
    fn from(map: Map<String, Value>) -> Self {
        Self(map.into_iter().map(|(key, _)| key).collect())
    }
}

impl SchemaDescriptor {
    /// Schema supplied by a client, falling back to the default shape when absent or empty.
    pub fn from_request(schema: Option<Map<String, Value>>) -> Self {
        match schema {
            Some(map) if !map.is_empty() => map.into(),
            _ => Self::default(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Keys rendered as a bracketed, single-quoted list: `['name', 'dob']`.
    pub fn key_list_literal(&self) -> String {
        let quoted: Vec<String> = self.keys().map(|key| format!("'{key}'")).collect();
        format!("[{}]", quoted.join(", "))
    }

    /// Every schema key mapped to an empty string.
    pub fn empty_fields(&self) -> FieldMap {
        self.keys().map(|key| (key.to_string(), Value::String(String::new()))).collect()
    }

    /// Project an upstream answer onto exactly this schema's keys.
    ///
    /// Keys the answer lacks (or sets to `null`) become empty strings; keys outside the schema
    /// are dropped. A non-object answer projects to all-empty.
    pub fn project(&self, answer: &Value) -> FieldMap {
        self.keys()
            .map(|key| {
                let value = match answer.get(key) {
                    None | Some(Value::Null) => Value::String(String::new()),
                    Some(value) => value.clone(),
                };
                (key.to_string(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_schema_shape() {
        let schema = SchemaDescriptor::default();
        let keys: Vec<&str> = schema.keys().collect();
        assert_eq!(keys, vec!["name", "dob", "address", "mobile"]);
    }

    #[test]
    fn test_from_request_falls_back_on_empty() {
        assert_eq!(SchemaDescriptor::from_request(None), SchemaDescriptor::default());
        assert_eq!(SchemaDescriptor::from_request(Some(Map::new())), SchemaDescriptor::default());

        let custom = json!({"policy_number": "", "insurer": ""}).as_object().cloned();
        let schema = SchemaDescriptor::from_request(custom);
        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["policy_number", "insurer"]);
    }

    #[test]
    fn test_key_list_literal() {
        let schema = SchemaDescriptor::from_request(json!({"b": "", "a": ""}).as_object().cloned());
        assert_eq!(schema.key_list_literal(), "['b', 'a']");
        assert_eq!(
            SchemaDescriptor::default().key_list_literal(),
            "['name', 'dob', 'address', 'mobile']"
        );
    }

    #[test]
    fn test_projection_preserves_key_set() {
        let schema = SchemaDescriptor::default();
        let answer = json!({
            "name": "Asha Rao",
            "dob": null,
            "mobile": 9876543210u64,
            "extra": "dropped"
        });

        let fields = schema.project(&answer);
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["name", "dob", "address", "mobile"]);
        assert_eq!(fields["name"], json!("Asha Rao"));
        assert_eq!(fields["dob"], json!(""));
        assert_eq!(fields["address"], json!(""));
        assert_eq!(fields["mobile"], json!(9876543210u64));
        assert!(!fields.contains_key("extra"));
    }

    #[test]
    fn test_projection_of_non_object() {
        let schema = SchemaDescriptor::default();
        for answer in [json!([1, 2]), json!("text"), json!(null)] {
            assert_eq!(schema.project(&answer), schema.empty_fields());
        }
    }
}
