//! Credential gate for the JSON API.
//!
//! Every protected endpoint takes a [`RequireApiKey`] extractor as its first argument. Axum runs
//! request-parts extractors before the body extractor, so a rejected request never has its body
//! read and never reaches an upstream call.

mod api_key;

pub use api_key::{API_KEY_HEADER, RequireApiKey, is_authorized};
