use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{AppState, errors::Error};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Whether `presented` unlocks a gate configured with `configured`.
///
/// An absent or empty configured secret keeps the gate closed for every request.
pub fn is_authorized(configured: Option<&str>, presented: Option<&str>) -> bool {
    match (configured, presented) {
        (Some(expected), Some(given)) if !expected.is_empty() => expected == given,
        _ => false,
    }
}

/// Extractor proving the request carried the configured API key.
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts.headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok());

        if is_authorized(state.config.api_key(), presented) {
            trace!("API key accepted");
            Ok(RequireApiKey)
        } else {
            Err(Error::Unauthenticated)
        }
    }
}
