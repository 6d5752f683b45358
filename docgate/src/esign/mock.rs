//! Mock e-sign provider
//!
//! Hands back a fixed placeholder signing URL without contacting anything. Frontends can open
//! it in a new tab to exercise the signing step end to end.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{EsignProvider, SigningSession};

pub const PROVIDER_NAME: &str = "mock";

/// Placeholder signing page.
pub const MOCK_SIGNING_URL: &str = "https://example.com/mock-esign?token=demo";

pub struct MockProvider;

#[async_trait]
impl EsignProvider for MockProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn start_session(&self, document_url: &str, fields: &Map<String, Value>) -> SigningSession {
        tracing::info!(document_url = %document_url, fields = fields.len(), "Mock e-sign session started");

        SigningSession {
            signing_url: MOCK_SIGNING_URL.to_string(),
            provider: PROVIDER_NAME.to_string(),
            error: None,
        }
    }
}
