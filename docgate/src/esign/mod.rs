//! E-signature provider abstraction
//!
//! This module defines the `EsignProvider` trait which abstracts starting a signing session across
//! providers. Only the `mock` provider exists; any other configured name resolves to
//! [`UnsupportedProvider`], which answers every request with an explicit error marker instead of
//! failing the HTTP request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

pub mod mock;

/// Error marker returned by providers that have no integration.
pub const UNSUPPORTED_PROVIDER_ERROR: &str = "Unsupported e-sign provider";

/// Create a provider from its configured name (case-insensitive).
///
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(name: &str) -> Box<dyn EsignProvider> {
    let name = name.trim().to_lowercase();
    match name.as_str() {
        mock::PROVIDER_NAME => Box::new(mock::MockProvider),
        _ => {
            tracing::warn!(provider = %name, "E-sign provider has no integration, signing requests will report an error");
            Box::new(UnsupportedProvider { name })
        }
    }
}

/// Outcome of starting a signing session, returned to the client as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SigningSession {
    /// URL the signer should open; empty when no session could be created
    pub signing_url: String,
    /// Provider that handled the request
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Abstract e-signature provider interface
#[async_trait]
pub trait EsignProvider: Send + Sync {
    /// Name reported back to clients
    fn name(&self) -> &str;

    /// Start a signing session for the document at `document_url`, pre-populated with `fields`.
    async fn start_session(&self, document_url: &str, fields: &Map<String, Value>) -> SigningSession;
}

/// Placeholder for configured providers without an integration.
pub struct UnsupportedProvider {
    name: String,
}

#[async_trait]
impl EsignProvider for UnsupportedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start_session(&self, _document_url: &str, _fields: &Map<String, Value>) -> SigningSession {
        SigningSession {
            signing_url: String::new(),
            provider: self.name.clone(),
            error: Some(UNSUPPORTED_PROVIDER_ERROR.to_string()),
        }
    }
}
