//! Outbound calls to third-party services.
//!
//! Each delegate performs exactly one upstream request and reports what happened as a
//! [`DelegateOutcome`], so a caller can tell "nothing to report" apart from "the call failed".
//! The HTTP handlers collapse both to a neutral value: an upstream problem never fails the
//! request that triggered it.

pub mod completions;
pub mod ocr;
pub mod schema;

pub use completions::CompletionClient;
pub use ocr::OcrClient;
pub use schema::{FieldMap, SchemaDescriptor};

use tracing::warn;

/// Result of a single delegate call.
#[derive(Debug, Clone, PartialEq)]
pub enum DelegateOutcome<T> {
    /// The upstream answered with usable content
    Success(T),
    /// No credential configured, or the upstream answered without content
    Empty,
    /// Transport error, non-2xx status or malformed response
    Failed(String),
}

impl<T> DelegateOutcome<T> {
    pub fn label(&self) -> &'static str {
        match self {
            DelegateOutcome::Success(_) => "success",
            DelegateOutcome::Empty => "empty",
            DelegateOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DelegateOutcome::Failed(_))
    }

    /// Collapse to a value, using `fallback` for `Empty` and `Failed` (the latter logged).
    pub fn into_value_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            DelegateOutcome::Success(value) => value,
            DelegateOutcome::Empty => fallback(),
            DelegateOutcome::Failed(reason) => {
                warn!(reason = %reason, "Upstream call failed, returning empty result");
                fallback()
            }
        }
    }
}

impl<T: Default> DelegateOutcome<T> {
    pub fn into_value_or_default(self) -> T {
        self.into_value_or_else(T::default)
    }
}

/// Count a finished delegate call in `docgate_delegate_calls_total`.
pub(crate) fn record_outcome<T>(delegate: &'static str, outcome: &DelegateOutcome<T>) {
    metrics::counter!("docgate_delegate_calls_total", "delegate" => delegate, "outcome" => outcome.label()).increment(1);
}

/// Build the HTTP client shared by the delegates.
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    // reqwest is built without a bundled crypto provider; install one unless main already did
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    Ok(reqwest::Client::builder()
        .user_agent(concat!("docgate/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
