//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for the JSON endpoints
//! - **[`models`]**: Request/response data structures
//!
//! Protected endpoints (`/ocr`, `/prefill`, `/chat`, `/upload`, `/esign/start`) require the
//! `x-api-key` header. `/health`, `/files/*` and `/esign/callback` are open.

pub mod handlers;
pub mod models;
