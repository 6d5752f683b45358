//! Request payload validation: lenient JSON bodies, required fields, and upload filenames.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{Error, Result};

/// Extensions accepted by the upload endpoint, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

const MAX_FILENAME_LEN: usize = 200;

/// JSON body extractor that never rejects on content.
///
/// A missing, empty or malformed body yields `T::default()`, leaving required-field checks to the
/// handler. In an object body, fields whose value does not fit `T` are dropped one by one while
/// the well-typed fields are kept. Only transport failures (body over the size limit, broken
/// stream) are errors.
#[derive(Debug, Clone, Default)]
pub struct LenientJson<T>(pub T);

impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                Error::PayloadTooLarge
            } else {
                Error::BadRequest {
                    message: rejection.body_text(),
                }
            }
        })?;

        if bytes.is_empty() {
            return Ok(LenientJson(T::default()));
        }

        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                debug!("Ignoring unparseable JSON body: {}", e);
                return Ok(LenientJson(T::default()));
            }
        };

        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Ok(LenientJson(parsed)),
            Err(e) => {
                debug!("JSON body does not match the expected shape, keeping well-typed fields: {}", e);
                Ok(LenientJson(keep_well_typed_fields(value)))
            }
        }
    }
}

/// Rebuild `T` from the fields of `value` that deserialize, skipping the rest.
fn keep_well_typed_fields<T: DeserializeOwned + Default>(value: Value) -> T {
    let Value::Object(fields) = value else {
        return T::default();
    };

    let mut kept = Map::new();
    for (name, field) in fields {
        kept.insert(name.clone(), field);
        if serde_json::from_value::<T>(Value::Object(kept.clone())).is_err() {
            debug!(field = %name, "Ignoring mistyped field");
            kept.remove(&name);
        }
    }

    serde_json::from_value(Value::Object(kept)).unwrap_or_default()
}

/// Return the value of a required field, or a "`<name>` required" validation error when it is
/// absent or blank.
pub fn require_field<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::missing_field(name)),
    }
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Directory components (either separator style, `.` and `..`) are folded into the name with
/// `_`, characters outside `[A-Za-z0-9._-]` become `_`, and leading dots or underscores are
/// dropped so the result can never be hidden or relative. May return an empty string.
pub fn sanitize_filename(filename: &str) -> String {
    let joined = filename
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect::<Vec<_>>()
        .join("_");

    joined
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect::<String>()
        .trim_start_matches(['.', '_'])
        .chars()
        .take(MAX_FILENAME_LEN)
        .collect()
}

/// Lower-cased extension of `filename` if it is in [`ALLOWED_EXTENSIONS`].
pub fn allowed_extension(filename: &str) -> Result<String> {
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        other => Err(Error::UnsupportedFileType { extension: other }),
    }
}
