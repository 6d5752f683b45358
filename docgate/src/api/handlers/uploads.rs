use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header},
};
use tracing::instrument;

use crate::{
    AppState,
    activity_log::{ActivityEntry, ActivityKind},
    api::models::uploads::UploadResponse,
    auth::RequireApiKey,
    errors::{Error, Result},
};

/// Multipart part that carries the document.
const FILE_PART: &str = "file";

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e.body_text()),
        }
    }
}

/// Public URL for a stored file: the configured public base URL, or the request's `Host`.
fn public_file_url(state: &AppState, headers: &HeaderMap, name: &str) -> String {
    let base = match &state.config.public_url {
        Some(url) => url.as_str().trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{host}")
        }
    };
    format!("{base}/files/{name}")
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    summary = "Upload a document",
    description = "Stores a PDF or image under a generated name and returns the public URL it is \
    served from, ready to pass to `/ocr`.",
    request_body(content_type = "multipart/form-data", description = "A single `file` part"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file part, empty filename or unsupported type", body = crate::errors::ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = crate::errors::ErrorBody),
        (status = 413, description = "File too large", body = crate::errors::ErrorBody),
    ),
    security(("ApiKeyAuth" = []))
)]
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_PART) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        let stored = state.uploads.save(&filename, &data).await?;
        state
            .activity_log
            .record(ActivityEntry::new(
                ActivityKind::Upload,
                stored.name.clone(),
                Some(stored.original_name.clone()),
            ))
            .await;

        return Ok(Json(UploadResponse {
            file_url: public_file_url(&state, &headers, &stored.name),
        }));
    }

    Err(Error::BadRequest {
        message: "No file part".to_string(),
    })
}
