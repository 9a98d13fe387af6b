//! Serves the preview image of a session's current file.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::debug;

use textlift_core::is_inline_safe;

use crate::error::{ApiError, ApiResult};
use crate::server::GatewayState;

/// GET /api/sessions/:id/preview
pub async fn serve_preview(
    Path(id): Path<String>,
    State(state): State<GatewayState>,
) -> ApiResult<Response> {
    let session = state.session(&id).await?;
    let preview_id = session
        .lock()
        .await
        .current_file()
        .map(|f| f.preview_id())
        .ok_or(ApiError::NoPreview)?;

    let image = state
        .previews()
        .get(preview_id)
        .ok_or(ApiError::NoPreview)?;
    debug!(session_id = %id, %preview_id, "Serving preview");

    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&image.mime_type)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    let disposition = if is_inline_safe(&image.mime_type) {
        "inline"
    } else {
        "attachment"
    };
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(disposition),
    );

    Ok((headers, image.bytes).into_response())
}
