use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::BlobHandle;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{handle}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Download a stored image",
    description = "Streams the blob at `handle`. Handles are unique per write and \
        never reused, so responses are immutable and infinitely cacheable.",
    params(("handle" = String, Path, description = "Blob handle")),
    responses(
        (status = 200, description = "Image content"),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Response, AppError> {
    // A malformed handle can't name a stored blob; report it the same way
    // as a missing one.
    let handle = BlobHandle::parse(&handle)
        .map_err(|_| AppError::NotFound(format!("Image '{handle}' not found")))?;

    let reader = state.blob_store.get_stream(&handle).await?;

    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, handle.format().mime_type())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
