pub mod category;
pub mod image;
pub mod product;

use axum::extract::DefaultBodyLimit;

/// Body limit for multipart upload routes.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024) // 32 MB
}
