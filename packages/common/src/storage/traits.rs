use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::format::ImageFormat;
use super::handle::BlobHandle;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Handle-addressed blob storage for catalog images.
///
/// The store owns physical persistence only; it has no knowledge of the
/// entities referencing its blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Apply the format policy to `payload` and store the result under a
    /// freshly generated handle. Never overwrites an existing handle.
    ///
    /// On error the store is unchanged; callers must not assume partial
    /// success.
    async fn save(&self, payload: &[u8], format: ImageFormat)
    -> Result<BlobHandle, StorageError>;

    /// Delete the blob at `handle`.
    ///
    /// Idempotent: removing an absent handle returns `Ok(false)` rather
    /// than an error, since callers retry removals after partial failures.
    async fn remove(&self, handle: &BlobHandle) -> Result<bool, StorageError>;

    /// Check whether a blob exists. Integrity checks and tests only, not
    /// part of any mutation path.
    async fn exists(&self, handle: &BlobHandle) -> Result<bool, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, handle: &BlobHandle) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(handle).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, handle: &BlobHandle) -> Result<BoxReader, StorageError>;
}
