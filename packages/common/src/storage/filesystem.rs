use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;

use super::error::StorageError;
use super::format::{ImageFormat, encode_to_format};
use super::handle::BlobHandle;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Blobs are stored in a sharded directory layout:
/// `{root}/{first 2 hex chars of the handle}/{handle}`
pub struct FilesystemBlobStore {
    root: PathBuf,
    max_size: u64,
}

/// Consecutive v4 UUID collisions do not happen in practice; the bound
/// exists so a misbehaving filesystem cannot loop us forever.
const HANDLE_ATTEMPTS: u32 = 4;

impl FilesystemBlobStore {
    /// Create a new filesystem blob store rooted at `root`.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    /// Compute the filesystem path for a handle.
    fn blob_path(&self, handle: &BlobHandle) -> PathBuf {
        self.root.join(handle.shard_prefix()).join(handle.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn check_size(&self, len: usize) -> Result<(), StorageError> {
        if len as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: len as u64,
                limit: self.max_size,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn save(
        &self,
        payload: &[u8],
        format: ImageFormat,
    ) -> Result<BlobHandle, StorageError> {
        self.check_size(payload.len())?;

        let encoded = encode_to_format(payload, format)?;
        // Re-encoding can grow the payload.
        self.check_size(encoded.data.len())?;

        let mut handle = encoded.handle;
        for _ in 0..HANDLE_ATTEMPTS {
            let blob_path = self.blob_path(&handle);
            if fs::try_exists(&blob_path).await? {
                handle = BlobHandle::generate(format);
                continue;
            }

            let temp_path = self.temp_path();
            if let Err(e) = fs::write(&temp_path, &encoded.data).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }

            if let Some(parent) = blob_path.parent() {
                fs::create_dir_all(parent).await?;
            }

            if let Err(e) = fs::rename(&temp_path, &blob_path).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }

            return Ok(handle);
        }

        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not allocate an unused blob handle",
        )))
    }

    async fn remove(&self, handle: &BlobHandle) -> Result<bool, StorageError> {
        match fs::remove_file(self.blob_path(handle)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, handle: &BlobHandle) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(handle)).await?)
    }

    async fn get_stream(&self, handle: &BlobHandle) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.blob_path(handle)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
