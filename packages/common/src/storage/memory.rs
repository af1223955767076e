use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::StorageError;
use super::format::{ImageFormat, encode_to_format};
use super::handle::BlobHandle;
use super::traits::{BlobStore, BoxReader};

/// In-memory blob store.
///
/// Same contract as the filesystem store; used by tests and embeddable
/// wherever durable storage is not required.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(
        &self,
        payload: &[u8],
        format: ImageFormat,
    ) -> Result<BlobHandle, StorageError> {
        let encoded = encode_to_format(payload, format)?;

        let mut blobs = self.lock();
        let mut handle = encoded.handle;
        while blobs.contains_key(handle.as_str()) {
            handle = BlobHandle::generate(format);
        }
        blobs.insert(handle.to_string(), encoded.data);
        Ok(handle)
    }

    async fn remove(&self, handle: &BlobHandle) -> Result<bool, StorageError> {
        Ok(self.lock().remove(handle.as_str()).is_some())
    }

    async fn exists(&self, handle: &BlobHandle) -> Result<bool, StorageError> {
        Ok(self.lock().contains_key(handle.as_str()))
    }

    async fn get_stream(&self, handle: &BlobHandle) -> Result<BoxReader, StorageError> {
        let data = self
            .lock()
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(handle.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }
}
