use std::fmt;

/// Errors that can occur during blob storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested blob was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The provided blob handle is malformed.
    InvalidHandle(String),
    /// The payload could not be decoded or re-encoded as an image.
    Image(image::ImageError),
    /// The payload exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(handle) => write!(f, "blob not found: {handle}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidHandle(msg) => write!(f, "invalid blob handle: {msg}"),
            Self::Image(err) => write!(f, "image codec error: {err}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "payload exceeds size limit ({actual} > {limit} bytes)")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for StorageError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}
