use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;
use super::format::ImageFormat;

/// A unique key addressing exactly one stored blob.
///
/// String form: 32 lowercase hex characters (a v4 UUID without hyphens)
/// followed by a dot and a canonical image extension, e.g.
/// `3f2a9c...e1.jpg`. Handles are generated fresh for every write and are
/// never reused, so the content behind a handle never changes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobHandle {
    repr: String,
    format: ImageFormat,
}

const TOKEN_LEN: usize = 32;

impl BlobHandle {
    /// Generate a fresh random handle for the given format.
    pub fn generate(format: ImageFormat) -> Self {
        let repr = format!("{}.{}", Uuid::new_v4().simple(), format.extension());
        Self { repr, format }
    }

    /// Parse and validate a handle string.
    ///
    /// Strict by design: handles arrive from URLs and persisted records,
    /// and anything that passes here is later joined onto a filesystem
    /// path. Only lowercase hex tokens with a known canonical extension
    /// are accepted.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let (token, ext) = s
            .split_once('.')
            .ok_or_else(|| StorageError::InvalidHandle(format!("missing extension: {s:?}")))?;

        if token.len() != TOKEN_LEN {
            return Err(StorageError::InvalidHandle(format!(
                "expected {TOKEN_LEN} hex characters, got {}",
                token.len()
            )));
        }

        if !token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(StorageError::InvalidHandle(
                "token must be lowercase hex".into(),
            ));
        }

        let format = ImageFormat::from_extension(ext)
            .ok_or_else(|| StorageError::InvalidHandle(format!("unknown extension: {ext:?}")))?;

        Ok(Self {
            repr: s.to_string(),
            format,
        })
    }

    /// The full handle string (token plus extension).
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    /// Format recovered from the handle extension.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// First two hex characters (shard directory for filesystem layout).
    pub fn shard_prefix(&self) -> &str {
        &self.repr[..2]
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr)
    }
}

impl Serialize for BlobHandle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.repr)
    }
}

impl<'de> Deserialize<'de> for BlobHandle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
