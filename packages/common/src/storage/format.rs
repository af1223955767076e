use std::fmt;
use std::io::Cursor;

use serde::{Deserialize, Serialize};

use super::error::StorageError;
use super::handle::BlobHandle;

/// Stored image formats supported by the catalog.
///
/// Uploads arrive in whatever format the client produced; the format policy
/// re-encodes them to one of these at write time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Canonical file extension used in blob handles.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// MIME type for serving blobs of this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Parse a handle extension back into a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn codec(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
        };
        write!(f, "{name}")
    }
}

/// An upload after the format policy has been applied: the bytes to store
/// and the freshly generated handle to store them under.
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub handle: BlobHandle,
}

/// Apply the format policy to an uploaded payload.
///
/// Payloads already in the target format pass through unchanged; anything
/// else is decoded and re-encoded. Every call pairs the output with a new
/// unique handle.
pub fn encode_to_format(payload: &[u8], format: ImageFormat) -> Result<EncodedImage, StorageError> {
    let handle = BlobHandle::generate(format);

    if image::guess_format(payload).ok() == Some(format.codec()) {
        return Ok(EncodedImage {
            data: payload.to_vec(),
            handle,
        });
    }

    let decoded = image::load_from_memory(payload)?;
    let mut buf = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => {
            image::DynamicImage::ImageRgb8(decoded.to_rgb8()).write_to(&mut buf, format.codec())?
        }
        ImageFormat::Webp => {
            image::DynamicImage::ImageRgba8(decoded.to_rgba8()).write_to(&mut buf, format.codec())?
        }
        ImageFormat::Png => decoded.write_to(&mut buf, format.codec())?,
    }

    Ok(EncodedImage {
        data: buf.into_inner(),
        handle,
    })
}
