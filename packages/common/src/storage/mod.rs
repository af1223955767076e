mod error;
mod format;
mod handle;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StorageError;
pub use format::{EncodedImage, ImageFormat, encode_to_format};
pub use handle::BlobHandle;
pub use traits::{BlobStore, BoxReader};
