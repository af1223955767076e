//! Catalog lifecycle management.
//!
//! Entity records and image blobs live in independently failing stores with
//! no distributed transaction between them, so every mutating operation
//! here follows one ordering discipline: blobs referenced by the *new*
//! record state are written before any record mutation, and blobs
//! referenced only by the *old* state are removed after the new state is
//! durable. A failure at any point leaves the records pointing exclusively
//! at blobs that exist; at worst an unreferenced blob leaks and is logged
//! for the reconciliation sweep.

mod service;


pub use service::{CatalogService, ProductWithImages};

use std::fmt;

use common::storage::StorageError;
use sea_orm::DbErr;

/// Failure modes of catalog lifecycle operations.
#[derive(Debug)]
pub enum CatalogError {
    /// The referenced entity or child image does not exist. Nothing was
    /// mutated.
    NotFound(&'static str),
    /// A blob write failed. The operation was aborted and any blobs already
    /// written by it were compensated (best effort).
    StorageWrite(StorageError),
    /// A repository read/write failed. Blobs written by the same operation
    /// were compensated (best effort).
    Persistence(DbErr),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(kind) => write!(f, "{kind} not found"),
            Self::StorageWrite(err) => write!(f, "blob store write failed: {err}"),
            Self::Persistence(err) => write!(f, "repository operation failed: {err}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StorageWrite(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<DbErr> for CatalogError {
    fn from(err: DbErr) -> Self {
        Self::Persistence(err)
    }
}

/// A raw uploaded image payload, not yet format-converted.
pub struct ImagePayload {
    pub data: Vec<u8>,
}

pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub image: Option<ImagePayload>,
}

/// Full-replacement update: the stored image is always replaced by
/// `image`, including replacement with nothing.
pub struct UpdateCategory {
    pub name: String,
    pub description: String,
    pub image: Option<ImagePayload>,
}

pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category_id: i32,
    pub images: Vec<ImagePayload>,
}

/// Full-replacement update: the entire stored image set is replaced by
/// `images`.
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
    pub category_id: i32,
    pub images: Vec<ImagePayload>,
}
