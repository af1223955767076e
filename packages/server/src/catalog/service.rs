use chrono::Utc;
use common::storage::{BlobHandle, BlobStore, ImageFormat};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionSession, TransactionTrait,
};
use tracing::warn;

use crate::entity::{category, product, product_image};

use super::{CatalogError, ImagePayload, NewCategory, NewProduct, UpdateCategory, UpdateProduct};

/// A product together with its owned image rows.
#[derive(Debug, Clone)]
pub struct ProductWithImages {
    pub product: product::Model,
    pub images: Vec<product_image::Model>,
}

/// Orchestrates the catalog repository and the blob store so that each
/// mutation is atomic from the caller's point of view.
///
/// Dependencies are passed in explicitly; tests substitute an in-memory
/// blob store and a SQLite connection.
pub struct CatalogService<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
    blobs: &'a dyn BlobStore,
    format: ImageFormat,
}

impl<'a, C: ConnectionTrait + TransactionTrait> CatalogService<'a, C> {
    pub fn new(conn: &'a C, blobs: &'a dyn BlobStore, format: ImageFormat) -> Self {
        Self {
            conn,
            blobs,
            format,
        }
    }

    // ---- categories ----

    pub async fn create_category(
        &self,
        input: NewCategory,
    ) -> Result<category::Model, CatalogError> {
        // Blob before record: a failed save aborts with nothing to undo.
        let handle = match &input.image {
            Some(payload) => Some(self.save_one(payload).await?),
            None => None,
        };

        let model = category::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            image: Set(handle.as_ref().map(ToString::to_string)),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match model.insert(self.conn).await {
            Ok(created) => Ok(created),
            Err(e) => {
                if let Some(h) = &handle {
                    self.compensate(std::slice::from_ref(h)).await;
                }
                Err(CatalogError::Persistence(e))
            }
        }
    }

    pub async fn get_category(&self, id: i32) -> Result<category::Model, CatalogError> {
        category::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(CatalogError::NotFound("category"))
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, CatalogError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(self.conn)
            .await?)
    }

    pub async fn update_category(
        &self,
        id: i32,
        input: UpdateCategory,
    ) -> Result<category::Model, CatalogError> {
        let existing = self.get_category(id).await?;

        let new_handle = match &input.image {
            Some(payload) => Some(self.save_one(payload).await?),
            None => None,
        };

        let mut active: category::ActiveModel = existing.clone().into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.image = Set(new_handle.as_ref().map(ToString::to_string));

        let updated = match active.update(self.conn).await {
            Ok(model) => model,
            Err(e) => {
                if let Some(h) = &new_handle {
                    self.compensate(std::slice::from_ref(h)).await;
                }
                return Err(CatalogError::Persistence(e));
            }
        };

        // The old blob is unreferenced only now that the new record state
        // is durable.
        if let Some(old) = existing.image.as_deref().and_then(parse_stored_handle) {
            self.remove_stale(std::slice::from_ref(&old)).await;
        }

        Ok(updated)
    }

    pub async fn delete_category(&self, id: i32) -> Result<(), CatalogError> {
        let existing = self.get_category(id).await?;

        // An unremovable blob must never block the delete; it leaks and is
        // logged instead.
        if let Some(old) = existing.image.as_deref().and_then(parse_stored_handle) {
            self.remove_stale(std::slice::from_ref(&old)).await;
        }

        category::Entity::delete_by_id(id).exec(self.conn).await?;
        Ok(())
    }

    // ---- products ----

    pub async fn create_product(
        &self,
        input: NewProduct,
    ) -> Result<ProductWithImages, CatalogError> {
        // A missing category must not cost any blob writes.
        self.require_category(input.category_id).await?;

        let handles = self.save_all(&input.images).await?;

        match self.insert_product_records(&input, &handles).await {
            Ok(created) => Ok(created),
            Err(e) => {
                self.compensate(&handles).await;
                Err(CatalogError::Persistence(e))
            }
        }
    }

    pub async fn get_product(&self, id: i32) -> Result<ProductWithImages, CatalogError> {
        let model = product::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(CatalogError::NotFound("product"))?;

        let images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(id))
            .order_by_asc(product_image::Column::Id)
            .all(self.conn)
            .await?;

        Ok(ProductWithImages {
            product: model,
            images,
        })
    }

    pub async fn list_products(&self) -> Result<Vec<ProductWithImages>, CatalogError> {
        let products = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(self.conn)
            .await?;

        let mut by_product: std::collections::HashMap<i32, Vec<product_image::Model>> =
            std::collections::HashMap::new();
        for img in product_image::Entity::find()
            .order_by_asc(product_image::Column::Id)
            .all(self.conn)
            .await?
        {
            by_product.entry(img.product_id).or_default().push(img);
        }

        Ok(products
            .into_iter()
            .map(|p| {
                let images = by_product.remove(&p.id).unwrap_or_default();
                ProductWithImages { product: p, images }
            })
            .collect())
    }

    pub async fn update_product(
        &self,
        id: i32,
        input: UpdateProduct,
    ) -> Result<ProductWithImages, CatalogError> {
        let existing = self.get_product(id).await?;
        self.require_category(input.category_id).await?;

        let new_handles = self.save_all(&input.images).await?;

        let updated = match self
            .replace_product_records(&existing.product, &input, &new_handles)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                // Old record and old blobs are both still intact.
                self.compensate(&new_handles).await;
                return Err(CatalogError::Persistence(e));
            }
        };

        let old_handles: Vec<BlobHandle> = existing
            .images
            .iter()
            .filter_map(|img| parse_stored_handle(&img.image))
            .collect();
        self.remove_stale(&old_handles).await;

        Ok(updated)
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), CatalogError> {
        let existing = self.get_product(id).await?;

        let handles: Vec<BlobHandle> = existing
            .images
            .iter()
            .filter_map(|img| parse_stored_handle(&img.image))
            .collect();
        self.remove_stale(&handles).await;

        let txn = self.conn.begin().await?;
        product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        product::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Remove a single image from a product. No other images are touched.
    pub async fn remove_product_image(
        &self,
        product_id: i32,
        image_id: i32,
    ) -> Result<(), CatalogError> {
        if product::Entity::find_by_id(product_id)
            .one(self.conn)
            .await?
            .is_none()
        {
            return Err(CatalogError::NotFound("product"));
        }

        // Scoped lookup: an image id under a different product is NotFound.
        let image = product_image::Entity::find()
            .filter(product_image::Column::Id.eq(image_id))
            .filter(product_image::Column::ProductId.eq(product_id))
            .one(self.conn)
            .await?
            .ok_or(CatalogError::NotFound("product image"))?;

        if let Some(handle) = parse_stored_handle(&image.image) {
            self.remove_stale(std::slice::from_ref(&handle)).await;
        }

        product_image::Entity::delete_by_id(image.id)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    // ---- internals ----

    async fn require_category(&self, id: i32) -> Result<(), CatalogError> {
        category::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .map(|_| ())
            .ok_or(CatalogError::NotFound("category"))
    }

    async fn save_one(&self, payload: &ImagePayload) -> Result<BlobHandle, CatalogError> {
        self.blobs
            .save(&payload.data, self.format)
            .await
            .map_err(CatalogError::StorageWrite)
    }

    /// Save every payload, compensating the already-saved prefix if one
    /// fails mid-sequence.
    async fn save_all(&self, payloads: &[ImagePayload]) -> Result<Vec<BlobHandle>, CatalogError> {
        let mut handles = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match self.blobs.save(&payload.data, self.format).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    self.compensate(&handles).await;
                    return Err(CatalogError::StorageWrite(e));
                }
            }
        }
        Ok(handles)
    }

    /// Best-effort removal of blobs written earlier in a failed operation.
    /// Attempted exactly once; a failure leaves a logged leak, never a
    /// dangling reference.
    async fn compensate(&self, handles: &[BlobHandle]) {
        for handle in handles {
            if let Err(e) = self.blobs.remove(handle).await {
                warn!(
                    handle = %handle,
                    error = %e,
                    "failed to compensate blob write; reconciliation candidate"
                );
            }
        }
    }

    /// Best-effort removal of blobs no longer referenced after a durable
    /// record write. Never fails the surrounding operation.
    async fn remove_stale(&self, handles: &[BlobHandle]) {
        for handle in handles {
            if let Err(e) = self.blobs.remove(handle).await {
                warn!(
                    handle = %handle,
                    error = %e,
                    "failed to remove stale blob; reconciliation candidate"
                );
            }
        }
    }

    async fn insert_product_records(
        &self,
        input: &NewProduct,
        handles: &[BlobHandle],
    ) -> Result<ProductWithImages, DbErr> {
        let now = Utc::now();
        let txn = self.conn.begin().await?;

        let created = product::ActiveModel {
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            category_id: Set(input.category_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut images = Vec::with_capacity(handles.len());
        for handle in handles {
            images.push(
                product_image::ActiveModel {
                    image: Set(handle.to_string()),
                    product_id: Set(created.id),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?,
            );
        }

        txn.commit().await?;
        Ok(ProductWithImages {
            product: created,
            images,
        })
    }

    async fn replace_product_records(
        &self,
        current: &product::Model,
        input: &UpdateProduct,
        handles: &[BlobHandle],
    ) -> Result<ProductWithImages, DbErr> {
        let now = Utc::now();
        let txn = self.conn.begin().await?;

        product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(current.id))
            .exec(&txn)
            .await?;

        let mut active: product::ActiveModel = current.clone().into();
        active.name = Set(input.name.clone());
        active.description = Set(input.description.clone());
        active.category_id = Set(input.category_id);
        let updated = active.update(&txn).await?;

        let mut images = Vec::with_capacity(handles.len());
        for handle in handles {
            images.push(
                product_image::ActiveModel {
                    image: Set(handle.to_string()),
                    product_id: Set(updated.id),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?,
            );
        }

        txn.commit().await?;
        Ok(ProductWithImages {
            product: updated,
            images,
        })
    }
}

/// Parse a handle read back from an entity record. Corrupt references are
/// logged and skipped rather than failing the surrounding operation.
fn parse_stored_handle(raw: &str) -> Option<BlobHandle> {
    match BlobHandle::parse(raw) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(
                handle = raw,
                error = %e,
                "stored image reference is not a valid blob handle"
            );
            None
        }
    }
}
