use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::ProductWithImages;
use crate::entity::product_image;

/// Response DTO for one image owned by a product.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductImageResponse {
    pub id: i32,
    /// Blob handle; fetch via `GET /api/v1/images/{handle}`.
    #[schema(example = "3f2a9c0b4d1e4f6a8b9c0d1e2f3a4b5c.jpg")]
    pub image: String,
}

/// Response DTO for a single product with its image set.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    #[schema(example = "Sneaker")]
    pub name: String,
    pub description: String,
    pub category_id: i32,
    pub images: Vec<ProductImageResponse>,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for listing products.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub data: Vec<ProductResponse>,
    pub total: u64,
}

impl From<product_image::Model> for ProductImageResponse {
    fn from(model: product_image::Model) -> Self {
        Self {
            id: model.id,
            image: model.image,
        }
    }
}

impl From<ProductWithImages> for ProductResponse {
    fn from(value: ProductWithImages) -> Self {
        Self {
            id: value.product.id,
            name: value.product.name,
            description: value.product.description,
            category_id: value.product.category_id,
            images: value
                .images
                .into_iter()
                .map(ProductImageResponse::from)
                .collect(),
            created_at: value.product.created_at,
        }
    }
}
