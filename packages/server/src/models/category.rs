use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::category;

/// Response DTO for a single category.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    #[schema(example = "Shoes")]
    pub name: String,
    #[schema(example = "Footwear")]
    pub description: String,
    /// Blob handle of the category image; fetch via
    /// `GET /api/v1/images/{handle}`.
    #[schema(example = "3f2a9c0b4d1e4f6a8b9c0d1e2f3a4b5c.jpg")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for listing categories.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryListResponse {
    pub data: Vec<CategoryResponse>,
    pub total: u64,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image: model.image,
            created_at: model.created_at,
        }
    }
}
