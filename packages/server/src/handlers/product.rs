use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::catalog::{CatalogService, ImagePayload, NewProduct, UpdateProduct};
use crate::error::{AppError, ErrorBody};
use crate::models::product::{ProductListResponse, ProductResponse};
use crate::models::shared::require_text;
use crate::state::AppState;
use crate::utils::multipart::{CatalogForm, collect_catalog_form};

fn product_input(form: CatalogForm) -> Result<(String, String, i32, Vec<ImagePayload>), AppError> {
    let name = require_text(form.name, "name", 250)?;
    let description = require_text(form.description, "description", 4000)?;
    let category_id = form
        .category_id
        .ok_or_else(|| AppError::Validation("category_id is required".into()))?;

    let images = form
        .images
        .into_iter()
        .map(|data| ImagePayload { data })
        .collect();

    Ok((name, description, category_id, images))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "Creates a product from multipart form data. Fields: `name`, \
        `description`, `category_id`, and zero or more `images` (binary). All \
        images are stored before any record is written; a failed store write \
        aborts the operation with nothing persisted.",
    request_body(content_type = "multipart/form-data", description = "Product fields with images"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage or database failure (STORAGE_WRITE_ERROR, PERSISTENCE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = collect_catalog_form(multipart, state.config.storage.max_blob_size).await?;
    let (name, description, category_id, images) = product_input(form)?;

    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let created = service
        .create_product(NewProduct {
            name,
            description,
            category_id,
            images,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List all products with their images",
    responses(
        (status = 200, description = "Product list", body = ProductListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, AppError> {
    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let products = service.list_products().await?;

    let total = products.len() as u64;
    Ok(Json(ProductListResponse {
        data: products.into_iter().map(ProductResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product by id",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, AppError> {
    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let product = service.get_product(id).await?;
    Ok(Json(ProductResponse::from(product)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Update a product",
    description = "Full replacement: the entire stored image set is discarded and \
        replaced by the images this request supplies. New images become durable \
        before old ones are removed, so a failure mid-update leaves the previous \
        state intact.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Product fields with images"),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Product or category not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage or database failure (STORAGE_WRITE_ERROR, PERSISTENCE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let form = collect_catalog_form(multipart, state.config.storage.max_blob_size).await?;
    let (name, description, category_id, images) = product_input(form)?;

    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let updated = service
        .update_product(
            id,
            UpdateProduct {
                name,
                description,
                category_id,
                images,
            },
        )
        .await?;

    Ok(Json(ProductResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Removes every image blob (tolerating already missing ones), then \
        deletes the product and its image rows.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/images/{image_id}",
    tag = "Products",
    operation_id = "deleteProductImage",
    summary = "Remove a single image from a product",
    description = "Deletes one owned image (blob and record); the product's other \
        images are untouched.",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("image_id" = i32, Path, description = "Product image ID"),
    ),
    responses(
        (status = 204, description = "Image removed"),
        (status = 404, description = "Product or image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_product_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    service.remove_product_image(id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
