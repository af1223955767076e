use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::catalog::{CatalogService, ImagePayload, NewCategory, UpdateCategory};
use crate::error::{AppError, ErrorBody};
use crate::models::category::{CategoryListResponse, CategoryResponse};
use crate::models::shared::require_text;
use crate::state::AppState;
use crate::utils::multipart::{CatalogForm, collect_catalog_form};

fn category_input(form: CatalogForm) -> Result<(String, String, Option<ImagePayload>), AppError> {
    let name = require_text(form.name, "name", 250)?;
    let description = require_text(form.description, "description", 4000)?;

    if form.images.len() > 1 {
        return Err(AppError::Validation(
            "A category takes at most one image".into(),
        ));
    }
    let image = form.images.into_iter().next().map(|data| ImagePayload { data });

    Ok((name, description, image))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Creates a category from multipart form data. Fields: `name`, \
        `description`, optional `image` (binary). The image is re-encoded to the \
        configured storage format and stored before the record is written.",
    request_body(content_type = "multipart/form-data", description = "Category fields with optional image"),
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage or database failure (STORAGE_WRITE_ERROR, PERSISTENCE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_category(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = collect_catalog_form(multipart, state.config.storage.max_blob_size).await?;
    let (name, description, image) = category_input(form)?;

    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let created = service
        .create_category(NewCategory {
            name,
            description,
            image,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List all categories",
    responses(
        (status = 200, description = "Category list", body = CategoryListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let categories = service.list_categories().await?;

    let total = categories.len() as u64;
    Ok(Json(CategoryListResponse {
        data: categories.into_iter().map(CategoryResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category by id",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let category = service.get_category(id).await?;
    Ok(Json(CategoryResponse::from(category)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    description = "Full replacement: the stored image is always replaced by what the \
        request supplies. Omitting the `image` field clears the category image.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body(content_type = "multipart/form-data", description = "Category fields with optional image"),
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage or database failure (STORAGE_WRITE_ERROR, PERSISTENCE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<CategoryResponse>, AppError> {
    let form = collect_catalog_form(multipart, state.config.storage.max_blob_size).await?;
    let (name, description, image) = category_input(form)?;

    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    let updated = service
        .update_category(
            id,
            UpdateCategory {
                name,
                description,
                image,
            },
        )
        .await?;

    Ok(Json(CategoryResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Removes the category image from storage (tolerating an already \
        missing blob) and deletes the record.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let service = CatalogService::new(
        &state.db,
        &*state.blob_store,
        state.config.storage.image_format,
    );
    service.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
