use axum::extract::Multipart;
use axum::extract::multipart::Field;

use crate::error::AppError;

/// Text fields and image payloads collected from a catalog multipart
/// request.
#[derive(Default)]
pub struct CatalogForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub images: Vec<Vec<u8>>,
}

/// Drain a multipart stream into a [`CatalogForm`].
///
/// Image parts may be named `image` or `images`; repeated parts append.
/// Each payload is size-capped while being read, so an oversized upload is
/// rejected before it is buffered whole.
pub async fn collect_catalog_form(
    mut multipart: Multipart,
    max_image_size: u64,
) -> Result<CatalogForm, AppError> {
    let mut form = CatalogForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("name") => form.name = Some(read_text(field).await?),
            Some("description") => form.description = Some(read_text(field).await?),
            Some("category_id") => {
                let text = read_text(field).await?;
                let id = text.trim().parse().map_err(|_| {
                    AppError::Validation("category_id must be an integer".into())
                })?;
                form.category_id = Some(id);
            }
            Some("image") | Some("images") => {
                form.images.push(read_image(field, max_image_size).await?)
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(form)
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read field: {e}")))
}

async fn read_image(mut field: Field<'_>, max_size: u64) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (buf.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "Image exceeds maximum size of {max_size} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    if buf.is_empty() {
        return Err(AppError::Validation("Image field is empty".into()));
    }

    Ok(buf)
}
