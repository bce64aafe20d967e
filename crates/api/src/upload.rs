//! Multipart form parsing and image uploads.
//!
//! Forms for ads and profiles arrive as `multipart/form-data` with text
//! fields plus one optional image. Uploaded bytes are sniffed rather than
//! trusted: only PNG, JPEG and WebP are accepted, and the stored content
//! type comes from the detected format.

use std::collections::HashMap;

use axum::extract::Multipart;
use classifieds_core::error::CoreError;
use classifieds_core::types::DbId;
use classifieds_db::models::image::CreateImage;
use classifieds_db::repositories::ImageRepo;
use classifieds_db::DbPool;
use image::ImageFormat;

use crate::error::{AppError, AppResult};

/// Accepted upload formats.
const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// A validated image upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text fields plus the optional image of a multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl MultipartForm {
    /// Record a text field, replacing any earlier value with the same name.
    pub fn insert_text(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    /// Trimmed field value; blank values count as missing.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Field value or `""`.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    /// Required field, rejected with 400 when missing or blank.
    pub fn require(&self, name: &str) -> AppResult<String> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required field '{name}'")))
    }
}

/// Read every part of `multipart`. The part named `image_field` is treated
/// as the image; an empty file part (no file chosen) is ignored.
pub async fn read_form(multipart: &mut Multipart, image_field: &str) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == image_field {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if !data.is_empty() {
                form.image = Some(sniff_image(filename, data.to_vec())?);
            }
        } else if !name.is_empty() {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.insert_text(&name, &text);
        }
    }

    Ok(form)
}

/// Detect the image format from its magic bytes.
pub fn sniff_image(filename: String, data: Vec<u8>) -> AppResult<UploadedImage> {
    let format = image::guess_format(&data)
        .ok()
        .filter(|f| ALLOWED_FORMATS.contains(f))
        .ok_or_else(|| {
            AppError::BadRequest("Unsupported image format. Supported: PNG, JPEG, WebP".into())
        })?;

    Ok(UploadedImage {
        filename,
        content_type: format.to_mime_type().to_string(),
        data,
    })
}

/// Store an uploaded image and return its id.
pub async fn store_image(pool: &DbPool, image: UploadedImage) -> AppResult<DbId> {
    let id = ImageRepo::put(
        pool,
        &CreateImage {
            filename: image.filename,
            content_type: image.content_type,
            data: image.data,
        },
    )
    .await?;
    Ok(id)
}

/// Delete an image, ignoring failures. Used when an image is replaced or
/// its owner is removed.
pub async fn discard_image(pool: &DbPool, image_id: Option<DbId>) {
    let Some(id) = image_id else {
        return;
    };
    if let Err(e) = ImageRepo::delete(pool, id).await {
        tracing::warn!(image_id = id, error = %e, "Failed to delete replaced image");
    }
}

/// Finish an update whose row may now point at `new_image_id`.
///
/// When the write failed or matched no row, the freshly stored image is
/// deleted again and the error (or `missing`) is returned.
pub async fn settle_image_write<T>(
    pool: &DbPool,
    new_image_id: Option<DbId>,
    written: Result<Option<T>, sqlx::Error>,
    missing: CoreError,
) -> AppResult<T> {
    let err = match written {
        Ok(Some(row)) => return Ok(row),
        Ok(None) => AppError::Core(missing),
        Err(e) => AppError::Database(e),
    };
    discard_image(pool, new_image_id).await;
    Err(err)
}
