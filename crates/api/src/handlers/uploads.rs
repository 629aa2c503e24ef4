//! Listing image uploads.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use goldipuppy_core::error::CoreError;
use goldipuppy_core::storage::{validate_image_extension, MAX_UPLOAD_BYTES, PUPPY_IMAGE_PREFIX};
use image::ImageFormat;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub url: String,
}

/// POST /api/admin/uploads
///
/// Accepts one image in the `file` field. The content is sniffed and must
/// be PNG, JPEG or WebP matching its extension. Returns the public URL to
/// use in a listing's `images`.
pub async fn upload_image(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UploadResult>>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let ext = validate_image_extension(&filename)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest(format!(
                "Image exceeds the {} MiB limit",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        check_content(&data, &ext)?;

        let object_path = format!("{PUPPY_IMAGE_PREFIX}/{}.{ext}", Uuid::new_v4());
        let url = state
            .images
            .put(&object_path, &data)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        tracing::info!(
            object_path = %object_path,
            bytes = data.len(),
            admin_id = %admin.user_id,
            "Image uploaded"
        );
        return Ok((StatusCode::CREATED, Json(DataResponse { data: UploadResult { url } })));
    }

    Err(AppError::BadRequest(format!(
        "No '{FILE_FIELD}' field in multipart upload"
    )))
}

/// The bytes must decode as the format their extension claims.
fn check_content(data: &[u8], ext: &str) -> AppResult<()> {
    let expected = match ext {
        "png" => ImageFormat::Png,
        "jpg" | "jpeg" => ImageFormat::Jpeg,
        _ => ImageFormat::WebP,
    };
    match image::guess_format(data) {
        Ok(format) if format == expected => Ok(()),
        _ => Err(AppError::Core(CoreError::Validation(format!(
            "File content is not a valid .{ext} image"
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn matching_content_is_accepted() {
        assert!(check_content(PNG_MAGIC, "png").is_ok());
        assert!(check_content(JPEG_MAGIC, "jpeg").is_ok());
        assert!(check_content(JPEG_MAGIC, "jpg").is_ok());
    }

    #[test]
    fn mismatched_or_garbage_content_is_rejected() {
        assert!(check_content(PNG_MAGIC, "jpg").is_err());
        assert!(check_content(b"<html>not an image</html>", "png").is_err());
    }
}
