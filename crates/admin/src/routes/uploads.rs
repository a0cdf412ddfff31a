//! Image upload helpers shared by the product wizard and the edit forms.
//!
//! The browser reports its own upload progress (`static/js/admin.js`); the
//! server side streams the file on to the backend in chunks and logs the
//! percentage as it goes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use blessed_core::media::{
    SlotError, Transform, UploadKind, UploadedImage, is_image_content_type, transform_url,
};
use tracing::instrument;

use crate::backend::{BackendClient, UploadFile};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Largest accepted request body on upload routes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Preview size for uploaded images.
pub const PREVIEW_IMAGE: Transform<'static> = Transform::fill(240, 300);

pub(crate) const UPLOAD_FAILED: &str = "Error al subir la imagen.";

/// Why an upload request could not be sent on.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Seleccioná una imagen.")]
    Missing,
    #[error("El archivo no es una imagen.")]
    NotAnImage,
    #[error("No se pudo leer el archivo.")]
    Unreadable,
}

/// Check a slot index against the form kind.
pub(crate) fn check_slot(kind: UploadKind, slot: usize) -> Result<()> {
    let len = kind.slot_count();
    if slot < len {
        Ok(())
    } else {
        Err(AppError::Slot(SlotError::OutOfRange { index: slot, len }))
    }
}

/// Pull the `file` field out of a multipart body.
pub(crate) async fn read_image(
    multipart: &mut Multipart,
) -> std::result::Result<UploadFile, UploadRejection> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| UploadRejection::Unreadable)?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("imagen").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|_| UploadRejection::Unreadable)?;
        return validate_image(UploadFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(UploadRejection::Missing)
}

/// Reject empty files and anything that is not an image.
pub(crate) fn validate_image(file: UploadFile) -> std::result::Result<UploadFile, UploadRejection> {
    if file.bytes.is_empty() {
        return Err(UploadRejection::Missing);
    }
    if !is_image_content_type(&file.content_type) {
        return Err(UploadRejection::NotAnImage);
    }
    Ok(file)
}

/// Upload to the backend, logging progress per slot.
pub(crate) async fn send_image(
    backend: &BackendClient,
    kind: UploadKind,
    slot: usize,
    file: UploadFile,
) -> std::result::Result<UploadedImage, crate::backend::BackendError> {
    backend
        .upload_image(kind, file, move |percent| {
            tracing::debug!(%kind, slot, percent, "Upload progress");
        })
        .await
}

/// Delete a replaced image in the background. Prefilled slots have no id.
pub(crate) fn discard_image(backend: &BackendClient, image: Option<UploadedImage>) {
    let Some(image) = image.filter(|i| !i.public_id.is_empty()) else {
        return;
    };
    let backend = backend.clone();
    tokio::spawn(async move {
        if let Err(e) = backend.delete_image(&image.public_id).await {
            tracing::warn!(public_id = %image.public_id, "Failed to delete replaced image: {e}");
        }
    });
}

/// Form field an edit-form slot fills in.
#[must_use]
pub fn field_name(kind: UploadKind, slot: usize) -> String {
    match (kind, slot) {
        (UploadKind::Drop, 0) => "hero_image".to_string(),
        (UploadKind::Drop, _) => "hero_image2".to_string(),
        (UploadKind::Product, n) => format!("image_{n}"),
    }
}

/// URL input with preview, swapped in after an edit-form upload.
#[derive(Template, WebTemplate)]
#[template(path = "partials/image_field.html")]
pub struct ImageFieldTemplate {
    pub kind: &'static str,
    pub slot: usize,
    pub name: String,
    pub label: String,
    pub url: String,
    pub preview: Option<String>,
    pub error: Option<String>,
}

impl ImageFieldTemplate {
    #[must_use]
    pub fn new(kind: UploadKind, slot: usize, label: &str, url: &str) -> Self {
        Self {
            kind: kind.as_str(),
            slot,
            name: field_name(kind, slot),
            label: label.to_string(),
            url: url.to_string(),
            preview: (!url.is_empty()).then(|| transform_url(url, PREVIEW_IMAGE)),
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Label for an edit-form image slot.
#[must_use]
pub fn slot_label(kind: UploadKind, slot: usize) -> String {
    match (kind, slot) {
        (_, 0) => "Foto principal".to_string(),
        (UploadKind::Drop, _) => "Foto secundaria".to_string(),
        (UploadKind::Product, n) => format!("Foto {}", n + 1),
    }
}

/// Upload for an edit form; answers with the filled-in URL field.
async fn upload_field(
    state: &AppState,
    kind: UploadKind,
    slot: usize,
    mut multipart: Multipart,
) -> Result<Response> {
    check_slot(kind, slot)?;
    let label = slot_label(kind, slot);

    let file = match read_image(&mut multipart).await {
        Ok(file) => file,
        Err(rejection) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                ImageFieldTemplate::new(kind, slot, &label, "").with_error(rejection.to_string()),
            )
                .into_response());
        }
    };

    match send_image(state.backend(), kind, slot, file).await {
        Ok(image) => Ok(ImageFieldTemplate::new(kind, slot, &label, &image.url).into_response()),
        Err(e) => {
            tracing::error!(%kind, slot, "Image upload failed: {e}");
            Ok((
                StatusCode::BAD_GATEWAY,
                ImageFieldTemplate::new(kind, slot, &label, "").with_error(UPLOAD_FAILED),
            )
                .into_response())
        }
    }
}

/// POST /products/images/{slot}
#[instrument(skip(state, multipart))]
pub async fn upload_product_field(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(slot): Path<usize>,
    multipart: Multipart,
) -> Result<Response> {
    upload_field(&state, UploadKind::Product, slot, multipart).await
}

/// POST /drops/images/{slot}
#[instrument(skip(state, multipart))]
pub async fn upload_drop_field(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(slot): Path<usize>,
    multipart: Multipart,
) -> Result<Response> {
    upload_field(&state, UploadKind::Drop, slot, multipart).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::*;

    fn file(content_type: &str, bytes: &'static [u8]) -> UploadFile {
        UploadFile {
            file_name: "a.jpg".to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image(file("image/jpeg", b"\xff\xd8")).is_ok());
        assert_eq!(
            validate_image(file("image/png", b"")).unwrap_err(),
            UploadRejection::Missing
        );
        assert_eq!(
            validate_image(file("text/plain", b"hola")).unwrap_err(),
            UploadRejection::NotAnImage
        );
    }

    #[test]
    fn test_field_names() {
        assert_eq!(field_name(UploadKind::Drop, 0), "hero_image");
        assert_eq!(field_name(UploadKind::Drop, 1), "hero_image2");
        assert_eq!(field_name(UploadKind::Product, 3), "image_3");
        assert_eq!(slot_label(UploadKind::Product, 2), "Foto 3");
    }

    #[test]
    fn test_check_slot() {
        assert!(check_slot(UploadKind::Product, 3).is_ok());
        assert!(matches!(
            check_slot(UploadKind::Drop, 2),
            Err(AppError::Slot(SlotError::OutOfRange { index: 2, len: 2 }))
        ));
    }

    #[test]
    fn test_image_field_preview() {
        let field = ImageFieldTemplate::new(
            UploadKind::Drop,
            1,
            "Foto secundaria",
            "https://res.cloudinary.com/x/image/upload/v1/h.jpg",
        );
        assert_eq!(field.name, "hero_image2");
        assert_eq!(
            field.preview.as_deref(),
            Some("https://res.cloudinary.com/x/image/upload/w_240,h_300,c_fill,q_auto,f_auto/v1/h.jpg")
        );
        let html = field.render().unwrap();
        assert!(html.contains("name=\"hero_image2\""));
    }
}
