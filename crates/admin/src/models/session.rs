//! Session-related types for admin authentication and the upload wizard.

use blessed_core::media::{ImageSlots, UploadKind};
use blessed_core::wizard::{UploadStep, WizardStep};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProductForm;

/// Session-stored admin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            logged_in_at: Utc::now(),
        }
    }
}

/// Session keys for admin data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the in-progress [`super::ProductDraft`].
    pub const PRODUCT_DRAFT: &str = "product_draft";

    /// Key for the one-shot [`super::Flash`] message.
    pub const FLASH: &str = "flash";
}

/// Kind of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

/// Message shown once on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, FlashKind::Error)
    }
}

/// The new-product wizard: details, then images, then review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub step: UploadStep,
    pub form: ProductForm,
    pub images: ImageSlots,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            step: UploadStep::Details,
            form: ProductForm::default(),
            images: ImageSlots::new(UploadKind::Product),
        }
    }
}

impl ProductDraft {
    /// Store validated details and move to the image step.
    pub fn set_details(&mut self, form: ProductForm) {
        self.form = form;
        self.step = UploadStep::Images;
    }

    /// Move to review. Only possible once the main image is uploaded.
    pub fn review(&mut self) -> bool {
        if self.step == UploadStep::Images && self.images.has_required() {
            self.step = UploadStep::Review;
            true
        } else {
            false
        }
    }

    /// Go back exactly one step. Entered data and images are kept.
    pub fn back(&mut self) {
        self.step = self.step.back();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blessed_core::media::UploadedImage;

    use super::*;

    #[test]
    fn test_draft_requires_main_image_for_review() {
        let mut draft = ProductDraft::default();
        draft.set_details(ProductForm::default());
        assert_eq!(draft.step, UploadStep::Images);
        assert!(!draft.review());

        draft
            .images
            .set_done(
                0,
                UploadedImage {
                    url: "https://res.cloudinary.com/x/image/upload/v1/a.jpg".to_string(),
                    public_id: "blessed/a".to_string(),
                    width: 800,
                    height: 1000,
                },
            )
            .unwrap();
        assert!(draft.review());
        assert_eq!(draft.step, UploadStep::Review);

        draft.back();
        assert_eq!(draft.step, UploadStep::Images);
        assert!(draft.images.has_required());
    }

    #[test]
    fn test_back_stays_on_first_step() {
        let mut draft = ProductDraft::default();
        draft.back();
        assert_eq!(draft.step, UploadStep::Details);
    }

    #[test]
    fn test_flash_kinds() {
        assert!(Flash::error("x").is_error());
        assert!(!Flash::success("y").is_error());
    }
}
