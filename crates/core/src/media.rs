//! Image upload slots and CDN URL helpers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which form an upload belongs to; selects the backend upload folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Product,
    Drop,
}

impl UploadKind {
    /// Path segment in `/uploads/{kind}`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Drop => "drop",
        }
    }

    /// Number of image slots the form offers.
    #[must_use]
    pub const fn slot_count(self) -> usize {
        match self {
            Self::Product => 4,
            Self::Drop => 2,
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Self::Product),
            "drop" => Ok(Self::Drop),
            _ => Err(()),
        }
    }
}

/// What the upload endpoint returns for a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    /// Opaque id for later deletion.
    pub public_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Whether a content type is an image the upload slots accept.
#[must_use]
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

/// State of one image slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotState {
    #[default]
    Empty,
    Uploading { percent: u8 },
    Done { image: UploadedImage },
    Error,
}

impl SlotState {
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Done { image } => Some(&image.url),
            _ => None,
        }
    }
}

/// Error for slot operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("image slot {index} out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },
}

/// The ordered slots of an upload form. Slot 0 is the required main image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSlots {
    slots: Vec<SlotState>,
}

impl ImageSlots {
    /// Empty slots for a form kind.
    #[must_use]
    pub fn new(kind: UploadKind) -> Self {
        Self {
            slots: vec![SlotState::Empty; kind.slot_count()],
        }
    }

    /// Slots prefilled from existing image URLs (editing an existing item).
    #[must_use]
    pub fn from_urls(kind: UploadKind, urls: &[String]) -> Self {
        let mut slots = Self::new(kind);
        for (slot, url) in slots.slots.iter_mut().zip(urls) {
            if !url.is_empty() {
                *slot = SlotState::Done {
                    image: UploadedImage {
                        url: url.clone(),
                        public_id: String::new(),
                        width: 0,
                        height: 0,
                    },
                };
            }
        }
        slots
    }

    #[must_use]
    pub fn slots(&self) -> &[SlotState] {
        &self.slots
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut SlotState, SlotError> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(SlotError::OutOfRange { index, len })
    }

    /// Mark a slot as uploading at `percent`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn set_progress(&mut self, index: usize, percent: u8) -> Result<(), SlotError> {
        *self.slot_mut(index)? = SlotState::Uploading {
            percent: percent.min(100),
        };
        Ok(())
    }

    /// Store a finished upload. Returns the image it replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn set_done(
        &mut self,
        index: usize,
        image: UploadedImage,
    ) -> Result<Option<UploadedImage>, SlotError> {
        let slot = self.slot_mut(index)?;
        let previous = match core::mem::replace(slot, SlotState::Done { image }) {
            SlotState::Done { image } => Some(image),
            _ => None,
        };
        Ok(previous)
    }

    /// Mark a slot as failed.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn set_error(&mut self, index: usize) -> Result<(), SlotError> {
        *self.slot_mut(index)? = SlotState::Error;
        Ok(())
    }

    /// Record a failed upload. A slot that already holds an image keeps it.
    /// Returns `true` when the slot was marked as failed.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn fail_upload(&mut self, index: usize) -> Result<bool, SlotError> {
        let slot = self.slot_mut(index)?;
        if matches!(slot, SlotState::Done { .. }) {
            return Ok(false);
        }
        *slot = SlotState::Error;
        Ok(true)
    }

    /// Empty a slot, returning the image it held.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for an invalid index.
    pub fn clear(&mut self, index: usize) -> Result<Option<UploadedImage>, SlotError> {
        let slot = self.slot_mut(index)?;
        Ok(match core::mem::take(slot) {
            SlotState::Done { image } => Some(image),
            _ => None,
        })
    }

    /// URLs of finished uploads, in slot order, skipping empty slots.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter_map(SlotState::url)
            .map(str::to_owned)
            .collect()
    }

    /// URL held in a given slot.
    #[must_use]
    pub fn url_at(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(SlotState::url)
    }

    /// Whether the required main slot holds an image.
    #[must_use]
    pub fn has_required(&self) -> bool {
        self.slots.first().is_some_and(SlotState::is_done)
    }
}

/// Upload progress as a whole percentage, `round(sent / total * 100)`.
#[must_use]
pub fn progress_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total);
    // (sent * 100 + total / 2) / total rounds half up without floats
    let pct = (u128::from(sent) * 100 + u128::from(total) / 2) / u128::from(total);
    u8::try_from(pct).unwrap_or(100)
}

/// Options for a CDN-side image transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transform<'a> {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<&'a str>,
}

impl Transform<'_> {
    /// A `w x h` fill crop.
    #[must_use]
    pub const fn fill(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            crop: None,
        }
    }
}

/// Insert a Cloudinary transformation segment after `/upload/`.
///
/// Non-Cloudinary URLs are returned unchanged.
///
/// ```rust
/// # use blessed_core::media::{transform_url, Transform};
/// let url = "https://res.cloudinary.com/demo/image/upload/v1/tee.jpg";
/// assert_eq!(
///     transform_url(url, Transform::fill(400, 500)),
///     "https://res.cloudinary.com/demo/image/upload/w_400,h_500,c_fill,q_auto,f_auto/v1/tee.jpg"
/// );
/// ```
#[must_use]
pub fn transform_url(url: &str, opts: Transform<'_>) -> String {
    if !url.contains("cloudinary.com") {
        return url.to_owned();
    }
    let mut parts = Vec::with_capacity(5);
    if let Some(w) = opts.width.filter(|w| *w > 0) {
        parts.push(format!("w_{w}"));
    }
    if let Some(h) = opts.height.filter(|h| *h > 0) {
        parts.push(format!("h_{h}"));
    }
    parts.push(format!("c_{}", opts.crop.unwrap_or("fill")));
    parts.push("q_auto".to_owned());
    parts.push("f_auto".to_owned());
    url.replacen("/upload/", &format!("/upload/{}/", parts.join(",")), 1)
}
