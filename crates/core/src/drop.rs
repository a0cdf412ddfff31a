//! Drops: limited-release collections with their own landing page.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::DropId;

/// Accent color preselected in the admin drop form.
pub const DEFAULT_ACCENT_COLOR: &str = "#e8e4dc";

/// A drop as served by the backend API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drop {
    pub id: DropId,
    /// Display number, e.g. `"02"`.
    pub number: String,
    pub label: String,
    pub tagline: String,
    pub description: String,
    pub hero_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image2: Option<String>,
    pub accent_color: String,
    /// Release instant as entered in the admin (RFC 3339 or `YYYY-MM-DD`).
    pub release_date: String,
    pub total_pieces: u32,
    pub active: bool,
    /// Assigned by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Payload for creating (or fully replacing) a drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropInput {
    pub id: DropId,
    pub number: String,
    pub label: String,
    pub tagline: String,
    pub description: String,
    pub hero_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image2: Option<String>,
    pub accent_color: String,
    pub release_date: String,
    pub total_pieces: u32,
    pub active: bool,
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_image2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pieces: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl DropUpdate {
    /// An update that only flips the active flag.
    #[must_use]
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    /// Apply this update to a local copy.
    pub fn apply_to(&self, drop: &mut Drop) {
        if let Some(v) = &self.number {
            drop.number.clone_from(v);
        }
        if let Some(v) = &self.label {
            drop.label.clone_from(v);
        }
        if let Some(v) = &self.tagline {
            drop.tagline.clone_from(v);
        }
        if let Some(v) = &self.description {
            drop.description.clone_from(v);
        }
        if let Some(v) = &self.hero_image {
            drop.hero_image.clone_from(v);
        }
        if let Some(v) = &self.hero_image2 {
            drop.hero_image2 = (!v.is_empty()).then(|| v.clone());
        }
        if let Some(v) = &self.accent_color {
            drop.accent_color.clone_from(v);
        }
        if let Some(v) = &self.release_date {
            drop.release_date.clone_from(v);
        }
        if let Some(v) = self.total_pieces {
            drop.total_pieces = v;
        }
        if let Some(v) = self.active {
            drop.active = v;
        }
    }
}

impl From<DropInput> for DropUpdate {
    fn from(input: DropInput) -> Self {
        Self {
            number: Some(input.number),
            label: Some(input.label),
            tagline: Some(input.tagline),
            description: Some(input.description),
            hero_image: Some(input.hero_image),
            hero_image2: Some(input.hero_image2.unwrap_or_default()),
            accent_color: Some(input.accent_color),
            release_date: Some(input.release_date),
            total_pieces: Some(input.total_pieces),
            active: Some(input.active),
        }
    }
}

impl From<Drop> for DropInput {
    fn from(drop: Drop) -> Self {
        Self {
            id: drop.id,
            number: drop.number,
            label: drop.label,
            tagline: drop.tagline,
            description: drop.description,
            hero_image: drop.hero_image,
            hero_image2: drop.hero_image2,
            accent_color: drop.accent_color,
            release_date: drop.release_date,
            total_pieces: drop.total_pieces,
            active: drop.active,
        }
    }
}

/// Reasons a drop fails admin form validation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DropValidationError {
    #[error("El campo {0} es obligatorio.")]
    Required(&'static str),
}

impl DropInput {
    /// Check the fields the admin form requires.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn validate(&self) -> Result<(), DropValidationError> {
        let required = [
            ("número", &self.number),
            ("nombre", &self.label),
            ("tagline", &self.tagline),
            ("descripción", &self.description),
            ("imagen principal", &self.hero_image),
            ("color de acento", &self.accent_color),
            ("fecha de lanzamiento", &self.release_date),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DropValidationError::Required(field));
            }
        }
        Ok(())
    }
}

impl Drop {
    /// Id the admin form assigns to a new drop: `"drop{number}"`.
    #[must_use]
    pub fn id_for_number(number: &str) -> DropId {
        DropId::for_number(number)
    }

    /// Parsed release instant.
    ///
    /// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (read as UTC), or a
    /// bare `YYYY-MM-DD` (midnight UTC).
    #[must_use]
    pub fn release_at(&self) -> Option<DateTime<Utc>> {
        parse_release_date(&self.release_date)
    }

    /// Whether the drop is open. Unparseable dates count as released.
    #[must_use]
    pub fn is_released(&self, now: DateTime<Utc>) -> bool {
        self.release_at().is_none_or(|at| at <= now)
    }

    /// Label used for this drop in catalog filters.
    #[must_use]
    pub fn filter_label(&self) -> String {
        format!("Drop {}", self.number)
    }

    /// Landing page path.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/drops/{}", self.id)
    }
}

/// Parse the release date formats the admin produces.
#[must_use]
pub fn parse_release_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Split drops into (active, inactive), preserving order.
#[must_use]
pub fn partition_by_active(drops: &[Drop]) -> (Vec<&Drop>, Vec<&Drop>) {
    drops.iter().partition(|d| d.active)
}
