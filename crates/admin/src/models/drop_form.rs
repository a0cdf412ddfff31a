//! Drop form values as entered in the admin.

use blessed_core::drop::{DEFAULT_ACCENT_COLOR, DropValidationError};
use blessed_core::{Drop, DropId, DropInput};
use serde::Deserialize;

/// Raw drop form fields. `active` is present when the checkbox is ticked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DropForm {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hero_image: String,
    #[serde(default)]
    pub hero_image2: String,
    #[serde(default)]
    pub accent_color: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub total_pieces: String,
    #[serde(default)]
    pub active: Option<String>,
}

impl Default for DropForm {
    fn default() -> Self {
        Self {
            number: String::new(),
            label: String::new(),
            tagline: String::new(),
            description: String::new(),
            hero_image: String::new(),
            hero_image2: String::new(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            release_date: String::new(),
            total_pieces: "0".to_string(),
            active: Some("on".to_string()),
        }
    }
}

impl From<&Drop> for DropForm {
    fn from(drop: &Drop) -> Self {
        Self {
            number: drop.number.clone(),
            label: drop.label.clone(),
            tagline: drop.tagline.clone(),
            description: drop.description.clone(),
            hero_image: drop.hero_image.clone(),
            hero_image2: drop.hero_image2.clone().unwrap_or_default(),
            accent_color: drop.accent_color.clone(),
            release_date: drop.release_date.clone(),
            total_pieces: drop.total_pieces.to_string(),
            active: drop.active.then(|| "on".to_string()),
        }
    }
}

impl DropForm {
    /// Build and validate the payload.
    ///
    /// New drops get their id from the number; an edited drop keeps `id`.
    /// Blank or negative piece counts read as zero.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn to_input(&self, id: Option<&DropId>) -> Result<DropInput, DropValidationError> {
        let number = self.number.trim();
        let hero_image2 = self.hero_image2.trim();
        let input = DropInput {
            id: id.cloned().unwrap_or_else(|| Drop::id_for_number(number)),
            number: number.to_string(),
            label: self.label.trim().to_string(),
            tagline: self.tagline.trim().to_string(),
            description: self.description.trim().to_string(),
            hero_image: self.hero_image.trim().to_string(),
            hero_image2: (!hero_image2.is_empty()).then(|| hero_image2.to_string()),
            accent_color: self.accent_color.trim().to_string(),
            release_date: self.release_date.trim().to_string(),
            total_pieces: self.total_pieces.trim().parse().unwrap_or(0),
            active: self.active.is_some(),
        };
        input.validate()?;
        Ok(input)
    }
}
