//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use blessed_core::countdown::format_release_date;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Long es-AR date for a drop release date; unparseable input is shown as-is.
///
/// Usage in templates: `{{ drop.release_date|fecha }}` renders `05 de marzo de 2026`.
#[askama::filter_fn]
pub fn fecha(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_release_date(&value.to_string()))
}
