//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

fn count_label(value: &impl Display, singular: &str, plural: &str) -> String {
    let raw = value.to_string();
    if raw == "1" {
        format!("1 {singular}")
    } else {
        format!("{raw} {plural}")
    }
}

/// Product count with the noun agreeing in number.
///
/// Usage in templates: `{{ result_count|productos }}` renders `1 producto` or `12 productos`.
#[askama::filter_fn]
pub fn productos(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(count_label(&value, "producto", "productos"))
}

/// Piece count for limited drops.
///
/// Usage in templates: `{{ drop.total_pieces|piezas }}`
#[askama::filter_fn]
pub fn piezas(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(count_label(&value, "pieza", "piezas"))
}
