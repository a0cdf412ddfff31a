//! Price arithmetic and display for Argentine peso amounts.
//!
//! The store sells in a single currency (ARS), so prices are plain
//! [`Decimal`] amounts. This module owns the pieces of pricing logic shared
//! by the storefront, admin and CLI: es-AR formatting (`$51.000`), the
//! discount badge percentage, and the "3 cuotas sin interés" installment hint.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of interest-free installments advertised on product and cart views.
pub const INSTALLMENTS: u32 = 3;

/// A peso amount with es-AR display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The raw amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Amount of each interest-free installment (rounded down).
    #[must_use]
    pub fn installment(&self) -> Self {
        Self(installment_amount(self.0, INSTALLMENTS))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_price(self.0))
    }
}

/// Format an amount the way an es-AR locale displays pesos.
///
/// Thousands are grouped with `.`, decimals (at most two, trailing zeros
/// dropped) follow a `,`.
///
/// ```rust
/// # use blessed_core::format_price;
/// # use rust_decimal::Decimal;
/// assert_eq!(format_price(Decimal::from(51_000)), "$51.000");
/// assert_eq!(format_price(Decimal::new(12345, 1)), "$1.234,5");
/// assert_eq!(format_price(Decimal::ZERO), "$0");
/// ```
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let integer = abs.trunc();
    let fraction = (abs - integer).normalize();

    let digits = integer.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if !fraction.is_zero() {
        let fraction = fraction.to_string();
        grouped.push(',');
        grouped.push_str(fraction.trim_start_matches("0."));
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Percentage saved relative to the original price.
///
/// Computed as `round((1 - price / original) * 100)`, and 0 whenever there is
/// no markdown (`original <= price`, which also covers `original == 0`).
///
/// ```rust
/// # use blessed_core::discount_percent;
/// # use rust_decimal::Decimal;
/// assert_eq!(discount_percent(Decimal::from(70), Decimal::from(100)), 30);
/// assert_eq!(discount_percent(Decimal::from(100), Decimal::from(80)), 0);
/// ```
#[must_use]
pub fn discount_percent(price: Decimal, original: Decimal) -> u32 {
    if original <= price || original.is_zero() {
        return 0;
    }
    let ratio = (Decimal::ONE - price / original) * Decimal::ONE_HUNDRED;
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Size of one installment when `total` is split `n` ways, rounded down.
#[must_use]
pub fn installment_amount(total: Decimal, n: u32) -> Decimal {
    if n == 0 {
        return total;
    }
    (total / Decimal::from(n)).floor()
}

/// The "3 cuotas sin interés de $X" hint shown next to a total.
#[must_use]
pub fn installment_hint(total: Decimal) -> String {
    format!(
        "{INSTALLMENTS} cuotas sin interés de {}",
        format_price(installment_amount(total, INSTALLMENTS))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_groups_thousands() {
        assert_eq!(format_price(Decimal::from(999)), "$999");
        assert_eq!(format_price(Decimal::from(1_000)), "$1.000");
        assert_eq!(format_price(Decimal::from(1_234_567)), "$1.234.567");
    }

    #[test]
    fn test_format_price_trims_decimals() {
        assert_eq!(format_price(Decimal::new(1_000_50, 2)), "$1.000,5");
        assert_eq!(format_price(Decimal::new(42_00, 2)), "$42");
        assert_eq!(format_price(Decimal::new(1_999, 3)), "$2");
    }

    #[test]
    fn test_format_price_negative() {
        assert_eq!(format_price(Decimal::from(-1_500)), "-$1.500");
    }

    #[test]
    fn test_discount_percent_rounds_half_up() {
        // 1 - 0.875 = 12.5% -> 13
        assert_eq!(discount_percent(Decimal::from(875), Decimal::from(1000)), 13);
        assert_eq!(discount_percent(Decimal::from(2), Decimal::from(3)), 33);
    }

    #[test]
    fn test_discount_percent_zero_cases() {
        assert_eq!(discount_percent(Decimal::from(100), Decimal::ZERO), 0);
        assert_eq!(discount_percent(Decimal::from(100), Decimal::from(100)), 0);
        assert_eq!(discount_percent(Decimal::from(120), Decimal::from(100)), 0);
    }

    #[test]
    fn test_installment_floor() {
        assert_eq!(installment_amount(Decimal::from(100), 3), Decimal::from(33));
        assert_eq!(installment_amount(Decimal::from(51_000), 3), Decimal::from(17_000));
        assert_eq!(installment_amount(Decimal::from(7), 0), Decimal::from(7));
    }

    #[test]
    fn test_installment_hint() {
        assert_eq!(
            installment_hint(Decimal::from(100_000)),
            "3 cuotas sin interés de $33.333"
        );
    }

    #[test]
    fn test_price_display_and_installment() {
        let price = Price::new(Decimal::from(45_000));
        assert_eq!(price.to_string(), "$45.000");
        assert_eq!(price.installment().to_string(), "$15.000");
    }
}
