//! Flat-rate shipping quotes by Argentine postal code zone.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors from shipping input.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ShippingError {
    #[error("El código postal debe tener 4 dígitos.")]
    InvalidPostalCode,
    #[error("Método de envío desconocido: {0}")]
    UnknownCarrier(String),
    #[error("Seleccioná un método de envío.")]
    NoCarrierSelected,
}

/// A 4-digit Argentine postal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostalCode(u16);

impl PostalCode {
    /// Parse exactly four ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::InvalidPostalCode`] for anything else.
    pub fn parse(s: &str) -> Result<Self, ShippingError> {
        let s = s.trim();
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ShippingError::InvalidPostalCode);
        }
        s.parse()
            .map(Self)
            .map_err(|_| ShippingError::InvalidPostalCode)
    }

    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Pricing zone for this code.
    #[must_use]
    pub const fn zone(self) -> Zone {
        match self.0 {
            1000..=1999 => Zone::Metro,
            2000..=2999 => Zone::MetroOuter,
            _ => Zone::Interior,
        }
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Shipping price zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// CABA and Gran Buenos Aires.
    Metro,
    /// GBA zona 2.
    MetroOuter,
    Interior,
}

/// Supported carriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Carrier {
    OcaEstandar,
    CorreoEstandar,
}

impl Carrier {
    pub const ALL: [Self; 2] = [Self::OcaEstandar, Self::CorreoEstandar];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::OcaEstandar => "oca_estandar",
            Self::CorreoEstandar => "correo_estandar",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OcaEstandar => "OCA",
            Self::CorreoEstandar => "Correo Argentino",
        }
    }

    /// Short badge text.
    #[must_use]
    pub const fn logo(self) -> &'static str {
        match self {
            Self::OcaEstandar => "OCA",
            Self::CorreoEstandar => "CA",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        "Estándar a domicilio"
    }

    #[must_use]
    pub const fn estimated_days(self) -> &'static str {
        match self {
            Self::OcaEstandar => "3-5 días hábiles",
            Self::CorreoEstandar => "5-8 días hábiles",
        }
    }

    /// Flat rate for a zone.
    #[must_use]
    pub fn cost(self, zone: Zone) -> Decimal {
        let pesos: i64 = match (self, zone) {
            (Self::OcaEstandar, Zone::Metro) => 8_500,
            (Self::CorreoEstandar, Zone::Metro) => 6_900,
            (Self::OcaEstandar, Zone::MetroOuter) => 10_500,
            (Self::CorreoEstandar, Zone::MetroOuter) => 8_900,
            (Self::OcaEstandar, Zone::Interior) => 13_500,
            (Self::CorreoEstandar, Zone::Interior) => 11_900,
        };
        Decimal::from(pesos)
    }
}

impl FromStr for Carrier {
    type Err = ShippingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| ShippingError::UnknownCarrier(s.to_owned()))
    }
}

/// A priced shipping choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub carrier: Carrier,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}

impl ShippingOption {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.carrier.name()
    }
}

/// Cost of shipping to `cp` with `carrier`.
#[must_use]
pub fn shipping_cost(cp: PostalCode, carrier: Carrier) -> Decimal {
    carrier.cost(cp.zone())
}

/// One option per carrier for a postal code.
#[must_use]
pub fn quote(cp: PostalCode) -> Vec<ShippingOption> {
    Carrier::ALL
        .into_iter()
        .map(|carrier| ShippingOption {
            carrier,
            cost: shipping_cost(cp, carrier),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cost(cp: &str, carrier: Carrier) -> Decimal {
        shipping_cost(PostalCode::parse(cp).unwrap(), carrier)
    }

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(cost("1000", Carrier::OcaEstandar), Decimal::from(8_500));
        assert_eq!(cost("1999", Carrier::CorreoEstandar), Decimal::from(6_900));
        assert_eq!(cost("2000", Carrier::OcaEstandar), Decimal::from(10_500));
        assert_eq!(cost("2999", Carrier::CorreoEstandar), Decimal::from(8_900));
        assert_eq!(cost("3000", Carrier::OcaEstandar), Decimal::from(13_500));
        assert_eq!(cost("0999", Carrier::CorreoEstandar), Decimal::from(11_900));
    }

    #[test]
    fn test_postal_code_must_be_four_digits() {
        assert!(PostalCode::parse("123").is_err());
        assert!(PostalCode::parse("12345").is_err());
        assert!(PostalCode::parse("12a4").is_err());
        assert!(PostalCode::parse("+123").is_err());
        assert_eq!(PostalCode::parse(" 1425 ").unwrap().value(), 1425);
        assert_eq!(PostalCode::parse("0800").unwrap().to_string(), "0800");
    }

    #[test]
    fn test_quote_lists_every_carrier() {
        let options = quote(PostalCode::parse("5000").unwrap());
        assert_eq!(options.len(), 2);
        assert_eq!(options.first().unwrap().name(), "OCA");
        assert_eq!(options.last().unwrap().cost, Decimal::from(11_900));
    }

    #[test]
    fn test_carrier_from_id() {
        assert_eq!("correo_estandar".parse::<Carrier>().unwrap(), Carrier::CorreoEstandar);
        assert!(matches!(
            "andreani".parse::<Carrier>(),
            Err(ShippingError::UnknownCarrier(_))
        ));
    }
}
