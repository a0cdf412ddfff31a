//! Checkout forms, the payment preference request and result pages.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::shipping::{PostalCode, ShippingError, ShippingOption};
use crate::types::{Email, EmailError};

/// Message shown when creating the payment preference fails.
pub const PAYMENT_ERROR_MESSAGE: &str = "Hubo un problema al procesar el pago. Intentá de nuevo.";

/// Field-level validation failures in the checkout forms.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Ingresá un email válido.")]
    Email(#[from] EmailError),
    #[error("Completá el campo {0}.")]
    Required(&'static str),
    #[error(transparent)]
    Shipping(#[from] ShippingError),
}

/// Step 1: contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: Email,
    #[serde(default)]
    pub newsletter: bool,
}

impl ContactDetails {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Email`] for an invalid address.
    pub fn parse(email: &str, newsletter: bool) -> Result<Self, CheckoutError> {
        Ok(Self {
            email: Email::parse(email)?,
            newsletter,
        })
    }
}

/// Raw step 2 form, as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub codigo_postal: String,
    #[serde(default)]
    pub calle: String,
    #[serde(default)]
    pub numero: String,
    #[serde(default)]
    pub piso: String,
    #[serde(default)]
    pub depto: String,
    #[serde(default)]
    pub localidad: String,
    #[serde(default)]
    pub provincia: String,
}

/// Validated step 2 delivery details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub form: DeliveryForm,
    pub postal_code: String,
}

impl DeliveryForm {
    /// Check required fields and the postal code.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, or an invalid postal code.
    pub fn validate(self) -> Result<DeliveryDetails, CheckoutError> {
        let required = [
            ("nombre", &self.nombre),
            ("apellido", &self.apellido),
            ("teléfono", &self.telefono),
            ("código postal", &self.codigo_postal),
            ("calle", &self.calle),
            ("número", &self.numero),
            ("localidad", &self.localidad),
            ("provincia", &self.provincia),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CheckoutError::Required(field));
            }
        }
        let postal_code = PostalCode::parse(&self.codigo_postal)?.to_string();
        Ok(DeliveryDetails {
            form: self,
            postal_code,
        })
    }
}

impl DeliveryDetails {
    /// Parsed postal code. Always valid once validated.
    ///
    /// # Errors
    ///
    /// Only fails if the stored value was tampered with.
    pub fn postal_code(&self) -> Result<PostalCode, ShippingError> {
        PostalCode::parse(&self.postal_code)
    }

    /// Street line: `"calle numero[, piso][ depto]"`.
    #[must_use]
    pub fn street_line(&self) -> String {
        let f = &self.form;
        let mut line = format!("{} {}", f.calle.trim(), f.numero.trim());
        if !f.piso.trim().is_empty() {
            line.push_str(", ");
            line.push_str(f.piso.trim());
        }
        if !f.depto.trim().is_empty() {
            line.push(' ');
            line.push_str(f.depto.trim());
        }
        line
    }

    /// Address block sent to the backend.
    #[must_use]
    pub fn address(&self) -> ShippingAddress {
        let f = &self.form;
        ShippingAddress {
            nombre: f.nombre.trim().to_owned(),
            apellido: f.apellido.trim().to_owned(),
            calle: self.street_line(),
            localidad: f.localidad.trim().to_owned(),
            provincia: f.provincia.trim().to_owned(),
            cp: self.postal_code.clone(),
            telefono: f.telefono.trim().to_owned(),
        }
    }
}

/// Address in the shape the backend expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub nombre: String,
    pub apellido: String,
    pub calle: String,
    pub localidad: String,
    pub provincia: String,
    pub cp: String,
    pub telefono: String,
}

/// Shipping block of a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutShipping {
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub name: String,
    pub address: ShippingAddress,
}

/// `POST /checkout` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub email: Email,
    pub shipping: CheckoutShipping,
}

impl CheckoutRequest {
    /// Assemble the request from the cart and completed steps.
    #[must_use]
    pub fn new(
        items: Vec<CartLine>,
        contact: &ContactDetails,
        delivery: &DeliveryDetails,
        shipping: &ShippingOption,
    ) -> Self {
        Self {
            items,
            email: contact.email.clone(),
            shipping: CheckoutShipping {
                cost: shipping.cost,
                name: shipping.name().to_owned(),
                address: delivery.address(),
            },
        }
    }
}

/// Payment preference created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub init_point: String,
    pub sandbox_init_point: String,
    pub preference_id: String,
}

impl CheckoutResponse {
    /// The hosted payment page to send the buyer to.
    #[must_use]
    pub fn redirect_url(&self, sandbox: bool) -> &str {
        if sandbox {
            &self.sandbox_init_point
        } else {
            &self.init_point
        }
    }
}

/// Outcome reported by the payment processor on return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failure,
    Pending,
}

impl PaymentStatus {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Success => "¡Pago realizado!",
            Self::Failure => "El pago no se pudo completar",
            Self::Pending => "Pago pendiente",
        }
    }

    #[must_use]
    pub const fn subtitle(self) -> &'static str {
        match self {
            Self::Success => {
                "Tu pedido está confirmado. En breve vas a recibir un email con los detalles."
            }
            Self::Failure => {
                "Hubo un problema con tu pago. Podés intentarlo de nuevo o elegir otro método."
            }
            Self::Pending => {
                "Tu pago está siendo procesado. Te avisaremos por email cuando se confirme."
            }
        }
    }

    #[must_use]
    pub const fn button_label(self) -> &'static str {
        match self {
            Self::Success => "Seguir comprando",
            Self::Failure => "Reintentar",
            Self::Pending => "Volver al inicio",
        }
    }

    #[must_use]
    pub const fn button_href(self) -> &'static str {
        match self {
            Self::Success => "/catalog",
            Self::Failure => "/checkout",
            Self::Pending => "/",
        }
    }

    /// Whether the cart should be emptied on this outcome.
    #[must_use]
    pub const fn clears_cart(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "pending" => Ok(Self::Pending),
            _ => Err(()),
        }
    }
}

/// Query parameters on the payment return URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReturn {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub merchant_order_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shipping::{Carrier, quote};

    fn form() -> DeliveryForm {
        DeliveryForm {
            nombre: "Ana".to_owned(),
            apellido: "Pérez".to_owned(),
            telefono: "1155550000".to_owned(),
            codigo_postal: "1425".to_owned(),
            calle: "Av. Santa Fe".to_owned(),
            numero: "1234".to_owned(),
            piso: String::new(),
            depto: String::new(),
            localidad: "CABA".to_owned(),
            provincia: "Buenos Aires".to_owned(),
        }
    }

    #[test]
    fn test_street_line_variants() {
        assert_eq!(form().validate().unwrap().street_line(), "Av. Santa Fe 1234");

        let mut f = form();
        f.piso = "3".to_owned();
        assert_eq!(f.clone().validate().unwrap().street_line(), "Av. Santa Fe 1234, 3");

        f.depto = "B".to_owned();
        assert_eq!(f.clone().validate().unwrap().street_line(), "Av. Santa Fe 1234, 3 B");

        f.piso = String::new();
        assert_eq!(f.validate().unwrap().street_line(), "Av. Santa Fe 1234 B");
    }

    #[test]
    fn test_delivery_requires_fields_and_postal_code() {
        let mut f = form();
        f.localidad = " ".to_owned();
        assert_eq!(
            f.validate().unwrap_err(),
            CheckoutError::Required("localidad")
        );

        let mut f = form();
        f.codigo_postal = "14250".to_owned();
        assert_eq!(
            f.validate().unwrap_err(),
            CheckoutError::Shipping(ShippingError::InvalidPostalCode)
        );
    }

    #[test]
    fn test_contact_rejects_bad_email() {
        assert!(ContactDetails::parse("ana@mail.com", true).unwrap().newsletter);
        assert!(matches!(
            ContactDetails::parse("ana", false),
            Err(CheckoutError::Email(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let contact = ContactDetails::parse("ana@mail.com", false).unwrap();
        let delivery = form().validate().unwrap();
        let option = quote(delivery.postal_code().unwrap())
            .into_iter()
            .find(|o| o.carrier == Carrier::CorreoEstandar)
            .unwrap();
        let request = CheckoutRequest::new(Vec::new(), &contact, &delivery, &option);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["email"], "ana@mail.com");
        assert_eq!(value["shipping"]["name"], "Correo Argentino");
        assert_eq!(value["shipping"]["cost"], serde_json::json!(6900.0));
        assert_eq!(value["shipping"]["address"]["cp"], "1425");
        assert_eq!(value["shipping"]["address"]["calle"], "Av. Santa Fe 1234");
        assert_eq!(value["items"], serde_json::json!([]));
    }

    #[test]
    fn test_redirect_url_by_mode() {
        let response = CheckoutResponse {
            init_point: "https://pay.test/live".to_owned(),
            sandbox_init_point: "https://pay.test/sandbox".to_owned(),
            preference_id: "pref-1".to_owned(),
        };
        assert_eq!(response.redirect_url(true), "https://pay.test/sandbox");
        assert_eq!(response.redirect_url(false), "https://pay.test/live");
    }

    #[test]
    fn test_payment_status_pages() {
        let status: PaymentStatus = "failure".parse().unwrap();
        assert_eq!(status.button_href(), "/checkout");
        assert!(!status.clears_cart());
        assert!(PaymentStatus::Success.clears_cart());
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }
}
