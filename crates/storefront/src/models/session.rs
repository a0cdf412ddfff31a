//! Session-related types.
//!
//! The visitor's cart and checkout progress are kept in the session; nothing
//! is persisted server-side beyond it.

use blessed_core::checkout::{ContactDetails, DeliveryDetails};
use blessed_core::shipping::{Carrier, ShippingOption};
use blessed_core::wizard::{CheckoutStep, WizardStep};
use serde::{Deserialize, Serialize};

/// Session keys.
pub mod keys {
    /// Key for the visitor's [`blessed_core::Cart`].
    pub const CART: &str = "cart";

    /// Key for [`super::CheckoutProgress`].
    pub const CHECKOUT: &str = "checkout";
}

/// Where the visitor is in the checkout wizard and what they entered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutProgress {
    pub step: CheckoutStep,
    pub contact: Option<ContactDetails>,
    pub delivery: Option<DeliveryDetails>,
    pub carrier: Option<Carrier>,
}

impl CheckoutProgress {
    /// Complete step 1 and move to delivery.
    pub fn set_contact(&mut self, contact: ContactDetails) {
        self.contact = Some(contact);
        self.step = CheckoutStep::Delivery;
    }

    /// Complete step 2 and move to payment.
    pub fn set_delivery(&mut self, delivery: DeliveryDetails, carrier: Carrier) {
        self.delivery = Some(delivery);
        self.carrier = Some(carrier);
        self.step = CheckoutStep::Payment;
    }

    /// Go back exactly one step. Entered data is kept for prefilling.
    pub fn back(&mut self) {
        self.step = self.step.back();
    }

    /// The priced shipping choice, once delivery is complete.
    #[must_use]
    pub fn shipping_option(&self) -> Option<ShippingOption> {
        let postal_code = self.delivery.as_ref()?.postal_code().ok()?;
        let carrier = self.carrier?;
        Some(ShippingOption {
            carrier,
            cost: carrier.cost(postal_code.zone()),
        })
    }

    /// Everything the payment step needs, if the earlier steps are done.
    #[must_use]
    pub fn ready_to_pay(&self) -> Option<(&ContactDetails, &DeliveryDetails, ShippingOption)> {
        match (&self.contact, &self.delivery, self.shipping_option()) {
            (Some(contact), Some(delivery), Some(option)) if self.step == CheckoutStep::Payment => {
                Some((contact, delivery, option))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blessed_core::checkout::DeliveryForm;
    use rust_decimal::Decimal;

    use super::*;

    fn delivery(cp: &str) -> DeliveryDetails {
        DeliveryForm {
            nombre: "Ana".to_string(),
            apellido: "Pérez".to_string(),
            telefono: "1155550000".to_string(),
            codigo_postal: cp.to_string(),
            calle: "Corrientes".to_string(),
            numero: "900".to_string(),
            localidad: "CABA".to_string(),
            provincia: "Buenos Aires".to_string(),
            ..DeliveryForm::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_steps_advance_and_go_back() {
        let mut progress = CheckoutProgress::default();
        assert_eq!(progress.step, CheckoutStep::Contact);

        progress.set_contact(ContactDetails::parse("ana@mail.com", false).unwrap());
        assert_eq!(progress.step, CheckoutStep::Delivery);

        progress.set_delivery(delivery("1043"), Carrier::OcaEstandar);
        assert_eq!(progress.step, CheckoutStep::Payment);
        assert!(progress.ready_to_pay().is_some());

        progress.back();
        assert_eq!(progress.step, CheckoutStep::Delivery);
        assert!(progress.ready_to_pay().is_none());
        assert!(progress.delivery.is_some());
    }

    #[test]
    fn test_shipping_option_priced_by_zone() {
        let mut progress = CheckoutProgress::default();
        progress.set_delivery(delivery("5000"), Carrier::CorreoEstandar);
        let option = progress.shipping_option().unwrap();
        assert_eq!(option.cost, Decimal::from(11_900));
        assert_eq!(option.name(), "Correo Argentino");
    }
}
