//! Linear multi-step form flows.
//!
//! Both the checkout and the admin product upload are short wizards: each
//! step moves forward on a valid submit and back exactly one step on request.

use serde::{Deserialize, Serialize};

/// A step in a linear wizard.
pub trait WizardStep: Copy + Eq + Sized + 'static {
    /// Every step, in order.
    const STEPS: &'static [Self];

    /// Label shown in the progress indicator.
    fn label(self) -> &'static str;

    /// Zero-based position.
    fn index(self) -> usize {
        Self::STEPS.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// The following step, if any.
    fn next(self) -> Option<Self> {
        Self::STEPS.get(self.index() + 1).copied()
    }

    /// The preceding step, if any.
    fn previous(self) -> Option<Self> {
        self.index()
            .checked_sub(1)
            .and_then(|i| Self::STEPS.get(i).copied())
    }

    /// Whether this step is already behind `current`.
    fn is_completed(self, current: Self) -> bool {
        self.index() < current.index()
    }

    /// Step one back from here, staying put on the first step.
    fn back(self) -> Self {
        self.previous().unwrap_or(self)
    }
}

/// Progress-bar entry for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    pub number: usize,
    pub label: &'static str,
    pub active: bool,
    pub completed: bool,
}

/// Render-ready progress entries for the wizard at `current`.
#[must_use]
pub fn indicators<S: WizardStep>(current: S) -> Vec<StepIndicator> {
    S::STEPS
        .iter()
        .map(|&step| StepIndicator {
            number: step.index() + 1,
            label: step.label(),
            active: step == current,
            completed: step.is_completed(current),
        })
        .collect()
}

/// Checkout steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Contact,
    Delivery,
    Payment,
}

impl WizardStep for CheckoutStep {
    const STEPS: &'static [Self] = &[Self::Contact, Self::Delivery, Self::Payment];

    fn label(self) -> &'static str {
        match self {
            Self::Contact => "Carrito",
            Self::Delivery => "Entrega",
            Self::Payment => "Pago",
        }
    }
}

/// Admin product upload steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStep {
    #[default]
    Details,
    Images,
    Review,
}

impl WizardStep for UploadStep {
    const STEPS: &'static [Self] = &[Self::Details, Self::Images, Self::Review];

    fn label(self) -> &'static str {
        match self {
            Self::Details => "Datos",
            Self::Images => "Fotos",
            Self::Review => "Revisión",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_steps_advance_linearly() {
        assert_eq!(CheckoutStep::Contact.next(), Some(CheckoutStep::Delivery));
        assert_eq!(CheckoutStep::Delivery.next(), Some(CheckoutStep::Payment));
        assert_eq!(CheckoutStep::Payment.next(), None);
    }

    #[test]
    fn test_back_goes_one_step_and_stops_at_first() {
        assert_eq!(CheckoutStep::Payment.back(), CheckoutStep::Delivery);
        assert_eq!(CheckoutStep::Delivery.back(), CheckoutStep::Contact);
        assert_eq!(CheckoutStep::Contact.back(), CheckoutStep::Contact);
    }

    #[test]
    fn test_is_completed() {
        let current = CheckoutStep::Payment;
        assert!(CheckoutStep::Contact.is_completed(current));
        assert!(CheckoutStep::Delivery.is_completed(current));
        assert!(!CheckoutStep::Payment.is_completed(current));
        assert!(!CheckoutStep::Delivery.is_completed(CheckoutStep::Contact));
    }

    #[test]
    fn test_indicators() {
        let steps = indicators(UploadStep::Images);
        assert_eq!(steps.len(), 3);
        assert!(steps.first().is_some_and(|s| s.completed && !s.active));
        assert!(steps.get(1).is_some_and(|s| s.active && s.number == 2));
        assert!(steps.last().is_some_and(|s| !s.completed && s.label == "Revisión"));
    }
}
