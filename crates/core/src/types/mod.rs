//! Core value types.
//!
//! Type-safe wrappers for identifiers, prices and email addresses.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{INSTALLMENTS, Price, discount_percent, format_price, installment_amount, installment_hint};
