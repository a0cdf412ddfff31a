//! Session-held models for the storefront.

pub mod session;

pub use session::{CheckoutProgress, keys as session_keys};
