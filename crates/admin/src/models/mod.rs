//! Form and session-held models for admin.

pub mod drop_form;
pub mod product_form;
pub mod session;

pub use drop_form::DropForm;
pub use product_form::ProductForm;
pub use session::{CurrentAdmin, Flash, FlashKind, ProductDraft, keys as session_keys};
