//! Newtype IDs for type-safe entity references.
//!
//! The backend identifies products and drops with opaque strings (`"hoodie-01"`,
//! `"drop02"`), so every ID here wraps a `String`. Use the `define_id!` macro to
//! create wrappers that prevent accidentally mixing IDs from different entity
//! types.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use blessed_core::define_id;
/// define_id!(ShirtId);
/// define_id!(StoreId);
///
/// let shirt = ShirtId::new("tee-01");
/// let store = StoreId::new("tee-01");
///
/// // These are different types, so this won't compile:
/// // let _: ShirtId = store;
/// assert_eq!(shirt.as_str(), store.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(DropId);
define_id!(CartLineId);

impl CartLineId {
    /// Generate a fresh, random line identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(12);
        Self(id)
    }
}

impl DropId {
    /// ID the admin form assigns to a new drop with the given display number.
    ///
    /// ```rust
    /// # use blessed_core::DropId;
    /// assert_eq!(DropId::for_number("02").as_str(), "drop02");
    /// ```
    #[must_use]
    pub fn for_number(number: &str) -> Self {
        Self(format!("drop{}", number.trim()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ProductId::new("hoodie-01");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"hoodie-01\"");

        let back: ProductId = serde_json::from_str("\"hoodie-01\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_generated_line_ids_are_unique() {
        let a = CartLineId::generate();
        let b = CartLineId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 12);
    }

    #[test]
    fn test_drop_id_for_number_trims() {
        assert_eq!(DropId::for_number(" 03 ").as_str(), "drop03");
    }
}
