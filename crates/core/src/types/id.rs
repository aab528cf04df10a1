//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. The external POS ME
//! backend issues opaque string identifiers, so the wrappers are
//! string-backed.

/// Macro to define a type-safe ID wrapper around an opaque string.
///
/// Creates a newtype wrapper with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`/`From<&str>` implementations and `Display`
///
/// # Example
///
/// ```rust
/// # use posme_core::define_id;
/// define_id!(MemberId);
/// define_id!(TransactionId);
///
/// let member_id = MemberId::new("m_123");
///
/// // These are different types, so this won't compile:
/// // let _: TransactionId = member_id;
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

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(MemberId);
define_id!(StaffUserId);
define_id!(TransactionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = MemberId::new("m_42");
        assert_eq!(id.as_str(), "m_42");
        assert_eq!(id.to_string(), "m_42");
        assert_eq!(MemberId::from("m_42"), id);
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = StaffUserId::new("s_7");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"s_7\"");

        let back: StaffUserId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
