//! Field descriptors.
//!
//! A [`FieldDescriptor`] declares what one named slot of an event is expected
//! to hold. It is chosen once at configuration time and never re-inspected per
//! request:
//!
//! | Descriptor | Runtime check |
//! |------------|---------------|
//! | [`FieldDescriptor::type_contract`] | none, the value is trusted |
//! | [`FieldDescriptor::from_constructor`] | none, the value is trusted |
//! | [`FieldDescriptor::from_schema`] | compiled JSON Schema |
//!
//! Contract and constructor fields are resolved by the handler when it reads
//! them through [`CombinedEvent::field`](crate::CombinedEvent::field).

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::type_name;

/// A declared expectation for one event field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    /// Compile-time contract; the value passes through unchecked.
    TypeContract {
        /// Name of the asserted type, for diagnostics.
        type_name: &'static str,
    },
    /// A constructible type; the value passes through unchecked and is
    /// built by the handler.
    Constructor {
        /// Name of the constructible type, for diagnostics.
        type_name: &'static str,
    },
    /// A declarative JSON Schema compiled once into a validator.
    Schema(Value),
}

impl FieldDescriptor {
    /// Declares a zero-cost type contract for `T`.
    #[must_use]
    pub fn type_contract<T: ?Sized>() -> Self {
        Self::TypeContract {
            type_name: type_name::<T>(),
        }
    }

    /// Declares a field that the handler constructs as `T`.
    #[must_use]
    pub fn from_constructor<T: DeserializeOwned>() -> Self {
        Self::Constructor {
            type_name: type_name::<T>(),
        }
    }

    /// Declares a field validated against `schema`.
    #[must_use]
    pub fn from_schema(schema: Value) -> Self {
        Self::Schema(schema)
    }

    /// Returns the schema to compile, or `None` for static contracts.
    #[must_use]
    pub fn schema(&self) -> Option<&Value> {
        match self {
            Self::Schema(schema) => Some(schema),
            Self::TypeContract { .. } | Self::Constructor { .. } => None,
        }
    }

    /// Returns `true` if values for this field are checked at runtime.
    #[must_use]
    pub fn requires_runtime_check(&self) -> bool {
        self.schema().is_some()
    }

    /// Returns a short name for the descriptor kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TypeContract { .. } => "type_contract",
            Self::Constructor { .. } => "constructor",
            Self::Schema(_) => "schema",
        }
    }
}

impl From<Value> for FieldDescriptor {
    fn from(schema: Value) -> Self {
        Self::Schema(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct User {
        #[allow(dead_code)]
        name: String,
    }

    #[test]
    fn test_type_contract_has_no_schema() {
        let descriptor = FieldDescriptor::type_contract::<User>();
        assert!(descriptor.schema().is_none());
        assert!(!descriptor.requires_runtime_check());
        assert_eq!(descriptor.kind(), "type_contract");
        match descriptor {
            FieldDescriptor::TypeContract { type_name } => assert!(type_name.ends_with("User")),
            other => panic!("unexpected descriptor: {other:?}"),
        }
    }

    #[test]
    fn test_constructor_has_no_schema() {
        let descriptor = FieldDescriptor::from_constructor::<User>();
        assert!(!descriptor.requires_runtime_check());
        assert_eq!(descriptor.kind(), "constructor");
    }

    #[test]
    fn test_schema_descriptor() {
        let schema = json!({ "type": "string" });
        let descriptor = FieldDescriptor::from(schema.clone());
        assert_eq!(descriptor.schema(), Some(&schema));
        assert!(descriptor.requires_runtime_check());
        assert_eq!(descriptor.kind(), "schema");
    }
}
