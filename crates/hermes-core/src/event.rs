//! Combined events and the event merger.
//!
//! [`merge`] overlays validated/transformed field values onto the raw event.
//! The overlay is shallow: a field value replaces the raw key wholesale, it is
//! never merged recursively.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// The event handed to a user handler.
///
/// It is the raw event with every declared field replaced by its
/// transformed (and, for schema fields, validated) value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CombinedEvent {
    fields: Map<String, Value>,
}

impl CombinedEvent {
    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns `true` if the event has `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Deserializes one field as `T`.
    ///
    /// This is where type-contract fields are trusted: a mismatch surfaces as
    /// a deserialization error, which the middleware treats as unexpected.
    ///
    /// # Errors
    ///
    /// Returns an error if the field does not deserialize as `T`. A missing
    /// field is deserialized from `null`.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> serde_json::Result<T> {
        T::deserialize(self.fields.get(key).unwrap_or(&Value::Null))
    }

    /// Deserializes the whole event as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not deserialize as `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&Value::Object(self.fields.clone()))
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the event and returns the underlying map.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Consumes the event and returns it as a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for CombinedEvent {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Overlays `overrides` onto `raw`; override keys win.
///
/// A raw event that is not a JSON object contributes no keys.
#[must_use]
pub fn merge(raw: Value, overrides: Map<String, Value>) -> CombinedEvent {
    let mut fields = match raw {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    fields.extend(overrides);
    CombinedEvent { fields }
}
