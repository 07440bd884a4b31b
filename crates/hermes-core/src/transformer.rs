//! Field transformers.
//!
//! A transformer extracts or derives the value of one declared field from the
//! raw event (and, optionally, the invocation context). Fields without a
//! registered transformer read the raw event's same-named property.

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Extraction function for one field.
pub type Transformer<C> = Arc<dyn Fn(&Value, Option<&C>) -> anyhow::Result<Value> + Send + Sync>;

/// Returns a transformer reading `name` from the raw event.
///
/// A missing property (or a raw event that is not an object) yields `null`.
pub fn property<C: 'static>(name: impl Into<String>) -> Transformer<C> {
    let name = name.into();
    Arc::new(move |event: &Value, _context: Option<&C>| {
        Ok(event.get(&name).cloned().unwrap_or(Value::Null))
    })
}

/// Maps field names to transformers, in registration order.
pub struct TransformerRegistry<C> {
    transformers: IndexMap<String, Transformer<C>>,
}

impl<C> Default for TransformerRegistry<C> {
    fn default() -> Self {
        Self {
            transformers: IndexMap::new(),
        }
    }
}

impl<C> Clone for TransformerRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            transformers: self.transformers.clone(),
        }
    }
}

impl<C> std::fmt::Debug for TransformerRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("fields", &self.transformers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C: 'static> TransformerRegistry<C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transformer, replacing any previous one for `name`.
    pub fn insert<F>(&mut self, name: impl Into<String>, transformer: F)
    where
        F: Fn(&Value, Option<&C>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.transformers.insert(name.into(), Arc::new(transformer));
    }

    /// Registers a transformer only if none exists for `name`.
    ///
    /// Adapters use this to install their defaults underneath user overrides.
    pub fn insert_default<F>(&mut self, name: impl Into<String>, transformer: F)
    where
        F: Fn(&Value, Option<&C>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.transformers
            .entry(name.into())
            .or_insert_with(|| Arc::new(transformer));
    }

    /// Returns the transformer for `name`, defaulting to property access.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Transformer<C> {
        self.transformers
            .get(name)
            .cloned()
            .unwrap_or_else(|| property(name))
    }

    /// Returns `true` if a transformer is registered for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }

    /// Returns the registered field names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transformers.keys().map(String::as_str)
    }

    /// Returns the number of registered transformers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    /// Returns `true` if no transformer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_reads_same_named_key() {
        let transformer = property::<()>("body");
        let value = transformer(&json!({ "body": { "a": 1 } }), None).unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }

    #[test]
    fn test_property_missing_is_null() {
        let transformer = property::<()>("query");
        assert_eq!(transformer(&json!({}), None).unwrap(), Value::Null);
        assert_eq!(transformer(&json!("text"), None).unwrap(), Value::Null);
    }

    #[test]
    fn test_resolve_prefers_registered() {
        let mut registry = TransformerRegistry::<()>::new();
        registry.insert("id", |event: &Value, _: Option<&()>| {
            Ok(json!(event["rawId"].as_str().unwrap_or_default().to_uppercase()))
        });

        let event = json!({ "rawId": "usr_1", "id": "ignored" });
        assert_eq!(registry.resolve("id")(&event, None).unwrap(), json!("USR_1"));
        assert_eq!(registry.resolve("rawId")(&event, None).unwrap(), json!("usr_1"));
    }

    #[test]
    fn test_insert_default_keeps_existing() {
        let mut registry = TransformerRegistry::<()>::new();
        registry.insert("body", |_: &Value, _: Option<&()>| Ok(json!("user")));
        registry.insert_default("body", |_: &Value, _: Option<&()>| Ok(json!("default")));
        registry.insert_default("headers", |_: &Value, _: Option<&()>| Ok(json!({})));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("body")(&json!({}), None).unwrap(), json!("user"));
        assert!(registry.contains("headers"));
    }

    #[test]
    fn test_names_follow_registration_order() {
        let mut registry = TransformerRegistry::<()>::new();
        for name in ["zeta", "alpha", "mid", "beta"] {
            registry.insert(name, |_: &Value, _: Option<&()>| Ok(Value::Null));
        }
        registry.insert_default("alpha", |_: &Value, _: Option<&()>| Ok(json!(1)));

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["zeta", "alpha", "mid", "beta"]);
    }

    #[test]
    fn test_transformer_uses_context() {
        struct Ctx {
            env: &'static str,
        }

        let mut registry = TransformerRegistry::<Ctx>::new();
        registry.insert("env", |_: &Value, ctx: Option<&Ctx>| {
            Ok(json!(ctx.map(|c| c.env)))
        });

        let ctx = Ctx { env: "production" };
        let value = registry.resolve("env")(&json!({}), Some(&ctx)).unwrap();
        assert_eq!(value, json!("production"));
    }
}
