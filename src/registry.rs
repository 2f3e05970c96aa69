//! Session-scoped schema registry.
//!
//! A registry maps reference pointers (`#/components/schemas/Pet`) to schema
//! definitions. It is an ordinary value owned by the caller and passed to
//! every resolver, merger and validator call. Create one per document; call
//! [`SchemaRegistry::reset`] before reusing it for an unrelated document,
//! otherwise definitions from the previous session stay visible.

use std::collections::HashMap;

use crate::document::{Components, Document};
use crate::schema::SchemaNode;
use crate::types::COMPONENT_SCHEMA_PREFIX;

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: HashMap<String, SchemaNode>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from a document's component schemas.
    pub fn from_document(document: &Document) -> Self {
        let mut registry = Self::new();
        registry.register_all(&document.components);
        registry
    }

    /// Pointer under which a component schema is registered.
    pub fn pointer_for(name: &str) -> String {
        format!("{}{}", COMPONENT_SCHEMA_PREFIX, name)
    }

    /// Register a definition, overwriting any previous one.
    ///
    /// Returns the definition that was replaced.
    pub fn register(&mut self, pointer: impl Into<String>, node: SchemaNode) -> Option<SchemaNode> {
        let pointer = pointer.into();
        let previous = self.entries.insert(pointer.clone(), node);
        if previous.is_some() {
            tracing::debug!(pointer = %pointer, "overwrote registered schema");
        }
        previous
    }

    pub fn lookup(&self, pointer: &str) -> Option<&SchemaNode> {
        self.entries.get(pointer)
    }

    pub fn contains(&self, pointer: &str) -> bool {
        self.entries.contains_key(pointer)
    }

    /// Register every component schema under `#/components/schemas/<name>`.
    pub fn register_all(&mut self, components: &Components) {
        for (name, node) in &components.schemas {
            self.register(Self::pointer_for(name), node.clone());
        }
        tracing::debug!(
            count = components.schemas.len(),
            total = self.entries.len(),
            "registered component schemas"
        );
    }

    /// Drop every definition.
    pub fn reset(&mut self) {
        tracing::debug!(count = self.entries.len(), "resetting schema registry");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered definitions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Registered pointers, sorted.
    pub fn pointers(&self) -> Vec<&str> {
        let mut pointers: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        pointers.sort_unstable();
        pointers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;
    use serde_json::json;

    fn document(schemas: serde_json::Value) -> Document {
        Document::from_value(&json!({ "components": { "schemas": schemas } }), "doc").unwrap()
    }

    #[test]
    fn register_all_derives_component_pointers() {
        let doc = document(json!({
            "Pet": { "type": "object" },
            "Owner": { "type": "string" }
        }));
        let registry = SchemaRegistry::from_document(&doc);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.pointers(),
            vec!["#/components/schemas/Owner", "#/components/schemas/Pet"]
        );
        assert_eq!(
            registry
                .lookup("#/components/schemas/Pet")
                .and_then(|s| s.type_name()),
            Some("object")
        );
    }

    #[test]
    fn register_overwrites() {
        let mut registry = SchemaRegistry::new();
        assert!(registry
            .register("#/a", SchemaNode::scalar(ScalarType::String))
            .is_none());
        let previous = registry.register("#/a", SchemaNode::scalar(ScalarType::Integer));

        assert_eq!(previous.and_then(|p| p.type_name()), Some("string"));
        assert_eq!(
            registry.lookup("#/a").and_then(|s| s.type_name()),
            Some("integer")
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_missing_is_none() {
        let registry = SchemaRegistry::new();
        assert!(registry.lookup("#/components/schemas/Nope").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_definitions_leak_without_reset() {
        let mut registry = SchemaRegistry::new();
        registry.register_all(&document(json!({ "Legacy": { "type": "string" } })).components);
        registry.register_all(&document(json!({ "Current": { "type": "integer" } })).components);

        // The first session's definition is still visible.
        assert!(registry.contains("#/components/schemas/Legacy"));

        registry.reset();
        registry.register_all(&document(json!({ "Current": { "type": "integer" } })).components);
        assert!(!registry.contains("#/components/schemas/Legacy"));
        assert!(registry.contains("#/components/schemas/Current"));
    }
}
