//! Reference resolution - dereferences `$ref` pointers against a registry.

use std::collections::HashSet;

use crate::registry::SchemaRegistry;
use crate::schema::{
    AdditionalProperties, ArraySchema, CompositeSchema, ObjectSchema, SchemaKind, SchemaNode,
};

/// Return a fully dereferenced copy of `node`.
///
/// Recurses into object properties, array items, additional-properties
/// schemas and combinator members. `visited` holds the pointers already
/// expanded on the current path from the root:
///
/// - a reference to a pointer in `visited` is left in place as a cycle marker;
/// - a reference to a pointer missing from the registry is left in place;
/// - every expansion extends a private copy of `visited`, so sibling branches
///   never see each other's pointers.
///
/// Callers of the result must tolerate residual [`SchemaKind::Ref`] nodes.
pub fn resolve(
    node: &SchemaNode,
    registry: &SchemaRegistry,
    visited: &HashSet<String>,
) -> SchemaNode {
    let kind = match &node.kind {
        SchemaKind::Ref(pointer) => return resolve_ref(node, pointer, registry, visited),
        SchemaKind::Any | SchemaKind::Never | SchemaKind::Scalar(_) => return node.clone(),
        SchemaKind::Array(array) => SchemaKind::Array(resolve_array(array, registry, visited)),
        SchemaKind::Object(object) => {
            SchemaKind::Object(resolve_object(object, registry, visited))
        }
        SchemaKind::Composite(composite) => SchemaKind::Composite(CompositeSchema {
            kind: composite.kind,
            members: composite
                .members
                .iter()
                .map(|member| resolve(member, registry, visited))
                .collect(),
        }),
    };

    SchemaNode {
        kind,
        nullable: node.nullable,
        meta: node.meta.clone(),
    }
}

/// Resolve starting from an empty visited set.
pub fn resolve_root(node: &SchemaNode, registry: &SchemaRegistry) -> SchemaNode {
    resolve(node, registry, &HashSet::new())
}

/// Pointers of every `$ref` node left in a tree, in encounter order.
///
/// After [`resolve`] these are cycle markers and dangling references.
pub fn collect_refs(node: &SchemaNode) -> Vec<String> {
    let mut refs = Vec::new();
    collect_refs_into(node, &mut refs);
    refs
}

// --- Internal implementation ---

fn resolve_ref(
    node: &SchemaNode,
    pointer: &str,
    registry: &SchemaRegistry,
    visited: &HashSet<String>,
) -> SchemaNode {
    if visited.contains(pointer) {
        tracing::debug!(pointer = %pointer, "cycle detected; leaving reference unresolved");
        return node.clone();
    }

    let Some(target) = registry.lookup(pointer) else {
        tracing::debug!(pointer = %pointer, "reference target not registered; passing through");
        return node.clone();
    };

    let mut branch = visited.clone();
    branch.insert(pointer.to_string());
    let mut resolved = resolve(target, registry, &branch);

    // Siblings written next to `$ref` fill gaps in the target.
    if resolved.meta.description.is_none() {
        resolved.meta.description = node.meta.description.clone();
    }
    if !resolved.nullable.is_nullable() && node.nullable.is_nullable() {
        resolved.nullable = node.nullable;
    }
    resolved
}

fn resolve_array(
    array: &ArraySchema,
    registry: &SchemaRegistry,
    visited: &HashSet<String>,
) -> ArraySchema {
    ArraySchema {
        items: array
            .items
            .as_ref()
            .map(|items| Box::new(resolve(items, registry, visited))),
        min_items: array.min_items,
        max_items: array.max_items,
        unique_items: array.unique_items,
    }
}

fn resolve_object(
    object: &ObjectSchema,
    registry: &SchemaRegistry,
    visited: &HashSet<String>,
) -> ObjectSchema {
    let properties = object
        .properties
        .iter()
        .map(|(name, prop)| (name.to_string(), resolve(prop, registry, visited)))
        .collect();

    let additional_properties = match &object.additional_properties {
        Some(AdditionalProperties::Schema(schema)) => Some(AdditionalProperties::Schema(
            Box::new(resolve(schema, registry, visited)),
        )),
        other => other.clone(),
    };

    ObjectSchema {
        properties,
        required: object.required.clone(),
        additional_properties,
        min_properties: object.min_properties,
        max_properties: object.max_properties,
    }
}

fn collect_refs_into(node: &SchemaNode, refs: &mut Vec<String>) {
    match &node.kind {
        SchemaKind::Ref(pointer) => refs.push(pointer.clone()),
        SchemaKind::Any | SchemaKind::Never | SchemaKind::Scalar(_) => {}
        SchemaKind::Array(array) => {
            if let Some(items) = &array.items {
                collect_refs_into(items, refs);
            }
        }
        SchemaKind::Object(object) => {
            for (_, prop) in object.properties.iter() {
                collect_refs_into(prop, refs);
            }
            if let Some(AdditionalProperties::Schema(schema)) = &object.additional_properties {
                collect_refs_into(schema, refs);
            }
        }
        SchemaKind::Composite(composite) => {
            for member in &composite.members {
                collect_refs_into(member, refs);
            }
        }
    }
}
