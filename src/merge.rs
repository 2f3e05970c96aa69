//! Schema merging - `allOf` semantics and strictness overrides.
//!
//! Precedence is deliberately asymmetric:
//!
//! | Field                  | Rule                                   |
//! |------------------------|----------------------------------------|
//! | type (and its shape)   | first schema with a type wins          |
//! | `properties`           | union by name, later schema wins       |
//! | `required`             | set union                              |
//! | `additionalProperties` | first schema that defines it wins      |
//! | `description`          | first non-empty description wins       |
//! | other metadata         | first defined value wins               |
//! | nullability            | first nullable marker wins             |
//!
//! A `false` member makes the whole merge accept nothing.

use crate::registry::SchemaRegistry;
use crate::resolver::resolve_root;
use crate::schema::{
    AdditionalProperties, ArraySchema, CompositeKind, CompositeSchema, Metadata, Nullable,
    ObjectSchema, Properties, SchemaKind, SchemaNode,
};

/// Merge an ordered list of schemas into one effective schema.
///
/// Members are resolved against `registry` first. Nested `allOf` members are
/// flattened in place; `oneOf`/`anyOf` members and unresolved references
/// contribute nothing.
pub fn merge(schemas: &[SchemaNode], registry: &SchemaRegistry) -> SchemaNode {
    let resolved: Vec<SchemaNode> = schemas
        .iter()
        .map(|schema| resolve_root(schema, registry))
        .collect();
    merge_resolved(&resolved)
}

/// Replace every `allOf` in an already resolved tree with its merged schema.
///
/// Used before structural comparison, where an `allOf` should look like the
/// object it describes. Residual references are not followed.
pub fn flatten_all_of(node: &SchemaNode) -> SchemaNode {
    let node = match &node.kind {
        SchemaKind::Composite(c) if c.kind == CompositeKind::AllOf => {
            merge_resolved(std::slice::from_ref(node))
        }
        _ => node.clone(),
    };
    map_children(&node, &flatten_all_of)
}

/// Apply the global strict override: every object schema that does not
/// restrict additional properties gets `additionalProperties: false`.
///
/// Explicit `false` and custom additional-properties schemas are kept.
pub fn apply_strictness(node: &SchemaNode) -> SchemaNode {
    let node = map_children(node, &apply_strictness);
    let open = matches!(
        &node.kind,
        SchemaKind::Object(object)
            if matches!(object.additional_properties, None | Some(AdditionalProperties::Allow))
    );
    if !open {
        return node;
    }
    let overlay = SchemaNode::object(ObjectSchema {
        additional_properties: Some(AdditionalProperties::Deny),
        ..ObjectSchema::default()
    });
    merge_parts(&[overlay, node])
}

// --- Internal implementation ---

fn merge_resolved(schemas: &[SchemaNode]) -> SchemaNode {
    let mut parts = Vec::new();
    for schema in schemas {
        flatten_into(schema.clone(), &mut parts);
    }
    merge_parts(&parts)
}

fn flatten_into(node: SchemaNode, parts: &mut Vec<SchemaNode>) {
    match node.kind {
        SchemaKind::Composite(CompositeSchema {
            kind: CompositeKind::AllOf,
            members,
        }) => {
            // The wrapper's own metadata comes before its members'.
            parts.push(SchemaNode {
                kind: SchemaKind::Any,
                nullable: node.nullable,
                meta: node.meta,
            });
            for member in members {
                flatten_into(member, parts);
            }
        }
        SchemaKind::Composite(composite) => {
            tracing::debug!(
                combinator = composite.kind.keyword(),
                "skipping non-mergeable combinator in allOf"
            );
        }
        SchemaKind::Ref(pointer) => {
            tracing::debug!(pointer = %pointer, "skipping unresolved reference in allOf");
        }
        _ => parts.push(node),
    }
}

fn merge_parts(parts: &[SchemaNode]) -> SchemaNode {
    let mut typed: Option<&SchemaNode> = None;
    let mut properties = Properties::new();
    let mut required: Vec<String> = Vec::new();
    let mut additional_properties: Option<AdditionalProperties> = None;
    let mut min_properties = None;
    let mut max_properties = None;
    let mut has_object_part = false;
    let mut unsatisfiable = false;
    let mut nullable = Nullable::Absent;
    let mut meta = Metadata::default();

    for part in parts {
        unsatisfiable |= matches!(part.kind, SchemaKind::Never);
        if typed.is_none() && part.type_name().is_some() {
            typed = Some(part);
        }

        if let SchemaKind::Object(object) = &part.kind {
            has_object_part = true;
            for (name, prop) in object.properties.iter() {
                properties.insert(name, prop.clone());
            }
            for name in &object.required {
                if !required.contains(name) {
                    required.push(name.clone());
                }
            }
            if additional_properties.is_none() {
                additional_properties = object.additional_properties.clone();
            }
            min_properties = min_properties.or(object.min_properties);
            max_properties = max_properties.or(object.max_properties);
        }

        if !nullable.is_nullable() && part.nullable.is_nullable() {
            nullable = part.nullable;
        }
        merge_metadata(&mut meta, &part.meta);
    }

    let kind = match typed.map(|t| &t.kind) {
        _ if unsatisfiable => SchemaKind::Never,
        Some(SchemaKind::Scalar(scalar)) => SchemaKind::Scalar(scalar.clone()),
        Some(SchemaKind::Array(array)) => SchemaKind::Array(ArraySchema {
            items: array.items.clone(),
            min_items: array.min_items,
            max_items: array.max_items,
            unique_items: array.unique_items,
        }),
        Some(SchemaKind::Object(_)) | None if has_object_part => SchemaKind::Object(ObjectSchema {
            properties,
            required,
            additional_properties,
            min_properties,
            max_properties,
        }),
        _ => SchemaKind::Any,
    };

    SchemaNode {
        kind,
        nullable,
        meta,
    }
}

fn merge_metadata(into: &mut Metadata, from: &Metadata) {
    if into.title.is_none() {
        into.title = from.title.clone();
    }
    let has_description = into
        .description
        .as_deref()
        .map(|d| !d.is_empty())
        .unwrap_or(false);
    if !has_description {
        if let Some(description) = from.description.as_deref().filter(|d| !d.is_empty()) {
            into.description = Some(description.to_string());
        }
    }
    if into.default.is_none() {
        into.default = from.default.clone();
    }
    if into.enum_values.is_none() {
        into.enum_values = from.enum_values.clone();
    }
    if into.example.is_none() {
        into.example = from.example.clone();
    }
    into.deprecated |= from.deprecated;
}

/// Rebuild a node with `f` applied to each direct child schema.
fn map_children(node: &SchemaNode, f: &dyn Fn(&SchemaNode) -> SchemaNode) -> SchemaNode {
    let kind = match &node.kind {
        SchemaKind::Any | SchemaKind::Never | SchemaKind::Scalar(_) | SchemaKind::Ref(_) => {
            node.kind.clone()
        }
        SchemaKind::Array(array) => SchemaKind::Array(ArraySchema {
            items: array.items.as_ref().map(|items| Box::new(f(items))),
            min_items: array.min_items,
            max_items: array.max_items,
            unique_items: array.unique_items,
        }),
        SchemaKind::Object(object) => SchemaKind::Object(ObjectSchema {
            properties: object
                .properties
                .iter()
                .map(|(name, prop)| (name.to_string(), f(prop)))
                .collect(),
            required: object.required.clone(),
            additional_properties: match &object.additional_properties {
                Some(AdditionalProperties::Schema(schema)) => {
                    Some(AdditionalProperties::Schema(Box::new(f(schema))))
                }
                other => other.clone(),
            },
            min_properties: object.min_properties,
            max_properties: object.max_properties,
        }),
        SchemaKind::Composite(composite) => SchemaKind::Composite(CompositeSchema {
            kind: composite.kind,
            members: composite.members.iter().map(f).collect(),
        }),
    };
    SchemaNode {
        kind,
        nullable: node.nullable,
        meta: node.meta.clone(),
    }
}
