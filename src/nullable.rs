//! Nullable dialect normalization.
//!
//! | Input marker          | `Flag` dialect    | `Union` dialect          |
//! |-----------------------|-------------------|--------------------------|
//! | `nullable: true`      | kept              | `type: [<base>, "null"]` |
//! | `x-nullable: true`    | `nullable: true`  | `type: [<base>, "null"]` |
//! | `type: [<base>, "null"]` | `nullable: true`, type `<base>` | kept     |
//!
//! Nodes without a type name (`$ref`, combinators, untyped schemas) cannot
//! carry `"null"` in a type array, so they keep the flag in both dialects.

use crate::registry::SchemaRegistry;
use crate::schema::{
    AdditionalProperties, ArraySchema, CompositeSchema, Nullable, ObjectSchema, ScalarSchema,
    ScalarType, SchemaKind, SchemaNode,
};
use crate::types::NullableDialect;

/// Return a copy of `node` with every nullable marker in `dialect` form.
pub fn normalize(node: &SchemaNode, dialect: NullableDialect) -> SchemaNode {
    let kind = match &node.kind {
        SchemaKind::Any | SchemaKind::Never | SchemaKind::Ref(_) => node.kind.clone(),
        SchemaKind::Scalar(scalar) => {
            SchemaKind::Scalar(normalize_scalar(scalar, node.nullable, dialect))
        }
        SchemaKind::Array(array) => SchemaKind::Array(ArraySchema {
            items: array
                .items
                .as_ref()
                .map(|items| Box::new(normalize(items, dialect))),
            min_items: array.min_items,
            max_items: array.max_items,
            unique_items: array.unique_items,
        }),
        SchemaKind::Object(object) => SchemaKind::Object(normalize_object(object, dialect)),
        SchemaKind::Composite(composite) => SchemaKind::Composite(CompositeSchema {
            kind: composite.kind,
            members: composite
                .members
                .iter()
                .map(|member| normalize(member, dialect))
                .collect(),
        }),
    };

    let nullable = convert_marker(&kind, node.nullable, dialect);
    SchemaNode {
        kind,
        nullable,
        meta: node.meta.clone(),
    }
}

/// Normalize every definition of a registry into a new registry.
pub fn normalize_registry(registry: &SchemaRegistry, dialect: NullableDialect) -> SchemaRegistry {
    let mut normalized = SchemaRegistry::new();
    for (pointer, node) in registry.iter() {
        normalized.register(pointer, normalize(node, dialect));
    }
    normalized
}

fn has_type_name(kind: &SchemaKind) -> bool {
    matches!(
        kind,
        SchemaKind::Scalar(_) | SchemaKind::Array(_) | SchemaKind::Object(_)
    )
}

fn convert_marker(kind: &SchemaKind, marker: Nullable, dialect: NullableDialect) -> Nullable {
    if !marker.is_nullable() {
        return Nullable::Absent;
    }
    // A null scalar already admits null.
    if let SchemaKind::Scalar(s) = kind {
        if s.types.contains(&ScalarType::Null) {
            return Nullable::Absent;
        }
    }
    match dialect {
        NullableDialect::Union if has_type_name(kind) => Nullable::TypeArray,
        NullableDialect::Union | NullableDialect::Flag => Nullable::Flag,
    }
}

fn normalize_scalar(
    scalar: &ScalarSchema,
    marker: Nullable,
    dialect: NullableDialect,
) -> ScalarSchema {
    let mut scalar = scalar.clone();
    if dialect == NullableDialect::Flag && marker == Nullable::TypeArray && scalar.types.len() > 1
    {
        tracing::debug!(
            types = ?scalar.types.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            "type union has several non-null members; keeping the first as base type"
        );
        scalar.types.truncate(1);
    }
    scalar
}

fn normalize_object(object: &ObjectSchema, dialect: NullableDialect) -> ObjectSchema {
    ObjectSchema {
        properties: object
            .properties
            .iter()
            .map(|(name, prop)| (name.to_string(), normalize(prop, dialect)))
            .collect(),
        required: object.required.clone(),
        additional_properties: match &object.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(AdditionalProperties::Schema(
                Box::new(normalize(schema, dialect)),
            )),
            other => other.clone(),
        },
        min_properties: object.min_properties,
        max_properties: object.max_properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn node(value: Value) -> SchemaNode {
        SchemaNode::from_value(&value).unwrap()
    }

    fn to_union(value: Value) -> Value {
        normalize(&node(value), NullableDialect::Union).to_value()
    }

    fn to_flag(value: Value) -> Value {
        normalize(&node(value), NullableDialect::Flag).to_value()
    }

    #[test]
    fn flag_to_union_wraps_type() {
        assert_eq!(
            to_union(json!({ "type": "string", "nullable": true })),
            json!({ "type": ["string", "null"] })
        );
    }

    #[test]
    fn union_to_flag_strips_null() {
        assert_eq!(
            to_flag(json!({ "type": ["integer", "null"], "format": "int32" })),
            json!({ "type": "integer", "format": "int32", "nullable": true })
        );
    }

    #[test]
    fn union_to_flag_keeps_first_non_null_member() {
        assert_eq!(
            to_flag(json!({ "type": ["null", "string", "integer"] })),
            json!({ "type": "string", "nullable": true })
        );
    }

    #[test]
    fn legacy_marker_is_an_alias() {
        assert_eq!(
            to_union(json!({ "type": "string", "x-nullable": true })),
            json!({ "type": ["string", "null"] })
        );
        assert_eq!(
            to_flag(json!({ "type": "string", "x-nullable": true })),
            json!({ "type": "string", "nullable": true })
        );
    }

    #[test]
    fn non_nullable_nodes_are_untouched() {
        let value = json!({ "type": "string", "minLength": 1 });
        assert_eq!(to_union(value.clone()), value);
        assert_eq!(to_flag(value.clone()), value);
    }

    #[test]
    fn recurses_into_every_child() {
        let value = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "nullable": true },
                "tags": { "type": "array", "items": { "type": "string", "x-nullable": true } },
                "meta": {
                    "type": "object",
                    "additionalProperties": { "type": "number", "nullable": true }
                },
                "either": {
                    "oneOf": [{ "type": "integer", "nullable": true }, { "type": "boolean" }]
                },
                "retired": false
            }
        });
        let out = to_union(value);
        let props = &out["properties"];
        assert_eq!(props["name"]["type"], json!(["string", "null"]));
        assert_eq!(props["tags"]["items"]["type"], json!(["string", "null"]));
        assert_eq!(
            props["meta"]["additionalProperties"]["type"],
            json!(["number", "null"])
        );
        assert_eq!(props["either"]["oneOf"][0]["type"], json!(["integer", "null"]));
        assert_eq!(props["either"]["oneOf"][1]["type"], json!("boolean"));
        assert_eq!(props["retired"], json!(false));
    }

    #[test]
    fn untyped_nodes_keep_the_flag() {
        assert_eq!(
            to_union(json!({ "$ref": "#/components/schemas/Pet", "x-nullable": true })),
            json!({ "$ref": "#/components/schemas/Pet", "nullable": true })
        );
    }

    #[test]
    fn round_trip_preserves_flag_and_base_type() {
        for value in [
            json!({ "type": "string", "nullable": true }),
            json!({ "type": "integer" }),
            json!({ "type": "object", "nullable": true }),
            json!({ "type": "array", "items": { "type": "boolean" }, "x-nullable": true }),
        ] {
            let original = node(value);
            let round = normalize(
                &normalize(&original, NullableDialect::Union),
                NullableDialect::Flag,
            );
            assert_eq!(
                round.nullable.is_nullable(),
                original.nullable.is_nullable()
            );
            assert_eq!(round.type_name(), original.type_name());
        }
    }

    #[test]
    fn registry_is_normalized_into_a_copy() {
        let mut registry = SchemaRegistry::new();
        registry.register(
            "#/components/schemas/Name",
            node(json!({ "type": "string", "nullable": true })),
        );

        let union = normalize_registry(&registry, NullableDialect::Union);
        assert_eq!(
            union.lookup("#/components/schemas/Name").map(|n| n.nullable),
            Some(Nullable::TypeArray)
        );
        assert_eq!(
            registry.lookup("#/components/schemas/Name").map(|n| n.nullable),
            Some(Nullable::Flag)
        );
    }
}
