//! Integration tests for payload validation.

use oas_compat::{
    validate, validate_component, Document, SchemaNode, SchemaRegistry, ValidateError,
    ValidateOptions, Validator,
};
use serde_json::{json, Value};

fn node(value: Value) -> SchemaNode {
    SchemaNode::from_value(&value).unwrap()
}

fn petstore() -> Document {
    let value: Value = serde_json::from_str(include_str!("fixtures/petstore-v1.json")).unwrap();
    Document::from_value(&value, "petstore").unwrap()
}

mod combinators {
    use super::*;

    fn shapes() -> Vec<SchemaNode> {
        vec![
            node(json!({
                "type": "object",
                "properties": { "kind": { "enum": ["circle"] }, "radius": { "type": "number" } },
                "required": ["kind", "radius"]
            })),
            node(json!({
                "type": "object",
                "properties": { "kind": { "enum": ["square"] }, "side": { "type": "number" } },
                "required": ["kind", "side"]
            })),
        ]
    }

    #[test]
    fn one_of_matches_exactly_one() {
        let registry = SchemaRegistry::new();
        let mut validator = Validator::new(&registry);

        assert!(validator
            .validate_one_of(&json!({ "kind": "circle", "radius": 2 }), &shapes())
            .is_empty());
        assert!(validator
            .validate_one_of(&json!({ "kind": "square", "side": 2 }), &shapes())
            .is_empty());

        let errors = validator.validate_one_of(&json!({ "kind": "triangle" }), &shapes());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn one_of_reports_ambiguity_with_count() {
        let registry = SchemaRegistry::new();
        let mut validator = Validator::new(&registry);
        let schemas = vec![
            node(json!({ "type": "object", "required": ["a"] })),
            node(json!({ "type": "object", "required": ["b"] })),
        ];

        let errors = validator.validate_one_of(&json!({ "a": 1, "b": 2 }), &schemas);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("ambiguous"));
        assert!(errors[0].message.contains("2 oneOf"));
    }

    #[test]
    fn any_of_short_circuits() {
        let registry = SchemaRegistry::new();
        let mut validator = Validator::new(&registry);
        let schemas = vec![
            node(json!({ "type": "string" })),
            // Would warn if it were ever evaluated.
            node(json!({ "type": "string", "pattern": "(" })),
        ];

        assert!(validator.validate_any_of(&json!("x"), &schemas).is_empty());
        assert!(validator.warnings().is_empty());
    }

    #[test]
    fn all_of_collects_every_member_failure() {
        let registry = SchemaRegistry::new();
        let mut validator = Validator::new(&registry);
        let schemas = vec![
            node(json!({ "type": "object", "properties": { "a": { "type": "string" } } })),
            node(json!({ "type": "object", "required": ["b"] })),
        ];

        let errors = validator.validate_all_of(&json!({ "a": 1 }), &schemas);
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "value does not match allOf schema at index 0",
                "expected string, got number",
                "value does not match allOf schema at index 1",
                "missing required property 'b'",
            ]
        );
    }

    #[test]
    fn nested_composites_dispatch() {
        let registry = SchemaRegistry::new();
        let mut validator = Validator::new(&registry);
        let schema = node(json!({
            "type": "object",
            "properties": {
                "value": { "anyOf": [
                    { "type": "integer" },
                    { "oneOf": [{ "type": "string" }, { "type": "boolean" }] }
                ] }
            }
        }));

        assert!(validator
            .validate_composite_schema(&json!({ "value": true }), &schema)
            .is_empty());
        let errors = validator.validate_composite_schema(&json!({ "value": [] }), &schema);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/value");
    }

    #[test]
    fn nullable_composite_accepts_null() {
        let registry = SchemaRegistry::new();
        let mut validator = Validator::new(&registry);
        let schema = node(json!({
            "oneOf": [{ "type": "string" }, { "type": "integer" }],
            "nullable": true
        }));

        assert!(validator.validate_composite_schema(&Value::Null, &schema).is_empty());
    }
}

mod documents {
    use super::*;

    #[test]
    fn pet_component_validates() {
        let document = petstore();
        let options = ValidateOptions::default();

        let valid = json!({ "id": 1, "name": "Rex" });
        assert!(validate_component(&valid, "Pet", &document, &options).is_ok());

        let invalid = json!({ "id": "one", "name": "" });
        let err = validate_component(&invalid, "Pet", &document, &options).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        let ValidateError::Invalid { errors } = err else {
            panic!("expected validation errors");
        };
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"/name"));
        assert!(paths.contains(&"/id"));
    }

    #[test]
    fn cyclic_component_validates_deep_payloads() {
        let document = petstore();
        let payload = json!({
            "id": 1,
            "name": "Rex",
            "owner": {
                "name": "Ann",
                "pets": [{
                    "id": 2,
                    "name": "Tom",
                    "owner": { "pets": [{ "id": 3, "name": "Kit" }] }
                }]
            }
        });
        let options = ValidateOptions::default();
        assert!(validate_component(&payload, "Pet", &document, &options).is_ok());

        let payload = json!({
            "id": 1,
            "name": "Rex",
            "owner": { "pets": [{
                "id": 2,
                "name": "Tom",
                "owner": { "pets": [{ "id": "x", "name": "Kit" }] }
            }] }
        });
        let Err(ValidateError::Invalid { errors }) =
            validate_component(&payload, "Pet", &document, &options)
        else {
            panic!("expected validation errors");
        };
        assert!(errors.iter().any(|e| e.path == "/owner/pets/0/owner/pets/0/id"));
    }

    #[test]
    fn strict_mode_closes_objects() {
        let document = petstore();
        let payload = json!({ "id": 1, "name": "Rex", "owner": { "name": "Ann", "age": 40 } });

        let options = ValidateOptions::default();
        assert!(validate_component(&payload, "Pet", &document, &options).is_ok());

        let strict = ValidateOptions::new().strict(true);
        let Err(ValidateError::Invalid { errors }) =
            validate_component(&payload, "Pet", &document, &strict)
        else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/owner/age");
    }

    #[test]
    fn unresolvable_reference_is_permissive() {
        let registry = SchemaRegistry::new();
        let schema = node(json!({
            "type": "object",
            "properties": { "ghost": { "$ref": "#/components/schemas/Ghost" } }
        }));

        let options = ValidateOptions::default();
        assert!(validate(&json!({ "ghost": 42 }), &schema, &registry, &options).is_ok());
    }

    #[test]
    fn false_property_rejects_any_value() {
        let registry = SchemaRegistry::new();
        let schema = node(json!({
            "type": "object",
            "properties": { "legacy": false, "name": { "type": "string" } }
        }));
        let options = ValidateOptions::default();

        assert!(validate(&json!({ "name": "Rex" }), &schema, &registry, &options).is_ok());
        let payload = json!({ "name": "Rex", "legacy": "yes" });
        let Err(ValidateError::Invalid { errors }) =
            validate(&payload, &schema, &registry, &options)
        else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/legacy");
    }
}
