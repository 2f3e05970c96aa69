//! Payload validation against schema trees.
//!
//! The [`Validator`] is bound to one registry. Every public entry point
//! resolves `$ref` first; references left in the resolved tree (cycle
//! markers) are looked up lazily as the data is walked, and a reference
//! revisited at the same data path is accepted instead of recursing again.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde_json::Value;

use crate::document::Document;
use crate::error::{SchemaError, ValidateError};
use crate::merge::{apply_strictness, merge};
use crate::registry::SchemaRegistry;
use crate::resolver::resolve_root;
use crate::schema::{
    AdditionalProperties, ArraySchema, CompositeKind, Metadata, ObjectSchema, ScalarSchema,
    SchemaKind, SchemaNode,
};
use crate::types::{json_type_name, pointer_child, ValidateOptions};

/// Validates JSON values against schemas from one registry.
pub struct Validator<'r> {
    registry: &'r SchemaRegistry,
    options: ValidateOptions,
    patterns: HashMap<String, Option<Regex>>,
    warnings: Vec<String>,
    active_refs: HashSet<(String, String)>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self::with_options(registry, ValidateOptions::default())
    }

    pub fn with_options(registry: &'r SchemaRegistry, options: ValidateOptions) -> Self {
        Self {
            registry,
            options,
            patterns: HashMap::new(),
            warnings: Vec::new(),
            active_refs: HashSet::new(),
        }
    }

    /// Non-fatal problems found so far, such as malformed patterns.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Validate `data` against a plain or composite schema.
    ///
    /// Combinators are dispatched wherever they occur in the tree.
    pub fn validate_against_schema(
        &mut self,
        data: &Value,
        schema: &SchemaNode,
    ) -> Vec<SchemaError> {
        let schema = self.prepare(schema);
        let mut errors = Vec::new();
        self.check(data, &schema, "", &mut errors);
        errors
    }

    /// Succeeds iff exactly one schema matches.
    pub fn validate_one_of(&mut self, data: &Value, schemas: &[SchemaNode]) -> Vec<SchemaError> {
        let schemas = self.prepare_all(schemas);
        let mut errors = Vec::new();
        self.check_one_of(data, &schemas, "", &mut errors);
        errors
    }

    /// Succeeds as soon as one schema matches.
    pub fn validate_any_of(&mut self, data: &Value, schemas: &[SchemaNode]) -> Vec<SchemaError> {
        let schemas = self.prepare_all(schemas);
        let mut errors = Vec::new();
        self.check_any_of(data, &schemas, "", &mut errors);
        errors
    }

    /// Every schema must match; all failures are collected.
    pub fn validate_all_of(&mut self, data: &Value, schemas: &[SchemaNode]) -> Vec<SchemaError> {
        let schemas = self.prepare_all(schemas);
        let mut errors = Vec::new();
        self.check_all_of(data, &schemas, "", &mut errors);
        errors
    }

    /// Validate `data` against a schema that may be a combinator.
    ///
    /// [`validate_against_schema`](Self::validate_against_schema) already
    /// dispatches `oneOf`/`anyOf`/`allOf` nodes, so this is the same check
    /// under the name callers holding a composite look for.
    pub fn validate_composite_schema(
        &mut self,
        data: &Value,
        schema: &SchemaNode,
    ) -> Vec<SchemaError> {
        self.validate_against_schema(data, schema)
    }

    // --- Internal implementation ---

    fn prepare(&self, schema: &SchemaNode) -> SchemaNode {
        let resolved = resolve_root(schema, self.registry);
        if self.options.strict {
            apply_strictness(&resolved)
        } else {
            resolved
        }
    }

    fn prepare_all(&self, schemas: &[SchemaNode]) -> Vec<SchemaNode> {
        schemas.iter().map(|s| self.prepare(s)).collect()
    }

    fn check(
        &mut self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        if data.is_null() {
            if schema.accepts_null() {
                return;
            }
            // References, combinators and `false` report on their own.
            let delegated = matches!(
                schema.kind,
                SchemaKind::Ref(_) | SchemaKind::Composite(_) | SchemaKind::Never
            );
            if !delegated {
                errors.push(SchemaError::new(
                    path,
                    format!("expected {}, got null", expected_name(schema)),
                ));
                return;
            }
        }

        let matched = match &schema.kind {
            SchemaKind::Any => true,
            SchemaKind::Never => {
                errors.push(SchemaError::new(path, "no value is allowed here"));
                false
            }
            SchemaKind::Ref(pointer) => {
                self.check_ref(data, pointer, path, errors);
                true
            }
            SchemaKind::Composite(composite)
                if self.options.strict && composite.kind == CompositeKind::AllOf =>
            {
                self.check_strict_all_of(data, schema, path, errors);
                true
            }
            SchemaKind::Composite(composite) => {
                self.check_combinator(data, composite.kind, &composite.members, path, errors);
                true
            }
            SchemaKind::Scalar(scalar) => self.check_scalar(data, scalar, path, errors),
            SchemaKind::Array(array) => self.check_array(data, array, path, errors),
            SchemaKind::Object(object) => self.check_object(data, object, path, errors),
        };

        if matched {
            check_enum(data, &schema.meta, path, errors);
        }
    }

    fn check_ref(
        &mut self,
        data: &Value,
        pointer: &str,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        let Some(target) = self.registry.lookup(pointer) else {
            tracing::debug!(pointer = %pointer, path = %path, "unregistered reference skipped");
            return;
        };

        let key = (pointer.to_string(), path.to_string());
        if !self.active_refs.insert(key.clone()) {
            tracing::debug!(pointer = %pointer, path = %path, "reference revisited in place");
            return;
        }
        let target = self.prepare(target);
        self.check(data, &target, path, errors);
        self.active_refs.remove(&key);
    }

    fn check_combinator(
        &mut self,
        data: &Value,
        kind: CompositeKind,
        members: &[SchemaNode],
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        match kind {
            CompositeKind::OneOf => self.check_one_of(data, members, path, errors),
            CompositeKind::AnyOf => self.check_any_of(data, members, path, errors),
            CompositeKind::AllOf => self.check_all_of(data, members, path, errors),
        }
    }

    fn matches(
        &mut self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
    ) -> Result<(), Vec<SchemaError>> {
        let mut errors = Vec::new();
        self.check(data, schema, path, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_one_of(
        &mut self,
        data: &Value,
        members: &[SchemaNode],
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        let matched = members
            .iter()
            .filter(|member| self.matches(data, member, path).is_ok())
            .count();

        match matched {
            1 => {}
            0 => errors.push(SchemaError::new(
                path,
                format!(
                    "value does not match any of the {} oneOf schemas",
                    members.len()
                ),
            )),
            n => errors.push(SchemaError::new(
                path,
                format!(
                    "value is ambiguous: it matches {} oneOf schemas, expected exactly one",
                    n
                ),
            )),
        }
    }

    fn check_any_of(
        &mut self,
        data: &Value,
        members: &[SchemaNode],
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        for member in members {
            if self.matches(data, member, path).is_ok() {
                return;
            }
        }
        errors.push(SchemaError::new(
            path,
            format!(
                "value does not match any of the {} anyOf schemas checked",
                members.len()
            ),
        ));
    }

    fn check_all_of(
        &mut self,
        data: &Value,
        members: &[SchemaNode],
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        for (i, member) in members.iter().enumerate() {
            if let Err(member_errors) = self.matches(data, member, path) {
                errors.push(SchemaError::new(
                    path,
                    format!("value does not match allOf schema at index {}", i),
                ));
                errors.extend(member_errors);
            }
        }
    }

    /// In strict mode an `allOf` is checked as one merged, closed object, so
    /// members don't reject each other's properties.
    fn check_strict_all_of(
        &mut self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        let resolved = resolve_root(schema, self.registry);
        let merged = merge(std::slice::from_ref(&resolved), self.registry);
        self.check(data, &apply_strictness(&merged), path, errors);

        // oneOf/anyOf members don't survive merging; check them on their own.
        if let SchemaKind::Composite(composite) = &resolved.kind {
            for member in &composite.members {
                let unmerged = matches!(
                    &member.kind,
                    SchemaKind::Composite(inner) if inner.kind != CompositeKind::AllOf
                );
                if unmerged {
                    self.check(data, member, path, errors);
                }
            }
        }
    }

    fn check_scalar(
        &mut self,
        data: &Value,
        scalar: &ScalarSchema,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) -> bool {
        if !scalar.types.is_empty() && !scalar.types.iter().any(|t| t.matches(data)) {
            let expected: Vec<&str> = scalar.types.iter().map(|t| t.as_str()).collect();
            errors.push(SchemaError::new(
                path,
                format!(
                    "expected {}, got {}",
                    expected.join(" or "),
                    json_type_name(data)
                ),
            ));
            return false;
        }

        match data {
            Value::String(text) => self.check_string(text, scalar, path, errors),
            Value::Number(n) => {
                if let Some(value) = n.as_f64() {
                    check_number(value, scalar, path, errors);
                }
            }
            _ => {}
        }
        true
    }

    fn check_string(
        &mut self,
        text: &str,
        scalar: &ScalarSchema,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) {
        let length = text.chars().count() as u64;
        if let Some(min) = scalar.min_length {
            if length < min {
                errors.push(SchemaError::new(
                    path,
                    format!("string is shorter than {} character(s)", min),
                ));
            }
        }
        if let Some(max) = scalar.max_length {
            if length > max {
                errors.push(SchemaError::new(
                    path,
                    format!("string is longer than {} character(s)", max),
                ));
            }
        }
        if let Some(pattern) = &scalar.pattern {
            if let Some(regex) = self.compiled(pattern, path) {
                if !regex.is_match(text) {
                    errors.push(SchemaError::new(
                        path,
                        format!("string does not match pattern \"{}\"", pattern),
                    ));
                }
            }
        }
    }

    /// Compile a pattern once; malformed patterns become warnings.
    fn compiled(&mut self, pattern: &str, path: &str) -> Option<Regex> {
        if let Some(cached) = self.patterns.get(pattern) {
            return cached.clone();
        }
        let compiled = match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(
                    pattern = %pattern,
                    path = %path,
                    error = %e,
                    "skipping malformed pattern"
                );
                self.warnings.push(format!(
                    "{}: malformed pattern \"{}\" skipped: {}",
                    if path.is_empty() { "(root)" } else { path },
                    pattern,
                    e
                ));
                None
            }
        };
        self.patterns.insert(pattern.to_string(), compiled.clone());
        compiled
    }

    fn check_array(
        &mut self,
        data: &Value,
        array: &ArraySchema,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) -> bool {
        let Value::Array(items) = data else {
            errors.push(SchemaError::new(
                path,
                format!("expected array, got {}", json_type_name(data)),
            ));
            return false;
        };

        let count = items.len() as u64;
        if let Some(min) = array.min_items {
            if count < min {
                let message = format!("array has fewer than {} item(s)", min);
                errors.push(SchemaError::new(path, message));
            }
        }
        if let Some(max) = array.max_items {
            if count > max {
                let message = format!("array has more than {} item(s)", max);
                errors.push(SchemaError::new(path, message));
            }
        }
        if array.unique_items {
            let duplicated = items
                .iter()
                .enumerate()
                .any(|(i, item)| items[..i].contains(item));
            if duplicated {
                errors.push(SchemaError::new(path, "array items are not unique"));
            }
        }

        if let Some(item_schema) = &array.items {
            for (i, item) in items.iter().enumerate() {
                let item_path = pointer_child(path, &i.to_string());
                self.check(item, item_schema, &item_path, errors);
            }
        }
        true
    }

    fn check_object(
        &mut self,
        data: &Value,
        object: &ObjectSchema,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) -> bool {
        let Value::Object(map) = data else {
            errors.push(SchemaError::new(
                path,
                format!("expected object, got {}", json_type_name(data)),
            ));
            return false;
        };

        for name in &object.required {
            if !map.contains_key(name) {
                errors.push(SchemaError::new(
                    pointer_child(path, name),
                    format!("missing required property '{}'", name),
                ));
            }
        }

        let count = map.len() as u64;
        if let Some(min) = object.min_properties {
            if count < min {
                let message = format!("object has fewer than {} propertie(s)", min);
                errors.push(SchemaError::new(path, message));
            }
        }
        if let Some(max) = object.max_properties {
            if count > max {
                let message = format!("object has more than {} propertie(s)", max);
                errors.push(SchemaError::new(path, message));
            }
        }

        match &object.additional_properties {
            Some(AdditionalProperties::Deny) => {
                for key in map.keys().filter(|k| !object.properties.contains_key(k)) {
                    errors.push(SchemaError::new(
                        pointer_child(path, key),
                        format!("unexpected property '{}'", key),
                    ));
                }
            }
            Some(AdditionalProperties::Schema(extra)) => {
                let unknown = map.iter().filter(|(k, _)| !object.properties.contains_key(k));
                for (key, value) in unknown {
                    self.check(value, extra, &pointer_child(path, key), errors);
                }
            }
            Some(AdditionalProperties::Allow) | None => {}
        }

        for (name, prop) in object.properties.iter() {
            if let Some(value) = map.get(name) {
                self.check(value, prop, &pointer_child(path, name), errors);
            }
        }
        true
    }
}

/// Validate `data` against `schema`, resolving references from `registry`.
///
/// # Errors
///
/// Returns `ValidateError::Invalid` with every collected error.
pub fn validate(
    data: &Value,
    schema: &SchemaNode,
    registry: &SchemaRegistry,
    options: &ValidateOptions,
) -> Result<(), ValidateError> {
    let mut validator = Validator::with_options(registry, options.clone());
    let errors = validator.validate_composite_schema(data, schema);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

/// Validate `data` against the component schema `name` of `document`.
///
/// # Errors
///
/// Returns `ValidateError::UnknownSchema` if the document has no such
/// component, or `ValidateError::Invalid` if the data doesn't match.
pub fn validate_component(
    data: &Value,
    name: &str,
    document: &Document,
    options: &ValidateOptions,
) -> Result<(), ValidateError> {
    let registry = SchemaRegistry::from_document(document);
    let schema = document.schema(name).ok_or_else(|| ValidateError::UnknownSchema {
        name: name.to_string(),
    })?;
    validate(data, schema, &registry, options)
}

fn expected_name(schema: &SchemaNode) -> String {
    match &schema.kind {
        SchemaKind::Scalar(s) if !s.types.is_empty() => s
            .types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" or "),
        _ => schema.type_name().unwrap_or("non-null value").to_string(),
    }
}

fn check_number(value: f64, scalar: &ScalarSchema, path: &str, errors: &mut Vec<SchemaError>) {
    if let Some(min) = scalar.minimum.as_ref().and_then(|n| n.as_f64()) {
        if scalar.exclusive_minimum && value <= min {
            let message = format!("{} must be greater than {}", value, min);
            errors.push(SchemaError::new(path, message));
        } else if value < min {
            let message = format!("{} is less than the minimum {}", value, min);
            errors.push(SchemaError::new(path, message));
        }
    }
    if let Some(max) = scalar.maximum.as_ref().and_then(|n| n.as_f64()) {
        if scalar.exclusive_maximum && value >= max {
            let message = format!("{} must be less than {}", value, max);
            errors.push(SchemaError::new(path, message));
        } else if value > max {
            let message = format!("{} is greater than the maximum {}", value, max);
            errors.push(SchemaError::new(path, message));
        }
    }
    if let Some(step) = scalar.multiple_of.as_ref().and_then(|n| n.as_f64()) {
        if step > 0.0 {
            let quotient = value / step;
            if (quotient - quotient.round()).abs() > 1e-9 {
                let message = format!("{} is not a multiple of {}", value, step);
                errors.push(SchemaError::new(path, message));
            }
        }
    }
}

fn check_enum(data: &Value, meta: &Metadata, path: &str, errors: &mut Vec<SchemaError>) {
    if let Some(values) = &meta.enum_values {
        if !values.contains(data) {
            errors.push(SchemaError::new(
                path,
                format!("{} is not one of the allowed values", data),
            ));
        }
    }
}
