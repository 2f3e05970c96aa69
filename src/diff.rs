//! Structural comparison of two OpenAPI documents.
//!
//! Paths are visited in sorted order and methods in canonical order, so the
//! same pair of documents always yields the same entries in the same order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{
    Document, Operation, Parameter, ParameterLocation, PathItem, RequestBody,
};
use crate::error::DocumentError;
use crate::merge::flatten_all_of;
use crate::registry::SchemaRegistry;
use crate::resolver::resolve_root;
use crate::schema::{SchemaKind, SchemaNode};
use crate::types::{pointer_child, CompareOptions, HttpMethod, COMPARED_STATUS_CODES};

/// Category of a recorded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Removed,
    Added,
    ParameterRemoved,
    ParameterBecameRequired,
    ParameterRequiredAdded,
    ResponseCodeRemoved,
    TypeChanged,
    RequiredPropertyAdded,
    EnumValueRemoved,
    RequestBodyBecameRequired,
    Modified,
    Deprecated,
}

impl ChangeKind {
    /// Human-readable label, e.g. "parameter required added".
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Removed => "removed",
            ChangeKind::Added => "added",
            ChangeKind::ParameterRemoved => "parameter removed",
            ChangeKind::ParameterBecameRequired => "parameter became required",
            ChangeKind::ParameterRequiredAdded => "parameter required added",
            ChangeKind::ResponseCodeRemoved => "response code removed",
            ChangeKind::TypeChanged => "type changed",
            ChangeKind::RequiredPropertyAdded => "required property added",
            ChangeKind::EnumValueRemoved => "enum value removed",
            ChangeKind::RequestBodyBecameRequired => "request body became required",
            ChangeKind::Modified => "modified",
            ChangeKind::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded change, located by path template and optional method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub description: String,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.method {
            Some(method) => write!(
                f,
                "{} {} [{}] {}",
                method, self.path, self.kind, self.description
            ),
            None => write!(f, "{} [{}] {}", self.path, self.kind, self.description),
        }
    }
}

/// Categorized changes between a base and a head document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResult {
    pub breaking: Vec<DiffEntry>,
    pub non_breaking: Vec<DiffEntry>,
    pub deprecated: Vec<DiffEntry>,
}

impl CompareResult {
    pub fn has_breaking(&self) -> bool {
        !self.breaking.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.breaking.is_empty() && self.non_breaking.is_empty() && self.deprecated.is_empty()
    }
}

/// Compare two documents with the default policies.
pub fn compare_specs(base: &Document, head: &Document) -> CompareResult {
    compare_specs_with(base, head, &CompareOptions::default())
}

/// Compare two documents.
pub fn compare_specs_with(
    base: &Document,
    head: &Document,
    options: &CompareOptions,
) -> CompareResult {
    let mut comparison = Comparison {
        base_registry: SchemaRegistry::from_document(base),
        head_registry: SchemaRegistry::from_document(head),
        base,
        head,
        options,
        result: CompareResult::default(),
    };
    comparison.run();

    let result = comparison.result;
    tracing::debug!(
        breaking = result.breaking.len(),
        non_breaking = result.non_breaking.len(),
        deprecated = result.deprecated.len(),
        "compared documents"
    );
    result
}

/// Compare two parsed JSON documents.
///
/// # Errors
///
/// Returns `DocumentError` if either value is not a well-formed document.
/// The inputs are named "base" and "head" in error messages.
pub fn compare_values(
    base: &Value,
    head: &Value,
    options: &CompareOptions,
) -> Result<CompareResult, DocumentError> {
    let base = Document::from_value(base, "base")?;
    let head = Document::from_value(head, "head")?;
    Ok(compare_specs_with(&base, &head, options))
}

// --- Internal implementation ---

type ParameterKey<'a> = (ParameterLocation, &'a str);

/// Which side of an exchange a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaRole {
    Request,
    Response,
}

struct Comparison<'a> {
    base: &'a Document,
    head: &'a Document,
    base_registry: SchemaRegistry,
    head_registry: SchemaRegistry,
    options: &'a CompareOptions,
    result: CompareResult,
}

/// Where in an operation a schema comparison is happening.
struct Site<'s> {
    path: &'s str,
    method: HttpMethod,
    label: String,
    role: SchemaRole,
}

impl Site<'_> {
    fn at(&self, pointer: &str) -> String {
        if pointer.is_empty() {
            self.label.clone()
        } else {
            format!("{} at {}", self.label, pointer)
        }
    }
}

impl<'a> Comparison<'a> {
    fn run(&mut self) {
        let paths: BTreeSet<&'a str> = self
            .base
            .paths
            .keys()
            .chain(self.head.paths.keys())
            .map(String::as_str)
            .collect();

        for path in paths {
            match (self.base.paths.get(path), self.head.paths.get(path)) {
                (Some(base_item), None) => {
                    for (method, _) in base_item.operations() {
                        self.removed(path, method);
                    }
                }
                (None, Some(head_item)) => {
                    for (method, _) in head_item.operations() {
                        self.added(path, method);
                    }
                }
                (Some(base_item), Some(head_item)) => {
                    self.compare_path(path, base_item, head_item)
                }
                (None, None) => {}
            }
        }
    }

    fn compare_path(&mut self, path: &str, base_item: &PathItem, head_item: &PathItem) {
        for method in HttpMethod::ALL {
            match (base_item.operation(method), head_item.operation(method)) {
                (Some(_), None) => self.removed(path, method),
                (None, Some(_)) => self.added(path, method),
                (Some(base_op), Some(head_op)) => self.compare_operation(
                    path,
                    method,
                    (base_item, base_op),
                    (head_item, head_op),
                ),
                (None, None) => {}
            }
        }
    }

    fn removed(&mut self, path: &str, method: HttpMethod) {
        let description = format!("{} {} was removed", method, path);
        self.breaking(path, Some(method), ChangeKind::Removed, description);
    }

    fn added(&mut self, path: &str, method: HttpMethod) {
        let description = format!("{} {} was added", method, path);
        self.non_breaking(path, Some(method), ChangeKind::Added, description);
    }

    fn compare_operation(
        &mut self,
        path: &str,
        method: HttpMethod,
        (base_item, base_op): (&PathItem, &Operation),
        (head_item, head_op): (&PathItem, &Operation),
    ) {
        self.compare_parameters(path, method, base_item, base_op, head_item, head_op);
        self.compare_responses(path, method, base_op, head_op);
        self.compare_request_bodies(
            path,
            method,
            base_op.request_body.as_ref(),
            head_op.request_body.as_ref(),
        );

        if changed_text(&base_op.summary, &head_op.summary) {
            let description = "summary changed".to_string();
            self.non_breaking(path, Some(method), ChangeKind::Modified, description);
        }
        if changed_text(&base_op.description, &head_op.description) {
            let description = "description changed".to_string();
            self.non_breaking(path, Some(method), ChangeKind::Modified, description);
        }

        if !base_op.deprecated && head_op.deprecated {
            self.result.deprecated.push(DiffEntry {
                path: path.to_string(),
                method: Some(method),
                kind: ChangeKind::Deprecated,
                description: format!("{} {} is now deprecated", method, path),
            });
        }
    }

    fn compare_parameters(
        &mut self,
        path: &str,
        method: HttpMethod,
        base_item: &PathItem,
        base_op: &Operation,
        head_item: &PathItem,
        head_op: &Operation,
    ) {
        let base_params = effective_parameters(self.base, base_item, base_op);
        let head_params = effective_parameters(self.head, head_item, head_op);

        for (key, base_param) in &base_params {
            let (location, name) = *key;
            let Some(head_param) = find_parameter(&head_params, key) else {
                self.breaking(
                    path,
                    Some(method),
                    ChangeKind::ParameterRemoved,
                    format!("{} parameter '{}' was removed", location, name),
                );
                continue;
            };

            if !base_param.required && head_param.required {
                self.breaking(
                    path,
                    Some(method),
                    ChangeKind::ParameterBecameRequired,
                    format!("{} parameter '{}' became required", location, name),
                );
            }

            let (Some(base_schema), Some(head_schema)) = (&base_param.schema, &head_param.schema)
            else {
                continue;
            };
            let base_type = resolve_root(base_schema, &self.base_registry).type_name();
            let head_type = resolve_root(head_schema, &self.head_registry).type_name();
            if let (Some(from), Some(to)) = (base_type, head_type) {
                if from != to {
                    self.breaking(
                        path,
                        Some(method),
                        ChangeKind::TypeChanged,
                        format!(
                            "{} parameter '{}' changed type from {} to {}",
                            location, name, from, to
                        ),
                    );
                }
            }
        }

        for (key, head_param) in &head_params {
            if find_parameter(&base_params, key).is_some() {
                continue;
            }
            let (location, name) = *key;
            if head_param.required && !head_param.has_default() {
                if self.options.required_parameter_addition_is_breaking {
                    self.breaking(
                        path,
                        Some(method),
                        ChangeKind::ParameterRequiredAdded,
                        format!("required {} parameter '{}' was added", location, name),
                    );
                } else {
                    tracing::debug!(
                        path = %path,
                        %method,
                        parameter = %name,
                        "required parameter addition not flagged by policy"
                    );
                }
            }
        }
    }

    fn compare_responses(
        &mut self,
        path: &str,
        method: HttpMethod,
        base_op: &Operation,
        head_op: &Operation,
    ) {
        for code in base_op.responses.keys() {
            if code.starts_with('2') && !head_op.responses.contains_key(code) {
                self.breaking(
                    path,
                    Some(method),
                    ChangeKind::ResponseCodeRemoved,
                    format!("response code {} was removed", code),
                );
            }
        }

        for code in COMPARED_STATUS_CODES {
            let (Some(base_response), Some(head_response)) =
                (base_op.responses.get(*code), head_op.responses.get(*code))
            else {
                continue;
            };
            for (media_type, base_media) in &base_response.content {
                let Some(head_media) = head_response.content.get(media_type) else {
                    continue;
                };
                let (Some(base_schema), Some(head_schema)) =
                    (&base_media.schema, &head_media.schema)
                else {
                    continue;
                };
                let site = Site {
                    path,
                    method,
                    label: format!("response {} ({})", code, media_type),
                    role: SchemaRole::Response,
                };
                self.compare_schemas(&site, base_schema, head_schema);
            }
        }
    }

    fn compare_request_bodies(
        &mut self,
        path: &str,
        method: HttpMethod,
        base_body: Option<&RequestBody>,
        head_body: Option<&RequestBody>,
    ) {
        let base_required = base_body.map(|b| b.required).unwrap_or(false);
        let head_required = head_body.map(|b| b.required).unwrap_or(false);
        if !base_required && head_required {
            self.breaking(
                path,
                Some(method),
                ChangeKind::RequestBodyBecameRequired,
                "request body became required".to_string(),
            );
        }

        let (Some(base_body), Some(head_body)) = (base_body, head_body) else {
            return;
        };
        for (media_type, base_media) in &base_body.content {
            let Some(head_media) = head_body.content.get(media_type) else {
                continue;
            };
            let (Some(base_schema), Some(head_schema)) = (&base_media.schema, &head_media.schema)
            else {
                continue;
            };
            let site = Site {
                path,
                method,
                label: format!("request body ({})", media_type),
                role: SchemaRole::Request,
            };
            self.compare_schemas(&site, base_schema, head_schema);
        }
    }

    fn compare_schemas(&mut self, site: &Site<'_>, base: &SchemaNode, head: &SchemaNode) {
        let base = flatten_all_of(&resolve_root(base, &self.base_registry));
        let head = flatten_all_of(&resolve_root(head, &self.head_registry));
        self.compare_nodes(site, &base, &head, "");
    }

    fn compare_nodes(
        &mut self,
        site: &Site<'_>,
        base: &SchemaNode,
        head: &SchemaNode,
        pointer: &str,
    ) {
        // Cycle markers and dangling references end the walk.
        if matches!(base.kind, SchemaKind::Ref(_)) || matches!(head.kind, SchemaKind::Ref(_)) {
            return;
        }

        if let (Some(from), Some(to)) = (base.type_name(), head.type_name()) {
            if from != to {
                self.breaking(
                    site.path,
                    Some(site.method),
                    ChangeKind::TypeChanged,
                    format!("{}: type changed from {} to {}", site.at(pointer), from, to),
                );
                return;
            }
        }
        if base.format() != head.format() {
            self.breaking(
                site.path,
                Some(site.method),
                ChangeKind::TypeChanged,
                format!(
                    "{}: format changed from {} to {}",
                    site.at(pointer),
                    base.format().unwrap_or("none"),
                    head.format().unwrap_or("none")
                ),
            );
        }

        if let (Some(base_values), Some(head_values)) =
            (&base.meta.enum_values, &head.meta.enum_values)
        {
            for value in base_values.iter().filter(|v| !head_values.contains(v)) {
                self.breaking(
                    site.path,
                    Some(site.method),
                    ChangeKind::EnumValueRemoved,
                    format!("{}: enum value {} was removed", site.at(pointer), value),
                );
            }
        }

        match (&base.kind, &head.kind) {
            (SchemaKind::Object(base_object), SchemaKind::Object(head_object)) => {
                let breaking = site.role == SchemaRole::Request
                    || self.options.response_required_is_breaking;
                let added = head_object
                    .required
                    .iter()
                    .filter(|n| !base_object.is_required(n));
                for name in added {
                    let description =
                        format!("{}: property '{}' is now required", site.at(pointer), name);
                    let kind = ChangeKind::RequiredPropertyAdded;
                    if breaking {
                        self.breaking(site.path, Some(site.method), kind, description);
                    } else {
                        self.non_breaking(site.path, Some(site.method), kind, description);
                    }
                }
                for (name, base_prop) in base_object.properties.iter() {
                    if let Some(head_prop) = head_object.properties.get(name) {
                        let child = pointer_child(pointer, name);
                        self.compare_nodes(site, base_prop, head_prop, &child);
                    }
                }
            }
            (SchemaKind::Array(base_array), SchemaKind::Array(head_array)) => {
                if let (Some(base_items), Some(head_items)) = (&base_array.items, &head_array.items)
                {
                    let child = pointer_child(pointer, "items");
                    self.compare_nodes(site, base_items, head_items, &child);
                }
            }
            _ => {}
        }
    }

    fn breaking(
        &mut self,
        path: &str,
        method: Option<HttpMethod>,
        kind: ChangeKind,
        description: String,
    ) {
        self.result.breaking.push(DiffEntry {
            path: path.to_string(),
            method,
            kind,
            description,
        });
    }

    fn non_breaking(
        &mut self,
        path: &str,
        method: Option<HttpMethod>,
        kind: ChangeKind,
        description: String,
    ) {
        self.result.non_breaking.push(DiffEntry {
            path: path.to_string(),
            method,
            kind,
            description,
        });
    }
}

/// Path-level parameters overridden by operation-level ones, in declaration order.
fn effective_parameters<'d>(
    document: &'d Document,
    item: &'d PathItem,
    operation: &'d Operation,
) -> Vec<(ParameterKey<'d>, &'d Parameter)> {
    let mut params: Vec<(ParameterKey<'d>, &'d Parameter)> = Vec::new();
    for entry in item.parameters.iter().chain(&operation.parameters) {
        let Some(param) = document.parameter(entry) else {
            continue;
        };
        let key = (param.location, param.name.as_str());
        match params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = param,
            None => params.push((key, param)),
        }
    }
    params
}

fn find_parameter<'p, 'd>(
    params: &'p [(ParameterKey<'d>, &'d Parameter)],
    key: &ParameterKey<'_>,
) -> Option<&'d Parameter> {
    params.iter().find(|(k, _)| k == key).map(|(_, p)| *p)
}

fn changed_text(base: &Option<String>, head: &Option<String>) -> bool {
    match head.as_deref() {
        Some(text) if !text.is_empty() => base.as_deref() != Some(text),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(&value, "test").unwrap()
    }

    fn kinds(entries: &[DiffEntry]) -> Vec<ChangeKind> {
        entries.iter().map(|e| e.kind).collect()
    }

    fn with_get(operation: Value) -> Document {
        doc(json!({ "paths": { "/items": { "get": operation } } }))
    }

    #[test]
    fn change_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(ChangeKind::ParameterRequiredAdded).unwrap(),
            json!("parameter-required-added")
        );
        assert_eq!(ChangeKind::ResponseCodeRemoved.to_string(), "response code removed");
    }

    #[test]
    fn result_serializes_camel_case_with_type_field() {
        let result = CompareResult {
            breaking: vec![DiffEntry {
                path: "/items".to_string(),
                method: Some(HttpMethod::Get),
                kind: ChangeKind::Removed,
                description: "GET /items was removed".to_string(),
            }],
            ..CompareResult::default()
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "breaking": [{
                    "path": "/items",
                    "method": "get",
                    "type": "removed",
                    "description": "GET /items was removed"
                }],
                "nonBreaking": [],
                "deprecated": []
            })
        );
    }

    #[test]
    fn added_method_is_non_breaking() {
        let base = with_get(json!({ "responses": {} }));
        let head = doc(json!({
            "paths": { "/items": { "get": { "responses": {} }, "post": { "responses": {} } } }
        }));
        let result = compare_specs(&base, &head);
        assert!(result.breaking.is_empty());
        assert_eq!(kinds(&result.non_breaking), vec![ChangeKind::Added]);
        assert_eq!(result.non_breaking[0].method, Some(HttpMethod::Post));
    }

    #[test]
    fn summary_description_and_deprecation() {
        let base = with_get(json!({ "summary": "List", "responses": {} }));
        let head = with_get(json!({
            "summary": "List items",
            "description": "Paginated",
            "deprecated": true,
            "responses": {}
        }));
        let result = compare_specs(&base, &head);
        assert!(result.breaking.is_empty());
        assert_eq!(
            kinds(&result.non_breaking),
            vec![ChangeKind::Modified, ChangeKind::Modified]
        );
        assert_eq!(kinds(&result.deprecated), vec![ChangeKind::Deprecated]);
    }

    #[test]
    fn emptied_summary_is_not_a_modification() {
        let base = with_get(json!({ "summary": "List", "responses": {} }));
        let head = with_get(json!({ "summary": "", "responses": {} }));
        assert!(compare_specs(&base, &head).is_empty());
    }

    #[test]
    fn parameter_removed_and_became_required() {
        let base = with_get(json!({
            "parameters": [
                { "name": "limit", "in": "query" },
                { "name": "cursor", "in": "query" }
            ],
            "responses": {}
        }));
        let head = with_get(json!({
            "parameters": [{ "name": "limit", "in": "query", "required": true }],
            "responses": {}
        }));
        let result = compare_specs(&base, &head);
        assert_eq!(
            kinds(&result.breaking),
            vec![ChangeKind::ParameterBecameRequired, ChangeKind::ParameterRemoved]
        );
        assert!(result.breaking[1].description.contains("cursor"));
    }

    #[test]
    fn same_name_in_different_location_is_a_different_parameter() {
        let base = with_get(json!({
            "parameters": [{ "name": "id", "in": "query" }],
            "responses": {}
        }));
        let head = with_get(json!({
            "parameters": [{ "name": "id", "in": "header" }],
            "responses": {}
        }));
        let result = compare_specs(&base, &head);
        assert_eq!(kinds(&result.breaking), vec![ChangeKind::ParameterRemoved]);
    }

    #[test]
    fn required_parameter_addition_policy() {
        let base = with_get(json!({ "responses": {} }));
        let head = with_get(json!({
            "parameters": [
                { "name": "tenantId", "in": "query", "required": true },
                {
                    "name": "page",
                    "in": "query",
                    "required": true,
                    "schema": { "type": "integer", "default": 1 }
                },
                { "name": "q", "in": "query" }
            ],
            "responses": {}
        }));

        let result = compare_specs(&base, &head);
        assert_eq!(kinds(&result.breaking), vec![ChangeKind::ParameterRequiredAdded]);
        assert!(result.breaking[0].description.contains("tenantId"));

        let lenient = CompareOptions::new().required_parameter_addition_is_breaking(false);
        assert!(compare_specs_with(&base, &head, &lenient).is_empty());
    }

    #[test]
    fn path_level_parameters_are_merged() {
        let base = doc(json!({
            "components": { "parameters": { "Tenant": { "name": "tenant", "in": "header" } } },
            "paths": { "/items": {
                "parameters": [{ "$ref": "#/components/parameters/Tenant" }],
                "get": { "responses": {} }
            } }
        }));
        let head = doc(json!({
            "paths": { "/items": {
                "parameters": [{ "name": "tenant", "in": "header" }],
                "get": {
                    "parameters": [{ "name": "tenant", "in": "header", "required": true }],
                    "responses": {}
                }
            } }
        }));
        let result = compare_specs(&base, &head);
        assert_eq!(kinds(&result.breaking), vec![ChangeKind::ParameterBecameRequired]);
    }

    #[test]
    fn parameter_type_change() {
        let base = with_get(json!({
            "parameters": [{ "name": "id", "in": "query", "schema": { "type": "integer" } }],
            "responses": {}
        }));
        let head = with_get(json!({
            "parameters": [{ "name": "id", "in": "query", "schema": { "type": "string" } }],
            "responses": {}
        }));
        let result = compare_specs(&base, &head);
        assert_eq!(kinds(&result.breaking), vec![ChangeKind::TypeChanged]);
        assert!(result.breaking[0].description.contains("integer to string"));
    }

    #[test]
    fn non_success_response_removal_is_ignored() {
        let base = with_get(json!({ "responses": { "200": {}, "404": {} } }));
        let head = with_get(json!({ "responses": { "200": {} } }));
        assert!(compare_specs(&base, &head).breaking.is_empty());
    }

    fn with_response_schema(schema: Value) -> Document {
        with_get(json!({
            "responses": { "200": { "content": { "application/json": { "schema": schema } } } }
        }))
    }

    #[test]
    fn nested_type_format_and_enum_changes() {
        let base = with_response_schema(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "format": "int32" },
                    "status": { "type": "string", "enum": ["open", "closed"] },
                    "count": { "type": "integer" }
                }
            }
        }));
        let head = with_response_schema(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "format": "int64" },
                    "status": { "type": "string", "enum": ["open"] },
                    "count": { "type": "string" }
                }
            }
        }));
        let result = compare_specs(&base, &head);
        assert_eq!(
            kinds(&result.breaking),
            vec![ChangeKind::TypeChanged, ChangeKind::EnumValueRemoved, ChangeKind::TypeChanged]
        );
        assert!(result.breaking[0].description.contains("/items/id"));
        assert!(result.breaking[1].description.contains("\"closed\""));
    }

    #[test]
    fn response_required_policy_toggle() {
        let base = with_response_schema(json!({ "type": "object", "required": ["id"] }));
        let head = with_response_schema(json!({ "type": "object", "required": ["id", "email"] }));

        let strict = compare_specs(&base, &head);
        assert_eq!(kinds(&strict.breaking), vec![ChangeKind::RequiredPropertyAdded]);

        let relaxed = CompareOptions::new().response_required_is_breaking(false);
        let result = compare_specs_with(&base, &head, &relaxed);
        assert!(result.breaking.is_empty());
        assert_eq!(kinds(&result.non_breaking), vec![ChangeKind::RequiredPropertyAdded]);
    }

    #[test]
    fn request_body_changes() {
        let base = doc(json!({ "paths": { "/items": { "post": {
            "requestBody": {
                "content": { "application/json": { "schema": { "type": "object" } } }
            },
            "responses": {}
        } } } }));
        let head = doc(json!({ "paths": { "/items": { "post": {
            "requestBody": {
                "required": true,
                "content": { "application/json": {
                    "schema": { "type": "object", "required": ["name"] }
                } }
            },
            "responses": {}
        } } } }));

        let relaxed = CompareOptions::new().response_required_is_breaking(false);
        let result = compare_specs_with(&base, &head, &relaxed);
        assert_eq!(
            kinds(&result.breaking),
            vec![ChangeKind::RequestBodyBecameRequired, ChangeKind::RequiredPropertyAdded]
        );
    }

    #[test]
    fn all_of_responses_compare_as_merged_objects() {
        let components = json!({ "schemas": {
            "Base": { "type": "object", "properties": { "id": { "type": "integer" } } }
        } });
        let mut base = with_response_schema(json!({
            "allOf": [{ "$ref": "#/components/schemas/Base" }, { "required": ["id"] }]
        }));
        let mut head = with_response_schema(json!({
            "type": "object",
            "properties": { "id": { "type": "string" } },
            "required": ["id"]
        }));
        base.components = doc(json!({ "components": components })).components;
        head.components = doc(json!({ "components": components })).components;
        let result = compare_specs(&base, &head);
        assert_eq!(kinds(&result.breaking), vec![ChangeKind::TypeChanged]);
    }

    #[test]
    fn cyclic_response_schema_terminates() {
        let document = json!({
            "components": { "schemas": { "Node": {
                "type": "object",
                "properties": { "next": { "$ref": "#/components/schemas/Node" } }
            } } },
            "paths": { "/nodes": { "get": { "responses": { "200": {
                "content": { "application/json": {
                    "schema": { "$ref": "#/components/schemas/Node" }
                } }
            } } } } }
        });
        let result = compare_values(&document, &document, &CompareOptions::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn compare_values_names_the_bad_input() {
        let err =
            compare_values(&json!({}), &json!("nope"), &CompareOptions::default()).unwrap_err();
        assert!(matches!(err, DocumentError::NotADocument { ref input, .. } if input == "head"));
    }
}
