//! Typed OpenAPI document.
//!
//! Only the parts the resolution and comparison engines read are modelled.
//! Unknown keys are ignored and missing sections default to empty, so
//! partially specified documents still load.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::schema::SchemaNode;
use crate::types::{json_type_name, HttpMethod};

/// Pointer prefix under which reusable parameters live.
pub const COMPONENT_PARAMETER_PREFIX: &str = "#/components/parameters/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
}

impl Document {
    /// Build a document from an already-parsed JSON tree.
    ///
    /// `input` names the value in error messages (e.g. "base", a file path).
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::NotADocument` when `value` is not a JSON object
    /// and `DocumentError::Malformed` when a section has the wrong shape.
    pub fn from_value(value: &Value, input: &str) -> Result<Self, DocumentError> {
        if !value.is_object() {
            return Err(DocumentError::NotADocument {
                input: input.to_string(),
                actual: json_type_name(value).to_string(),
            });
        }
        serde_json::from_value(value.clone()).map_err(|source| DocumentError::Malformed {
            input: input.to_string(),
            source,
        })
    }

    /// Look up a component schema by name.
    pub fn schema(&self, name: &str) -> Option<&SchemaNode> {
        self.components.schemas.get(name)
    }

    /// Resolve a parameter entry, following `#/components/parameters/...`.
    ///
    /// Returns `None` for references to undefined parameters.
    pub fn parameter<'a>(&'a self, entry: &'a ParameterOrRef) -> Option<&'a Parameter> {
        match entry {
            ParameterOrRef::Item(p) => Some(p),
            ParameterOrRef::Ref { reference } => {
                let name = reference.strip_prefix(COMPONENT_PARAMETER_PREFIX)?;
                let found = self.components.parameters.get(name);
                if found.is_none() {
                    tracing::debug!(pointer = %reference, "dangling parameter reference");
                }
                found
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
}

/// Operations and shared parameters for one URL template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Defined operations in canonical method order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |m| self.operation(m).map(|op| (m, op)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// An inline parameter or a reference to a reusable one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(Parameter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::Cookie => "cookie",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
}

impl Parameter {
    /// Whether the parameter's schema supplies a default value.
    pub fn has_default(&self) -> bool {
        self.schema
            .as_ref()
            .map(|s| s.meta.default.is_some())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_default_to_empty() {
        let doc = Document::from_value(&json!({ "openapi": "3.0.3" }), "base").unwrap();
        assert!(doc.paths.is_empty());
        assert!(doc.components.schemas.is_empty());
    }

    #[test]
    fn non_object_is_not_a_document() {
        let err = Document::from_value(&json!(["/pets"]), "head").unwrap_err();
        assert!(matches!(
            err,
            DocumentError::NotADocument { ref input, ref actual }
                if input == "head" && actual == "array"
        ));
    }

    #[test]
    fn malformed_section_names_input() {
        let err = Document::from_value(&json!({ "paths": [] }), "base.json").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed { .. }));
        assert!(err.to_string().starts_with("base.json is malformed"));
    }

    #[test]
    fn operations_iterate_in_canonical_order() {
        let doc = Document::from_value(
            &json!({
                "paths": {
                    "/widgets": {
                        "delete": { "responses": {} },
                        "get": { "responses": {} },
                        "post": { "responses": {} }
                    }
                }
            }),
            "doc",
        )
        .unwrap();
        let methods: Vec<HttpMethod> = doc.paths["/widgets"].operations().map(|(m, _)| m).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Get, HttpMethod::Post, HttpMethod::Delete]
        );
    }

    #[test]
    fn parameter_references_resolve_through_components() {
        let doc = Document::from_value(
            &json!({
                "paths": {
                    "/items": {
                        "get": {
                            "parameters": [
                                { "$ref": "#/components/parameters/Limit" },
                                { "$ref": "#/components/parameters/Missing" },
                                { "name": "q", "in": "query" }
                            ],
                            "responses": {}
                        }
                    }
                },
                "components": {
                    "parameters": {
                        "Limit": {
                            "name": "limit",
                            "in": "query",
                            "schema": { "type": "integer", "default": 20 }
                        }
                    }
                }
            }),
            "doc",
        )
        .unwrap();
        let op = doc.paths["/items"].get.as_ref().unwrap();
        let limit = doc.parameter(&op.parameters[0]).unwrap();
        assert_eq!(limit.name, "limit");
        assert!(limit.has_default());
        assert!(doc.parameter(&op.parameters[1]).is_none());
        assert_eq!(doc.parameter(&op.parameters[2]).unwrap().name, "q");
    }

    #[test]
    fn schemas_are_parsed_into_nodes() {
        let doc = Document::from_value(
            &json!({
                "components": {
                    "schemas": {
                        "Pet": { "type": "object", "properties": { "name": { "type": "string" } } }
                    }
                }
            }),
            "doc",
        )
        .unwrap();
        assert_eq!(doc.schema("Pet").and_then(|s| s.type_name()), Some("object"));
    }

    #[test]
    fn invalid_schema_surfaces_as_malformed() {
        let err = Document::from_value(
            &json!({ "components": { "schemas": { "Bad": { "type": 7 } } } }),
            "doc",
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected string or array"));
    }
}
