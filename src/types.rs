//! Core types shared by resolution, validation and comparison.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pointer prefix under which component schemas are registered.
pub const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Response status codes whose bodies are compared structurally.
pub const COMPARED_STATUS_CODES: &[&str] = &["200", "201", "204"];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Append one segment to a JSON Pointer, escaping `~` and `/` (RFC 6901).
pub fn pointer_child(path: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    format!("{}/{}", path, escaped)
}

/// HTTP methods an OpenAPI path item can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    /// All methods in canonical comparison order.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Trace,
    ];

    /// Lowercase key used in OpenAPI path items.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Representation used for "this value may be null".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullableDialect {
    /// `nullable: true` next to a single type name (OpenAPI 3.0).
    Flag,
    /// `type: [<base>, "null"]` (OpenAPI 3.1 / JSON Schema).
    Union,
}

impl NullableDialect {
    /// Parse a dialect name.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flag" | "3.0" => Some(NullableDialect::Flag),
            "union" | "3.1" => Some(NullableDialect::Union),
            _ => None,
        }
    }
}

/// Options for payload validation.
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// When true, object schemas that do not restrict additional properties
    /// are treated as `additionalProperties: false`. Defaults to false.
    pub strict: bool,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode (reject unknown object keys).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Compatibility policies for document comparison.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// A property that becomes required in a success response schema is
    /// reported as breaking. When false it is reported as non-breaking.
    pub response_required_is_breaking: bool,
    /// A newly added required parameter without a default value is reported
    /// as breaking. When false, added parameters are never reported.
    pub required_parameter_addition_is_breaking: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            response_required_is_breaking: true,
            required_parameter_addition_is_breaking: true,
        }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response_required_is_breaking(mut self, enabled: bool) -> Self {
        self.response_required_is_breaking = enabled;
        self
    }

    pub fn required_parameter_addition_is_breaking(mut self, enabled: bool) -> Self {
        self.required_parameter_addition_is_breaking = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_order_is_canonical() {
        let names: Vec<&str> = HttpMethod::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(
            names,
            vec!["get", "post", "put", "patch", "delete", "options", "head", "trace"]
        );
    }

    #[test]
    fn method_display_is_uppercase() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }

    #[test]
    fn dialect_parse() {
        assert_eq!(NullableDialect::parse("flag"), Some(NullableDialect::Flag));
        assert_eq!(NullableDialect::parse("Union"), Some(NullableDialect::Union));
        assert_eq!(NullableDialect::parse("3.1"), Some(NullableDialect::Union));
        assert_eq!(NullableDialect::parse("both"), None);
    }

    #[test]
    fn pointer_child_escapes_segments() {
        assert_eq!(pointer_child("", "name"), "/name");
        assert_eq!(pointer_child("/paths", "/items/{id}"), "/paths/~1items~1{id}");
        assert_eq!(pointer_child("", "a~b"), "/a~0b");
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!({})), "object");
    }

    #[test]
    fn compare_options_defaults() {
        let opts = CompareOptions::new();
        assert!(opts.response_required_is_breaking);
        assert!(opts.required_parameter_addition_is_breaking);

        let opts = opts.response_required_is_breaking(false);
        assert!(!opts.response_required_is_breaking);
    }
}
