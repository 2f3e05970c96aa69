//! OpenAPI schema resolution and compatibility checking.
//!
//! This library dereferences (possibly cyclic) `$ref` graphs, converts
//! nullability between the OpenAPI 3.0 and 3.1 dialects, merges `allOf`
//! schemas, validates JSON values against `oneOf`/`anyOf`/`allOf`
//! combinators, and classifies the differences between two documents as
//! breaking, non-breaking, or deprecations.
//!
//! # Example
//!
//! ```
//! use oas_compat::{compare_values, ChangeKind, CompareOptions};
//! use serde_json::json;
//!
//! let base = json!({
//!     "paths": {
//!         "/widgets": {
//!             "get": { "responses": { "200": {} } },
//!             "post": { "responses": { "201": {} } }
//!         }
//!     }
//! });
//! let head = json!({ "paths": {} });
//!
//! let result = compare_values(&base, &head, &CompareOptions::default()).unwrap();
//!
//! // One breaking "removed" entry per method of the dropped path
//! assert_eq!(result.breaking.len(), 2);
//! assert!(result.breaking.iter().all(|e| e.kind == ChangeKind::Removed));
//! ```
//!
//! # Schema registry
//!
//! Every resolver, merger and validator call takes an explicit
//! [`SchemaRegistry`]. Build one per document with
//! [`SchemaRegistry::from_document`], and [`SchemaRegistry::reset`] it before
//! reusing it for an unrelated document.
//!
//! # Nullable dialects
//!
//! | Dialect | Representation                                |
//! |---------|-----------------------------------------------|
//! | `flag`  | `{ "type": "string", "nullable": true }`      |
//! | `union` | `{ "type": ["string", "null"] }`              |
//!
//! The legacy `x-nullable: true` marker is accepted as input in both.

mod diff;
mod document;
mod error;
mod loader;
mod merge;
mod nullable;
mod registry;
mod resolver;
mod schema;
mod types;
mod validator;

pub use diff::{
    compare_specs, compare_specs_with, compare_values, ChangeKind, CompareResult, DiffEntry,
};
pub use document::{
    Components, Document, Info, MediaType, Operation, Parameter, ParameterLocation, ParameterOrRef,
    PathItem, RequestBody, Response, COMPONENT_PARAMETER_PREFIX,
};
pub use error::{DocumentError, DocumentLoadError, LoadError, SchemaError, ValidateError};
pub use loader::{is_url, load_document, load_json, load_json_auto, load_json_str};
pub use merge::{apply_strictness, flatten_all_of, merge};
pub use nullable::{normalize, normalize_registry};
pub use registry::SchemaRegistry;
pub use resolver::{collect_refs, resolve, resolve_root};
pub use schema::{
    AdditionalProperties, ArraySchema, CompositeKind, CompositeSchema, Metadata, Nullable,
    ObjectSchema, Properties, ScalarSchema, ScalarType, SchemaKind, SchemaNode,
};
pub use types::{
    json_type_name, CompareOptions, HttpMethod, NullableDialect, ValidateOptions,
    COMPARED_STATUS_CODES, COMPONENT_SCHEMA_PREFIX,
};
pub use validator::{validate, validate_component, Validator};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
