//! Typed schema tree.
//!
//! Schemas arrive as JSON trees whose behaviour depends on which keywords are
//! present. They are parsed once into a [`SchemaNode`], a tagged variant that
//! the resolver, normalizer, merger, validator and diff engine dispatch on.
//!
//! Parsing rules:
//! - `$ref` wins over every sibling except description and nullability markers.
//! - A node declaring exactly one combinator and no structural keywords
//!   (`type`, `properties`, `required`, `additionalProperties`, `items`)
//!   becomes that [`CompositeSchema`].
//! - A node mixing structural keywords with combinators, or declaring several
//!   combinators, becomes an `allOf` whose members are the structural part
//!   followed by one member per combinator.
//! - Untyped nodes with object keywords are objects, untyped nodes with
//!   `items` are arrays, and anything else untyped is [`SchemaKind::Any`].
//! - `false` and `not: {}` are [`SchemaKind::Never`].
//! - A type array mixing `object` or `array` with other types becomes an
//!   `anyOf` with one member per type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::DocumentError;
use crate::types::{json_type_name, pointer_child};

/// Keywords that give a node its own shape next to a combinator.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "type",
    "properties",
    "required",
    "additionalProperties",
    "items",
];

const OBJECT_KEYWORDS: &[&str] = &["properties", "required", "additionalProperties"];

/// Legacy vendor extension equivalent to `nullable: true`.
pub const LEGACY_NULLABLE_KEY: &str = "x-nullable";

/// Scalar JSON Schema type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl ScalarType {
    /// Parse a scalar type name. `object` and `array` are not scalars.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ScalarType::String),
            "integer" => Some(ScalarType::Integer),
            "number" => Some(ScalarType::Number),
            "boolean" => Some(ScalarType::Boolean),
            "null" => Some(ScalarType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Null => "null",
        }
    }

    /// Whether a JSON value is an instance of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ScalarType::String => value.is_string(),
            ScalarType::Number => value.is_number(),
            ScalarType::Boolean => value.is_boolean(),
            ScalarType::Null => value.is_null(),
            ScalarType::Integer => match value {
                Value::Number(n) => {
                    n.is_i64()
                        || n.is_u64()
                        || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
                }
                _ => false,
            },
        }
    }
}

/// How a node says "this value may also be null".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Nullable {
    /// Not nullable.
    #[default]
    Absent,
    /// `nullable: true`.
    Flag,
    /// `"null"` inside a type array.
    TypeArray,
    /// `x-nullable: true`.
    Legacy,
}

impl Nullable {
    pub fn is_nullable(&self) -> bool {
        !matches!(self, Nullable::Absent)
    }
}

/// Descriptive keywords carried by every node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    pub deprecated: bool,
    pub example: Option<Value>,
}

/// String, number, boolean or null schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScalarSchema {
    /// Non-null type names; the first entry is the base type.
    pub types: Vec<ScalarType>,
    pub format: Option<String>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<Number>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
}

impl ScalarSchema {
    pub fn of(ty: ScalarType) -> Self {
        Self {
            types: vec![ty],
            ..Self::default()
        }
    }

    /// The base type, if any.
    pub fn base_type(&self) -> Option<ScalarType> {
        self.types.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArraySchema {
    pub items: Option<Box<SchemaNode>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

/// Policy for keys not listed in `properties`.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allow,
    Deny,
    Schema(Box<SchemaNode>),
}

/// Insertion-ordered property map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(Vec<(String, SchemaNode)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or overwrite. An overwritten property keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = node,
            None => self.0.push((name, node)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, SchemaNode)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, SchemaNode)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (name, node) in iter {
            props.insert(name, node);
        }
        props
    }
}

impl IntoIterator for Properties {
    type Item = (String, SchemaNode);
    type IntoIter = std::vec::IntoIter<(String, SchemaNode)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub properties: Properties,
    /// Required property names, duplicates removed.
    pub required: Vec<String>,
    /// `None` when the schema does not say.
    pub additional_properties: Option<AdditionalProperties>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.properties.insert(name, node);
        self
    }

    pub fn require(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// Schema combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    OneOf,
    AnyOf,
    AllOf,
}

impl CompositeKind {
    /// Combinators in the order they are read from a node.
    pub const ALL: [CompositeKind; 3] = [
        CompositeKind::AllOf,
        CompositeKind::AnyOf,
        CompositeKind::OneOf,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            CompositeKind::OneOf => "oneOf",
            CompositeKind::AnyOf => "anyOf",
            CompositeKind::AllOf => "allOf",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSchema {
    pub kind: CompositeKind,
    pub members: Vec<SchemaNode>,
}

/// Shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// No type constraint (`{}` or `true`).
    Any,
    Scalar(ScalarSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
    /// Unresolved `$ref` pointer.
    Ref(String),
    Composite(CompositeSchema),
    /// Accepts no value (`false`).
    Never,
}

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub nullable: Nullable,
    pub meta: Metadata,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: Nullable::Absent,
            meta: Metadata::default(),
        }
    }

    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    pub fn never() -> Self {
        Self::new(SchemaKind::Never)
    }

    pub fn scalar(ty: ScalarType) -> Self {
        Self::new(SchemaKind::Scalar(ScalarSchema::of(ty)))
    }

    pub fn object(object: ObjectSchema) -> Self {
        Self::new(SchemaKind::Object(object))
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(SchemaKind::Array(ArraySchema {
            items: Some(Box::new(items)),
            ..ArraySchema::default()
        }))
    }

    pub fn reference(pointer: impl Into<String>) -> Self {
        Self::new(SchemaKind::Ref(pointer.into()))
    }

    pub fn composite(kind: CompositeKind, members: Vec<SchemaNode>) -> Self {
        Self::new(SchemaKind::Composite(CompositeSchema { kind, members }))
    }

    pub fn with_nullable(mut self, nullable: Nullable) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// Parse a schema from a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidSchema` with the JSON pointer of the
    /// offending node when the tree is not a schema.
    pub fn from_value(value: &Value) -> Result<Self, DocumentError> {
        parse_node(value, "")
    }

    /// Serialize back to a JSON tree.
    ///
    /// A bare [`SchemaKind::Never`] is written as `false`; one carrying
    /// metadata or a nullable marker is written as `not: {}`.
    pub fn to_value(&self) -> Value {
        let bare = self.nullable == Nullable::Absent && self.meta == Metadata::default();
        if bare && matches!(self.kind, SchemaKind::Never) {
            return Value::Bool(false);
        }
        Value::Object(write_node(self))
    }

    /// Primary type name (`"object"`, `"array"` or the base scalar type).
    pub fn type_name(&self) -> Option<&'static str> {
        match &self.kind {
            SchemaKind::Scalar(s) => s.base_type().map(|t| t.as_str()),
            SchemaKind::Array(_) => Some("array"),
            SchemaKind::Object(_) => Some("object"),
            _ => None,
        }
    }

    /// Format keyword, only meaningful on scalars.
    pub fn format(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::Scalar(s) => s.format.as_deref(),
            _ => None,
        }
    }

    pub fn as_ref_pointer(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::Ref(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(o) => Some(o),
            _ => None,
        }
    }

    /// True when the node accepts `null`.
    pub fn accepts_null(&self) -> bool {
        self.nullable.is_nullable()
            || matches!(self.kind, SchemaKind::Any)
            || matches!(&self.kind, SchemaKind::Scalar(s) if s.types.contains(&ScalarType::Null))
    }
}

impl TryFrom<Value> for SchemaNode {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        SchemaNode::from_value(&value)
    }
}

impl From<SchemaNode> for Value {
    fn from(node: SchemaNode) -> Self {
        node.to_value()
    }
}

// --- Parsing ---

fn invalid(path: &str, message: impl Into<String>) -> DocumentError {
    DocumentError::InvalidSchema {
        path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        message: message.into(),
    }
}

fn parse_node(value: &Value, path: &str) -> Result<SchemaNode, DocumentError> {
    let map = match value {
        Value::Object(map) => map,
        Value::Bool(true) => return Ok(SchemaNode::any()),
        Value::Bool(false) => return Ok(SchemaNode::never()),
        other => {
            return Err(invalid(
                path,
                format!("expected schema object, got {}", json_type_name(other)),
            ))
        }
    };

    let meta = parse_metadata(map);
    let mut nullable = parse_nullable_marker(map);

    if let Some(pointer) = map.get("$ref") {
        let pointer = pointer.as_str().ok_or_else(|| {
            invalid(
                &pointer_child(path, "$ref"),
                format!("expected string, got {}", json_type_name(pointer)),
            )
        })?;
        return Ok(SchemaNode {
            kind: SchemaKind::Ref(pointer.to_string()),
            nullable,
            meta,
        });
    }

    if map.get("not").is_some_and(accepts_everything) {
        return Ok(SchemaNode {
            kind: SchemaKind::Never,
            nullable,
            meta,
        });
    }

    let mut combinators = Vec::new();
    for kind in CompositeKind::ALL {
        if let Some(members) = map.get(kind.keyword()) {
            let member_path = pointer_child(path, kind.keyword());
            let members = members
                .as_array()
                .ok_or_else(|| invalid(&member_path, "expected array of schemas"))?;
            let members = members
                .iter()
                .enumerate()
                .map(|(i, m)| parse_node(m, &pointer_child(&member_path, &i.to_string())))
                .collect::<Result<Vec<_>, _>>()?;
            combinators.push(CompositeSchema { kind, members });
        }
    }

    let structural = STRUCTURAL_KEYWORDS.iter().any(|k| map.contains_key(*k));

    if !combinators.is_empty() {
        if combinators.len() == 1 && !structural {
            let composite = combinators.remove(0);
            return Ok(SchemaNode {
                kind: SchemaKind::Composite(composite),
                nullable,
                meta,
            });
        }

        let mut members = Vec::new();
        if structural {
            let (kind, null_in_type) = parse_structural(map, path)?;
            if null_in_type {
                nullable = Nullable::TypeArray;
            }
            members.push(SchemaNode::new(kind));
        }
        members.extend(
            combinators
                .into_iter()
                .map(|c| SchemaNode::new(SchemaKind::Composite(c))),
        );
        return Ok(SchemaNode {
            kind: SchemaKind::Composite(CompositeSchema {
                kind: CompositeKind::AllOf,
                members,
            }),
            nullable,
            meta,
        });
    }

    let (kind, null_in_type) = parse_structural(map, path)?;
    if null_in_type {
        nullable = Nullable::TypeArray;
    }
    Ok(SchemaNode {
        kind,
        nullable,
        meta,
    })
}

/// `true` or `{}`.
fn accepts_everything(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn parse_metadata(map: &Map<String, Value>) -> Metadata {
    Metadata {
        title: map.get("title").and_then(Value::as_str).map(String::from),
        description: map
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        default: map.get("default").cloned(),
        enum_values: map.get("enum").and_then(Value::as_array).cloned(),
        deprecated: map
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        example: map.get("example").cloned(),
    }
}

fn parse_nullable_marker(map: &Map<String, Value>) -> Nullable {
    if map.get("nullable").and_then(Value::as_bool) == Some(true) {
        Nullable::Flag
    } else if map.get(LEGACY_NULLABLE_KEY).and_then(Value::as_bool) == Some(true) {
        Nullable::Legacy
    } else {
        Nullable::Absent
    }
}

/// Returns the non-null type names and whether `"null"` was listed.
fn parse_type(value: Option<&Value>, path: &str) -> Result<(Vec<String>, bool), DocumentError> {
    let type_path = pointer_child(path, "type");
    match value {
        None => Ok((Vec::new(), false)),
        Some(Value::String(s)) if s == "null" => Ok((Vec::new(), true)),
        Some(Value::String(s)) => Ok((vec![s.clone()], false)),
        Some(Value::Array(entries)) => {
            let mut names = Vec::new();
            let mut has_null = false;
            for entry in entries {
                match entry.as_str() {
                    Some("null") => has_null = true,
                    Some(name) => {
                        if !names.iter().any(|n| n == name) {
                            names.push(name.to_string());
                        }
                    }
                    None => {
                        return Err(invalid(
                            &type_path,
                            format!("expected type name, got {}", json_type_name(entry)),
                        ))
                    }
                }
            }
            Ok((names, has_null))
        }
        Some(other) => Err(invalid(
            &type_path,
            format!("expected string or array, got {}", json_type_name(other)),
        )),
    }
}

fn parse_structural(
    map: &Map<String, Value>,
    path: &str,
) -> Result<(SchemaKind, bool), DocumentError> {
    let (names, null_in_type) = parse_type(map.get("type"), path)?;

    let Some(first) = names.first() else {
        if null_in_type {
            // `type: "null"` on its own is a null scalar, not a nullable one.
            return Ok((
                SchemaKind::Scalar(ScalarSchema::of(ScalarType::Null)),
                false,
            ));
        }
        if OBJECT_KEYWORDS.iter().any(|k| map.contains_key(*k)) {
            return Ok((SchemaKind::Object(parse_object(map, path)?), false));
        }
        if map.contains_key("items") {
            return Ok((SchemaKind::Array(parse_array(map, path)?), false));
        }
        return Ok((SchemaKind::Any, false));
    };

    if names.len() > 1 && names.iter().any(|n| n == "object" || n == "array") {
        tracing::debug!(path = %path, types = ?names, "reading mixed type array as anyOf");
        let members = names
            .iter()
            .map(|name| {
                let mut single = map.clone();
                single.insert("type".into(), Value::from(name.as_str()));
                parse_structural(&single, path).map(|(kind, _)| SchemaNode::new(kind))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let composite = CompositeSchema {
            kind: CompositeKind::AnyOf,
            members,
        };
        return Ok((SchemaKind::Composite(composite), null_in_type));
    }

    let kind = match first.as_str() {
        "object" => SchemaKind::Object(parse_object(map, path)?),
        "array" => SchemaKind::Array(parse_array(map, path)?),
        _ => {
            let mut types = Vec::new();
            for name in &names {
                match ScalarType::parse(name) {
                    Some(ty) => types.push(ty),
                    None => {
                        return Err(invalid(
                            &pointer_child(path, "type"),
                            format!("unknown type \"{}\"", name),
                        ))
                    }
                }
            }
            SchemaKind::Scalar(parse_scalar(map, types))
        }
    };
    Ok((kind, null_in_type))
}

fn get_u64(map: &Map<String, Value>, key: &str) -> Option<u64> {
    map.get(key).and_then(Value::as_u64)
}

fn get_number(map: &Map<String, Value>, key: &str) -> Option<Number> {
    match map.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

fn parse_scalar(map: &Map<String, Value>, types: Vec<ScalarType>) -> ScalarSchema {
    let mut scalar = ScalarSchema {
        types,
        format: map.get("format").and_then(Value::as_str).map(String::from),
        minimum: get_number(map, "minimum"),
        maximum: get_number(map, "maximum"),
        multiple_of: get_number(map, "multipleOf"),
        min_length: get_u64(map, "minLength"),
        max_length: get_u64(map, "maxLength"),
        pattern: map.get("pattern").and_then(Value::as_str).map(String::from),
        ..ScalarSchema::default()
    };

    // 3.0 uses a boolean next to minimum/maximum, 3.1 carries the bound
    // itself. When a 3.1 bound sits next to an inclusive one, the stricter
    // bound is kept; on a tie the exclusive one.
    match map.get("exclusiveMinimum") {
        Some(Value::Bool(b)) => scalar.exclusive_minimum = *b,
        Some(Value::Number(n)) => {
            let tighter = match (n.as_f64(), scalar.minimum.as_ref().and_then(Number::as_f64)) {
                (Some(exclusive), Some(inclusive)) => exclusive >= inclusive,
                _ => true,
            };
            if tighter {
                scalar.minimum = Some(n.clone());
                scalar.exclusive_minimum = true;
            }
        }
        _ => {}
    }
    match map.get("exclusiveMaximum") {
        Some(Value::Bool(b)) => scalar.exclusive_maximum = *b,
        Some(Value::Number(n)) => {
            let tighter = match (n.as_f64(), scalar.maximum.as_ref().and_then(Number::as_f64)) {
                (Some(exclusive), Some(inclusive)) => exclusive <= inclusive,
                _ => true,
            };
            if tighter {
                scalar.maximum = Some(n.clone());
                scalar.exclusive_maximum = true;
            }
        }
        _ => {}
    }
    scalar
}

fn parse_array(map: &Map<String, Value>, path: &str) -> Result<ArraySchema, DocumentError> {
    let items = match map.get("items") {
        Some(items) => Some(Box::new(parse_node(items, &pointer_child(path, "items"))?)),
        None => None,
    };
    Ok(ArraySchema {
        items,
        min_items: get_u64(map, "minItems"),
        max_items: get_u64(map, "maxItems"),
        unique_items: map
            .get("uniqueItems")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn parse_object(map: &Map<String, Value>, path: &str) -> Result<ObjectSchema, DocumentError> {
    let mut object = ObjectSchema {
        min_properties: get_u64(map, "minProperties"),
        max_properties: get_u64(map, "maxProperties"),
        ..ObjectSchema::default()
    };

    if let Some(props) = map.get("properties") {
        let props_path = pointer_child(path, "properties");
        let props = props
            .as_object()
            .ok_or_else(|| invalid(&props_path, "expected object of schemas"))?;
        for (name, prop) in props {
            let node = parse_node(prop, &pointer_child(&props_path, name))?;
            object.properties.insert(name.clone(), node);
        }
    }

    if let Some(required) = map.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !object.is_required(name) {
                object.required.push(name.to_string());
            }
        }
    }

    object.additional_properties = match map.get("additionalProperties") {
        None => None,
        Some(Value::Bool(true)) => Some(AdditionalProperties::Allow),
        Some(Value::Bool(false)) => Some(AdditionalProperties::Deny),
        Some(schema @ Value::Object(_)) => Some(AdditionalProperties::Schema(Box::new(
            parse_node(schema, &pointer_child(path, "additionalProperties"))?,
        ))),
        Some(other) => {
            return Err(invalid(
                &pointer_child(path, "additionalProperties"),
                format!("expected boolean or schema, got {}", json_type_name(other)),
            ))
        }
    };

    Ok(object)
}

// --- Serialization ---

fn write_type(out: &mut Map<String, Value>, names: Vec<&'static str>, nullable: Nullable) {
    let mut names: Vec<Value> = names.into_iter().map(Value::from).collect();
    if nullable == Nullable::TypeArray {
        names.push(Value::from("null"));
    }
    match names.len() {
        0 => {}
        1 => {
            out.insert("type".into(), names.remove(0));
        }
        _ => {
            out.insert("type".into(), Value::Array(names));
        }
    }
}

fn write_node(node: &SchemaNode) -> Map<String, Value> {
    let mut out = Map::new();

    match &node.kind {
        SchemaKind::Any => {}
        SchemaKind::Never => {
            out.insert("not".into(), Value::Object(Map::new()));
        }
        SchemaKind::Ref(pointer) => {
            out.insert("$ref".into(), Value::from(pointer.as_str()));
        }
        SchemaKind::Scalar(s) => {
            write_type(
                &mut out,
                s.types.iter().map(|t| t.as_str()).collect(),
                node.nullable,
            );
            if let Some(format) = &s.format {
                out.insert("format".into(), Value::from(format.as_str()));
            }
            if let Some(min) = &s.minimum {
                out.insert("minimum".into(), Value::Number(min.clone()));
                if s.exclusive_minimum {
                    out.insert("exclusiveMinimum".into(), Value::Bool(true));
                }
            }
            if let Some(max) = &s.maximum {
                out.insert("maximum".into(), Value::Number(max.clone()));
                if s.exclusive_maximum {
                    out.insert("exclusiveMaximum".into(), Value::Bool(true));
                }
            }
            if let Some(m) = &s.multiple_of {
                out.insert("multipleOf".into(), Value::Number(m.clone()));
            }
            if let Some(n) = s.min_length {
                out.insert("minLength".into(), Value::from(n));
            }
            if let Some(n) = s.max_length {
                out.insert("maxLength".into(), Value::from(n));
            }
            if let Some(pattern) = &s.pattern {
                out.insert("pattern".into(), Value::from(pattern.as_str()));
            }
        }
        SchemaKind::Array(a) => {
            write_type(&mut out, vec!["array"], node.nullable);
            if let Some(items) = &a.items {
                out.insert("items".into(), items.to_value());
            }
            if let Some(n) = a.min_items {
                out.insert("minItems".into(), Value::from(n));
            }
            if let Some(n) = a.max_items {
                out.insert("maxItems".into(), Value::from(n));
            }
            if a.unique_items {
                out.insert("uniqueItems".into(), Value::Bool(true));
            }
        }
        SchemaKind::Object(o) => {
            write_type(&mut out, vec!["object"], node.nullable);
            if !o.properties.is_empty() {
                let props: Map<String, Value> = o
                    .properties
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_value()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
            }
            if !o.required.is_empty() {
                out.insert(
                    "required".into(),
                    Value::Array(o.required.iter().map(|r| Value::from(r.as_str())).collect()),
                );
            }
            match &o.additional_properties {
                None => {}
                Some(AdditionalProperties::Allow) => {
                    out.insert("additionalProperties".into(), Value::Bool(true));
                }
                Some(AdditionalProperties::Deny) => {
                    out.insert("additionalProperties".into(), Value::Bool(false));
                }
                Some(AdditionalProperties::Schema(schema)) => {
                    out.insert("additionalProperties".into(), schema.to_value());
                }
            }
            if let Some(n) = o.min_properties {
                out.insert("minProperties".into(), Value::from(n));
            }
            if let Some(n) = o.max_properties {
                out.insert("maxProperties".into(), Value::from(n));
            }
        }
        SchemaKind::Composite(c) => {
            out.insert(
                c.kind.keyword().into(),
                Value::Array(c.members.iter().map(SchemaNode::to_value).collect()),
            );
        }
    }

    match node.nullable {
        Nullable::Flag => {
            out.insert("nullable".into(), Value::Bool(true));
        }
        Nullable::Legacy => {
            out.insert(LEGACY_NULLABLE_KEY.into(), Value::Bool(true));
        }
        // Untyped nodes have no type array to carry `"null"`.
        Nullable::TypeArray if node.type_name().is_none() => {
            out.insert("nullable".into(), Value::Bool(true));
        }
        Nullable::TypeArray | Nullable::Absent => {}
    }

    let meta = &node.meta;
    if let Some(title) = &meta.title {
        out.insert("title".into(), Value::from(title.as_str()));
    }
    if let Some(description) = &meta.description {
        out.insert("description".into(), Value::from(description.as_str()));
    }
    if let Some(default) = &meta.default {
        out.insert("default".into(), default.clone());
    }
    if let Some(values) = &meta.enum_values {
        out.insert("enum".into(), Value::Array(values.clone()));
    }
    if meta.deprecated {
        out.insert("deprecated".into(), Value::Bool(true));
    }
    if let Some(example) = &meta.example {
        out.insert("example".into(), example.clone());
    }

    out
}
