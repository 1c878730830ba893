//! Schema data model shared by every pipeline stage.
//!
//! [`SchemaNode`] is a JSON-Schema-shaped node restricted to the keys the pipeline reasons
//! about structurally. Everything else (validation constraints such as `minLength`,
//! `maximum`, `pattern`, vendor extensions, ...) is kept verbatim in [`SchemaNode::extra`]
//! and treated as opaque data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix of every local schema reference
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Named collection of schema definitions, in insertion order
pub type SchemaPool = IndexMap<String, SchemaNode>;

/// OpenAPI Schema object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema, a single name or a list of names (3.1+)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Format for primitive types (e.g., "date-time", "binary")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    /// Properties for object types
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,
    /// Required property names for object types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,
    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,
    /// Enum values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// 3.0.x nullability marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Opaque default payload, never scanned for references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Opaque example payload, never scanned for references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Constraints and any other keyword not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Value of a schema's `type` keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    /// 3.1+ type list, e.g. `["string", "null"]`
    Multiple(Vec<String>),
}

/// Value of a schema's `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// Keys that carry no semantics for alias detection
const METADATA_KEYS: &[&str] = &["$comment", "examples", "externalDocs", "deprecated"];

fn is_metadata_key(key: &str) -> bool {
    key.starts_with("x-") || METADATA_KEYS.contains(&key)
}

/// Build a `#/components/schemas/<name>` reference string
pub fn schema_ref(name: &str) -> String {
    format!("{}{}", SCHEMA_REF_PREFIX, name)
}

/// Extract the schema name from a local reference string
pub fn ref_name(reference: &str) -> Option<&str> {
    reference.strip_prefix(SCHEMA_REF_PREFIX)
}

impl SchemaNode {
    /// `{type: <name>}`
    pub fn typed(name: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(name.to_string())),
            ..Default::default()
        }
    }

    /// `{type: <name>, format: <format>}`
    pub fn formatted(name: &str, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::typed(name)
        }
    }

    /// `{type: object}`, the fallback for anything not modelled
    pub fn object() -> Self {
        Self::typed("object")
    }

    /// `{type: "null"}`
    pub fn null() -> Self {
        Self::typed("null")
    }

    /// `{$ref: '#/components/schemas/<name>'}`
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(schema_ref(name)),
            ..Default::default()
        }
    }

    /// `{type: array, items: <items>}`
    pub fn array(items: SchemaNode) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array")
        }
    }

    /// Name of the schema this node references, if it is a local reference
    pub fn ref_target(&self) -> Option<&str> {
        self.reference.as_deref().and_then(ref_name)
    }

    /// The single type name, if the node carries exactly one
    pub fn single_type(&self) -> Option<&str> {
        match &self.schema_type {
            Some(SchemaType::Single(name)) => Some(name),
            _ => None,
        }
    }

    /// True for the bare `{type: "null"}` member used by 3.1+ encodings
    pub fn is_null_type(&self) -> bool {
        *self == Self::null()
    }

    /// True when the node is exactly `{allOf: [...]}` with nothing beside it
    pub fn is_all_of_only(&self) -> bool {
        !self.all_of.is_empty()
            && *self
                == Self {
                    all_of: self.all_of.clone(),
                    ..Default::default()
                }
    }

    /// A pure alias is a node whose only semantic content is a `$ref`.
    ///
    /// Descriptive metadata (`title`, `description`, `example`, `$comment`, `x-*`
    /// extensions, ...) does not disqualify a node; any other keyword does.
    pub fn is_pure_alias(&self) -> bool {
        if self.reference.is_none() {
            return false;
        }
        let stripped = Self {
            reference: self.reference.clone(),
            title: None,
            description: None,
            example: None,
            extra: self
                .extra
                .iter()
                .filter(|(key, _)| !is_metadata_key(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            ..self.clone()
        };
        stripped
            == Self {
                reference: self.reference.clone(),
                ..Default::default()
            }
    }

    /// Move the descriptive metadata out of this node into a node of its own
    pub fn take_metadata(&mut self) -> SchemaNode {
        let (metadata, rest): (Map<String, Value>, Map<String, Value>) =
            std::mem::take(&mut self.extra)
                .into_iter()
                .partition(|(key, _)| is_metadata_key(key));
        self.extra = rest;
        SchemaNode {
            title: self.title.take(),
            description: self.description.take(),
            example: self.example.take(),
            extra: metadata,
            ..Default::default()
        }
    }

    /// Put metadata split off by [`SchemaNode::take_metadata`] back, overriding this node's own
    pub fn restore_metadata(&mut self, metadata: SchemaNode) {
        if metadata.title.is_some() {
            self.title = metadata.title;
        }
        if metadata.description.is_some() {
            self.description = metadata.description;
        }
        if metadata.example.is_some() {
            self.example = metadata.example;
        }
        self.extra.extend(metadata.extra);
    }

    /// Direct structural children: properties, items, composition members and
    /// `additionalProperties`.
    pub fn children(&self) -> Vec<&SchemaNode> {
        let mut children: Vec<&SchemaNode> = self.properties.values().collect();
        if let Some(items) = &self.items {
            children.push(items);
        }
        children.extend(self.one_of.iter());
        children.extend(self.any_of.iter());
        children.extend(self.all_of.iter());
        if let Some(AdditionalProperties::Schema(schema)) = &self.additional_properties {
            children.push(schema);
        }
        children
    }

    /// Mutable counterpart of [`SchemaNode::children`]
    pub fn children_mut(&mut self) -> Vec<&mut SchemaNode> {
        let mut children: Vec<&mut SchemaNode> = self.properties.values_mut().collect();
        if let Some(items) = &mut self.items {
            children.push(items);
        }
        children.extend(self.one_of.iter_mut());
        children.extend(self.any_of.iter_mut());
        children.extend(self.all_of.iter_mut());
        if let Some(AdditionalProperties::Schema(schema)) = &mut self.additional_properties {
            children.push(schema);
        }
        children
    }

    /// Collect every schema name referenced from a structural position, in
    /// depth-first order. Duplicates are kept so callers can count usages.
    pub fn collect_refs(&self, out: &mut Vec<String>) {
        if let Some(name) = self.ref_target() {
            out.push(name.to_string());
        }
        for child in self.children() {
            child.collect_refs(out);
        }
    }

    /// Rewrite every structural reference for which `rename` returns a new name
    pub fn rewrite_refs<F>(&mut self, rename: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let renamed = self.ref_target().and_then(rename);
        if let Some(new_name) = renamed {
            self.reference = Some(schema_ref(&new_name));
        }
        for child in self.children_mut() {
            child.rewrite_refs(rename);
        }
    }
}
