//! Nullability encoding for the target OpenAPI version.
//!
//! Every stage before this one works in the 3.0.x encoding, where nullability is a
//! `nullable: true` sibling. 3.1+ has no `nullable` keyword and folds `null` into the type
//! instead:
//!
//! | 3.0.x                                  | 3.1+                                              |
//! |----------------------------------------|---------------------------------------------------|
//! | `{type: T, nullable: true}`            | `{type: [T, "null"]}`, `null` added to any `enum` |
//! | `{allOf: [...], ..., nullable: true}`  | `{anyOf: [{allOf: [...], ...}, {type: "null"}]}`  |
//! | `{oneOf: [...], nullable: true}`       | `{oneOf: [..., {type: "null"}]}`                  |
//!
//! Both directions are implemented so a 3.1 document can be brought back to 3.0.x
//! losslessly.

use crate::error::{Error, Result};
use crate::openapi_builder::{for_each_path_schema_mut, Paths};
use crate::schema::{SchemaNode, SchemaPool, SchemaType};
use log::debug;
use serde_json::Value;
use std::fmt;

const NULL_TYPE: &str = "null";

/// Nullability encoding family of an OpenAPI version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenApiVersion {
    /// 3.0.x, `nullable` sibling
    V30,
    /// 3.1.x and 3.2.x, `null` folded into the type
    V31,
}

impl OpenApiVersion {
    /// Classify a version string such as `3.0.3` or `3.1.0`
    pub fn parse(version: &str) -> Result<Self> {
        let mut parts = version.trim().split('.');
        let major = parts.next();
        let minor = parts.next();
        match (major, minor) {
            (Some("3"), Some("0")) => Ok(OpenApiVersion::V30),
            (Some("3"), Some("1")) | (Some("3"), Some("2")) => Ok(OpenApiVersion::V31),
            _ => Err(Error::UnsupportedVersion(version.to_string())),
        }
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenApiVersion::V30 => write!(f, "3.0"),
            OpenApiVersion::V31 => write!(f, "3.1"),
        }
    }
}

/// Re-encode nullability in every schema of the paths and the pool
pub fn transform_version(
    mut paths: Paths,
    mut pool: SchemaPool,
    current: OpenApiVersion,
    target: OpenApiVersion,
) -> (Paths, SchemaPool) {
    if current == target {
        return (paths, pool);
    }
    debug!("Transforming schemas from OpenAPI {} to {}", current, target);

    let transform: fn(&mut SchemaNode) = match target {
        OpenApiVersion::V31 => upgrade_node,
        OpenApiVersion::V30 => downgrade_node,
    };
    for_each_path_schema_mut(&mut paths, transform);
    for schema in pool.values_mut() {
        transform(schema);
    }

    (paths, pool)
}

fn null_member() -> SchemaNode {
    SchemaNode::null()
}

/// 3.0.x -> 3.1+
pub fn upgrade_node(node: &mut SchemaNode) {
    for child in node.children_mut() {
        upgrade_node(child);
    }

    match node.nullable.take() {
        Some(true) => {}
        // `nullable: false` is the default and has no 3.1 spelling
        _ => return,
    }

    if let Some(reference) = node.reference.take() {
        node.any_of = vec![
            SchemaNode {
                reference: Some(reference),
                ..Default::default()
            },
            null_member(),
        ];
    } else if !node.all_of.is_empty() && node.any_of.is_empty() {
        // Siblings such as `type: object` would reject null, so they move into the branch
        let mut wrapped = std::mem::take(node);
        *node = wrapped.take_metadata();
        node.any_of = vec![wrapped, null_member()];
    } else if !node.one_of.is_empty() {
        push_null_member(&mut node.one_of);
    } else if !node.any_of.is_empty() {
        push_null_member(&mut node.any_of);
    } else if let Some(schema_type) = node.schema_type.take() {
        if let Some(values) = &mut node.enum_values {
            if !values.contains(&Value::Null) {
                values.push(Value::Null);
            }
        }
        node.schema_type = Some(match schema_type {
            SchemaType::Single(name) if name == NULL_TYPE => SchemaType::Single(name),
            SchemaType::Single(name) => {
                SchemaType::Multiple(vec![name, NULL_TYPE.to_string()])
            }
            SchemaType::Multiple(mut names) => {
                if !names.iter().any(|name| name == NULL_TYPE) {
                    names.push(NULL_TYPE.to_string());
                }
                SchemaType::Multiple(names)
            }
        });
    } else {
        // Untyped node: the whole node becomes the non-null branch
        let inner = std::mem::take(node);
        node.any_of = vec![inner, null_member()];
    }
}

fn push_null_member(members: &mut Vec<SchemaNode>) {
    if !members.iter().any(SchemaNode::is_null_type) {
        members.push(null_member());
    }
}

/// 3.1+ -> 3.0.x
pub fn downgrade_node(node: &mut SchemaNode) {
    for child in node.children_mut() {
        downgrade_node(child);
    }

    if let Some(SchemaType::Multiple(names)) = &node.schema_type {
        if names.iter().any(|name| name == NULL_TYPE) && names.len() > 1 {
            let mut remaining: Vec<String> = names
                .iter()
                .filter(|name| *name != NULL_TYPE)
                .cloned()
                .collect();
            node.schema_type = Some(if remaining.len() == 1 {
                SchemaType::Single(remaining.remove(0))
            } else {
                SchemaType::Multiple(remaining)
            });
            node.nullable = Some(true);
            if let Some(values) = &mut node.enum_values {
                values.retain(|value| !value.is_null());
            }
        }
    }

    if strip_null_members(&mut node.one_of) {
        node.nullable = Some(true);
    }

    if strip_null_members(&mut node.any_of) {
        node.nullable = Some(true);
        let sole_branch = node.any_of.len() == 1
            && node.reference.is_none()
            && node.schema_type.is_none()
            && node.one_of.is_empty()
            && node.all_of.is_empty();
        if sole_branch {
            let member = node.any_of.remove(0);
            if member.is_all_of_only() {
                node.all_of = member.all_of;
            } else if is_bare_ref(&member) {
                // `$ref` cannot carry siblings in 3.0.x
                node.all_of = vec![member];
            } else {
                let metadata = std::mem::take(node).take_metadata();
                *node = SchemaNode {
                    nullable: Some(true),
                    ..member
                };
                node.restore_metadata(metadata);
            }
        }
    }
}

fn is_bare_ref(node: &SchemaNode) -> bool {
    node.reference.is_some()
        && *node
            == SchemaNode {
                reference: node.reference.clone(),
                ..Default::default()
            }
}

/// Remove `{type: "null"}` members; true if any was removed and others remain
fn strip_null_members(members: &mut Vec<SchemaNode>) -> bool {
    if members.len() < 2 || !members.iter().any(SchemaNode::is_null_type) {
        return false;
    }
    members.retain(|member| !member.is_null_type());
    !members.is_empty()
}
