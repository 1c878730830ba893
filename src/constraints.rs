//! Merging of externally extracted validation constraints.
//!
//! A separate collaborator reads class-validator style decorators and hands over, per
//! class, a `{property: {constraint keys}}` map plus a list of required property names.
//! Nothing is re-derived here: constraint keys are shallow-merged onto the generated
//! property node, and explicit keys (including `type`) win over inferred ones.

use crate::error::{Error, Result};
use crate::schema::{SchemaNode, SchemaPool};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Constraints extracted for one class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassConstraints {
    /// Property name -> constraint keys, e.g. `{"minLength": 3, "format": "email"}`
    pub properties: IndexMap<String, Map<String, Value>>,
    /// Property names that must be present
    pub required: Vec<String>,
}

/// Class name -> extracted constraints
pub type ConstraintMap = IndexMap<String, ClassConstraints>;

/// Merge constraints onto the matching schemas of the pool
pub fn merge_constraints(mut pool: SchemaPool, constraints: &ConstraintMap) -> Result<SchemaPool> {
    for (class, class_constraints) in constraints {
        let Some(schema) = pool.get_mut(class) else {
            debug!("Skipping constraints for `{}`: schema not in output", class);
            continue;
        };

        for (property, keys) in &class_constraints.properties {
            let Some(node) = schema.properties.get_mut(property) else {
                debug!(
                    "Skipping constraints for `{}.{}`: no such property",
                    class, property
                );
                continue;
            };
            let merged = merge_property(node, keys).map_err(|source| Error::InvalidConstraint {
                schema: class.clone(),
                property: property.clone(),
                source,
            })?;
            *node = merged;
        }

        for name in &class_constraints.required {
            if !schema.required.contains(name) {
                schema.required.push(name.clone());
            }
        }
    }

    Ok(pool)
}

/// Shallow-merge constraint keys onto one property node
fn merge_property(
    node: &SchemaNode,
    keys: &Map<String, Value>,
) -> std::result::Result<SchemaNode, serde_json::Error> {
    if keys.is_empty() {
        return Ok(node.clone());
    }

    // A 3.0.x `$ref` ignores its siblings, so constraints go next to an allOf wrapper
    let base = if node.reference.is_some() && !keys.contains_key("$ref") {
        SchemaNode {
            all_of: vec![SchemaNode {
                reference: node.reference.clone(),
                ..Default::default()
            }],
            reference: None,
            ..node.clone()
        }
    } else {
        node.clone()
    };

    let mut value = serde_json::to_value(&base)?;
    if let Value::Object(object) = &mut value {
        for (key, constraint) in keys {
            object.insert(key.clone(), constraint.clone());
        }
    }
    serde_json::from_value(value)
}
