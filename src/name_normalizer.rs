//! Readable names for anonymous and generic-structural schemas.
//!
//! Upstream extraction names inline object types with placeholders such as `__type` or
//! `__type_3`, and generic instantiations over them end up as `Paginated<__type_3>`. This
//! module replaces each placeholder with a name derived from the first property that uses
//! it, cascading through candidates until one is free:
//!
//! 1. `PascalCase(property)`
//! 2. `Parent + PascalCase(property)`
//! 3. `Parent + PascalCase(property) + "_N"` for N = 1, 2, ...
//!
//! Names already in the pool that are not placeholders are reserved up front and never
//! handed out. Placeholders nothing references are dropped; a referenced placeholder that
//! no property names keeps its own name.

use crate::openapi_builder::{path_schemas, rewrite_all_refs, Paths};
use crate::schema::{SchemaNode, SchemaPool};
use heck::ToPascalCase;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:__type|__object)(?:_\d+)?$").expect("placeholder pattern is valid")
});

static PLACEHOLDER_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:__type|__object)(?:_\d+)?\b").expect("placeholder token pattern is valid")
});

/// Whether a schema name is an upstream placeholder
pub fn is_placeholder(name: &str) -> bool {
    PLACEHOLDER_RE.is_match(name)
}

/// Placeholder tokens inside the generic argument list of a name like `Wrapper<__type>`
fn placeholder_tokens(name: &str) -> Vec<&str> {
    match name.find('<') {
        Some(open) => PLACEHOLDER_TOKEN_RE
            .find_iter(&name[open..])
            .map(|m| m.as_str())
            .collect(),
        None => Vec::new(),
    }
}

/// Placeholders a reference target stands for: itself, or the ones in its arguments
fn referenced_placeholders(target: &str) -> Vec<&str> {
    if is_placeholder(target) {
        vec![target]
    } else {
        placeholder_tokens(target)
    }
}

/// Set of names already taken, grown as names are handed out
#[derive(Debug, Default)]
pub struct NameRegistry {
    reserved: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name; returns false if it was already taken
    pub fn reserve(&mut self, name: &str) -> bool {
        self.reserved.insert(name.to_string())
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Hand out the first free name of the cascade for a property of `parent`
    pub fn claim(&mut self, parent: &str, property: &str) -> String {
        let property_part = property.to_pascal_case();
        if !property_part.is_empty() && self.reserve(&property_part) {
            return property_part;
        }

        let base = format!("{}{}", identifier_chars(parent), property_part);
        if self.reserve(&base) {
            return base;
        }

        let mut suffix = 1;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if self.reserve(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Drop the characters a generic parent name carries that cannot appear in an identifier
fn identifier_chars(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Schema names a property points at: directly, through a one-level composition wrapper
/// (e.g. the `allOf` of a nullable reference), or through array `items`
fn property_targets(property: &SchemaNode) -> Vec<&str> {
    let mut nodes = vec![property];
    if let Some(items) = &property.items {
        nodes.push(items);
    }

    let mut targets = Vec::new();
    for node in nodes {
        targets.extend(node.ref_target());
        for member in node.all_of.iter().chain(&node.one_of).chain(&node.any_of) {
            targets.extend(member.ref_target());
        }
    }
    targets
}

/// First usage site of every placeholder, in pool and property insertion order
fn collect_usages(pool: &SchemaPool) -> IndexMap<String, (String, String)> {
    let mut usages: IndexMap<String, (String, String)> = IndexMap::new();

    for (parent, schema) in pool {
        for (property, node) in &schema.properties {
            for target in property_targets(node) {
                for placeholder in referenced_placeholders(target) {
                    // A wrapper using its own argument is not a naming site
                    if parent == placeholder || placeholder_tokens(parent).contains(&placeholder) {
                        continue;
                    }
                    usages
                        .entry(placeholder.to_string())
                        .or_insert_with(|| (parent.clone(), property.clone()));
                }
            }
        }
    }

    usages
}

/// Name a placeholder, naming the placeholders its parent is built from first
fn resolve_placeholder(
    placeholder: &str,
    usages: &IndexMap<String, (String, String)>,
    registry: &mut NameRegistry,
    resolved: &mut IndexMap<String, String>,
    visiting: &mut HashSet<String>,
) {
    if resolved.contains_key(placeholder) || !visiting.insert(placeholder.to_string()) {
        return;
    }
    let Some((parent, property)) = usages.get(placeholder) else {
        return;
    };
    for dependency in referenced_placeholders(parent) {
        resolve_placeholder(dependency, usages, registry, resolved, visiting);
    }

    let parent = renamed(parent, resolved).unwrap_or_else(|| parent.clone());
    let name = registry.claim(&parent, property);
    info!(
        "Renaming `{}` to `{}` (used by {}.{})",
        placeholder, name, parent, property
    );
    resolved.insert(placeholder.to_string(), name);
}

/// Every schema name referenced from the paths or from another schema
fn referenced_names(paths: &Paths, pool: &SchemaPool) -> HashSet<String> {
    let mut refs = Vec::new();
    for schema in path_schemas(paths) {
        schema.collect_refs(&mut refs);
    }
    let mut referenced: HashSet<String> = refs.drain(..).collect();
    for (name, schema) in pool {
        schema.collect_refs(&mut refs);
        referenced.extend(refs.drain(..).filter(|target| target != name));
    }
    referenced
}

/// New name for a placeholder or for a generic name embedding placeholders
fn renamed(name: &str, resolved: &IndexMap<String, String>) -> Option<String> {
    if let Some(new_name) = resolved.get(name) {
        return Some(new_name.clone());
    }
    let open = name.find('<')?;
    let arguments = PLACEHOLDER_TOKEN_RE.replace_all(&name[open..], |caps: &Captures| {
        let token = &caps[0];
        resolved
            .get(token)
            .cloned()
            .unwrap_or_else(|| token.to_string())
    });
    let new_name = format!("{}{}", &name[..open], arguments);
    (new_name != name).then_some(new_name)
}

/// Rename placeholder schemas and the generic schemas built over them
pub fn normalize_names(mut paths: Paths, pool: SchemaPool) -> (Paths, SchemaPool) {
    let mut placeholders: IndexSet<String> = IndexSet::new();
    for name in pool.keys() {
        if is_placeholder(name) {
            placeholders.insert(name.clone());
        }
        for token in placeholder_tokens(name) {
            placeholders.insert(token.to_string());
        }
    }
    if placeholders.is_empty() {
        return (paths, pool);
    }

    let mut registry = NameRegistry::new();
    for name in pool.keys().filter(|name| !is_placeholder(name)) {
        registry.reserve(name);
    }

    let usages = collect_usages(&pool);
    let mut resolved: IndexMap<String, String> = IndexMap::new();
    let mut visiting: HashSet<String> = HashSet::new();
    for placeholder in &placeholders {
        resolve_placeholder(placeholder, &usages, &mut registry, &mut resolved, &mut visiting);
    }
    let referenced = referenced_names(&paths, &pool);

    // Wrapper renames that would overwrite an unrelated schema are skipped
    let mut blocked: HashSet<String> = HashSet::new();
    for name in pool.keys() {
        if let Some(new_name) = renamed(name, &resolved) {
            if pool.contains_key(&new_name) && renamed(&new_name, &resolved).is_none() {
                warn!(
                    "Not renaming `{}`: `{}` already exists",
                    name, new_name
                );
                blocked.insert(name.clone());
            }
        }
    }

    let rename = |name: &str| {
        if blocked.contains(name) {
            None
        } else {
            renamed(name, &resolved)
        }
    };

    let mut pool = pool;
    rewrite_all_refs(&mut paths, &mut pool, &rename);

    let mut normalized = SchemaPool::with_capacity(pool.len());
    for (name, schema) in pool {
        if is_placeholder(&name) && !resolved.contains_key(&name) {
            if !referenced.contains(&name) {
                debug!("Dropping placeholder schema `{}`: nothing references it", name);
                continue;
            }
            debug!("Keeping placeholder schema `{}`: no property names it", name);
        }
        let key = rename(&name).unwrap_or(name);
        normalized.insert(key, schema);
    }

    (paths, normalized)
}
