//! Reachability-based schema pruning.
//!
//! Only references in structural positions count as edges: parameter, request body and
//! response schemas, and recursively `properties`, `items`, `oneOf`/`anyOf`/`allOf` and
//! `additionalProperties`. References that happen to appear inside opaque payloads such as
//! `default` or `example` never keep a schema alive.

use crate::openapi_builder::{path_schemas, Paths};
use crate::schema::SchemaPool;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

/// Pool pruned to the reachable schemas
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Reachable schemas, in the order of the input pool
    pub schemas: SchemaPool,
    /// Referenced names absent from the pool -> number of references seen
    pub missing: IndexMap<String, usize>,
}

/// Keep exactly the schemas transitively reachable from the paths
pub fn merge_reachable(paths: &Paths, pool: &SchemaPool) -> MergeOutcome {
    let mut worklist = Vec::new();
    for schema in path_schemas(paths) {
        schema.collect_refs(&mut worklist);
    }
    // Pop in discovery order
    worklist.reverse();

    let mut seen: IndexSet<String> = IndexSet::new();
    let mut missing: IndexMap<String, usize> = IndexMap::new();

    while let Some(name) = worklist.pop() {
        let Some(schema) = pool.get(&name) else {
            *missing.entry(name).or_default() += 1;
            continue;
        };
        if !seen.insert(name) {
            continue;
        }
        let mut refs = Vec::new();
        schema.collect_refs(&mut refs);
        worklist.extend(refs.into_iter().rev());
    }

    let schemas: SchemaPool = pool
        .iter()
        .filter(|(name, _)| seen.contains(*name))
        .map(|(name, schema)| (name.clone(), schema.clone()))
        .collect();

    info!(
        "Kept {} of {} schema(s) reachable from paths",
        schemas.len(),
        pool.len()
    );
    for name in pool.keys().filter(|name| !seen.contains(*name)) {
        debug!("Dropping unreachable schema `{}`", name);
    }

    MergeOutcome { schemas, missing }
}

/// Count references, from the paths or from any pooled schema, whose target is not in the
/// pool
pub fn unresolved_refs(paths: &Paths, pool: &SchemaPool) -> IndexMap<String, usize> {
    let mut refs = Vec::new();
    for schema in path_schemas(paths).into_iter().chain(pool.values()) {
        schema.collect_refs(&mut refs);
    }

    let mut unresolved: IndexMap<String, usize> = IndexMap::new();
    for name in refs {
        if !pool.contains_key(&name) {
            *unresolved.entry(name).or_default() += 1;
        }
    }
    unresolved
}
