//! Elision of pure-alias schemas.
//!
//! A schema whose only semantic content is a `$ref` adds nothing to the document, so every
//! reference to it is redirected to the end of its alias chain and the alias is dropped.
//! Chains that loop back on themselves are left exactly as they are.

use crate::openapi_builder::{rewrite_all_refs, Paths};
use crate::schema::{ref_name, SchemaPool};
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

/// Where following an alias chain ends up
#[derive(Debug, PartialEq, Eq)]
enum ChainEnd {
    /// A non-alias schema, or the first node of a cycle the start is not part of
    Target(String),
    /// The chain returns to its start
    Cycle,
    /// The chain runs into a name that is not in the pool
    Dangling(String),
    /// The alias points outside `#/components/schemas/`
    External(String),
}

fn follow_chain(start: &str, pool: &SchemaPool) -> ChainEnd {
    let mut visited: IndexSet<&str> = IndexSet::new();
    visited.insert(start);

    let Some(reference) = pool.get(start).and_then(|schema| schema.reference.as_deref()) else {
        return ChainEnd::Target(start.to_string());
    };
    let Some(mut current) = ref_name(reference) else {
        return ChainEnd::External(reference.to_string());
    };

    loop {
        if current == start {
            return ChainEnd::Cycle;
        }
        if visited.contains(current) {
            return ChainEnd::Target(current.to_string());
        }
        let Some(schema) = pool.get(current) else {
            return ChainEnd::Dangling(current.to_string());
        };
        if !schema.is_pure_alias() {
            return ChainEnd::Target(current.to_string());
        }
        visited.insert(current);
        match schema.ref_target() {
            Some(next) => current = next,
            None => return ChainEnd::Target(current.to_string()),
        }
    }
}

/// Collapse every pure alias not taking part in a cycle
pub fn collapse_aliases(mut paths: Paths, mut pool: SchemaPool) -> (Paths, SchemaPool) {
    let mut redirects: IndexMap<String, String> = IndexMap::new();

    for (name, schema) in &pool {
        if !schema.is_pure_alias() {
            continue;
        }
        match follow_chain(name, &pool) {
            ChainEnd::Target(target) if target == *name => {}
            ChainEnd::Target(target) => {
                debug!("Collapsing alias `{}` into `{}`", name, target);
                redirects.insert(name.clone(), target);
            }
            ChainEnd::Cycle => {
                debug!("Keeping alias `{}`: it is part of a reference cycle", name);
            }
            ChainEnd::Dangling(missing) => {
                warn!(
                    "Keeping alias `{}`: its chain ends at missing schema `{}`",
                    name, missing
                );
            }
            ChainEnd::External(reference) => {
                debug!("Keeping alias `{}`: it points outside the document ({})", name, reference);
            }
        }
    }

    if redirects.is_empty() {
        return (paths, pool);
    }

    pool.retain(|name, _| !redirects.contains_key(name));
    rewrite_all_refs(&mut paths, &mut pool, &|name: &str| redirects.get(name).cloned());

    (paths, pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{HttpMethod, MethodDescriptor};
    use crate::openapi_builder::{path_schemas, PathItem};
    use crate::operation_assembler::OperationAssembler;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paths_returning(type_text: &str) -> Paths {
        let mut descriptor = MethodDescriptor::new(HttpMethod::Get, "/items", "list");
        descriptor.return_type = Some(type_text.to_string());
        let (path, operation) = OperationAssembler::default().assemble(&descriptor);
        let mut paths = Paths::new();
        paths.entry(path).or_insert_with(PathItem::default).get = Some(operation);
        paths
    }

    fn pool_from(value: serde_json::Value) -> SchemaPool {
        serde_json::from_value(value).unwrap()
    }

    fn response_ref(paths: &Paths) -> Option<String> {
        path_schemas(paths)[0].ref_target().map(str::to_string)
    }

    #[test]
    fn test_alias_with_description_collapsed() {
        let pool = pool_from(json!({
            "UserAlias": {"$ref": "#/components/schemas/User", "description": "alias"},
            "User": {"type": "object"},
            "Team": {"type": "object", "properties": {"lead": {"$ref": "#/components/schemas/UserAlias"}}}
        }));

        let (paths, pool) = collapse_aliases(paths_returning("UserAlias"), pool);

        assert_eq!(response_ref(&paths).as_deref(), Some("User"));
        assert!(!pool.contains_key("UserAlias"));
        assert_eq!(
            pool["Team"].properties["lead"].ref_target(),
            Some("User")
        );
    }

    #[test]
    fn test_nullable_ref_not_collapsed() {
        let pool = pool_from(json!({
            "MaybeUser": {"$ref": "#/components/schemas/User", "nullable": true},
            "User": {"type": "object"}
        }));

        let (paths, pool) = collapse_aliases(paths_returning("MaybeUser"), pool);
        assert_eq!(response_ref(&paths).as_deref(), Some("MaybeUser"));
        assert!(pool.contains_key("MaybeUser"));
    }

    #[test]
    fn test_multi_hop_chain_collapses_to_terminal() {
        let pool = pool_from(json!({
            "A": {"$ref": "#/components/schemas/B"},
            "B": {"$ref": "#/components/schemas/C"},
            "C": {"type": "string"}
        }));

        let (paths, pool) = collapse_aliases(paths_returning("A"), pool);
        assert_eq!(response_ref(&paths).as_deref(), Some("C"));
        assert_eq!(pool.keys().collect::<Vec<_>>(), vec!["C"]);
    }

    #[test]
    fn test_cycle_preserved_byte_for_byte() {
        let pool = pool_from(json!({
            "A": {"$ref": "#/components/schemas/B", "description": "a"},
            "B": {"$ref": "#/components/schemas/A"}
        }));
        let before = serde_json::to_string(&pool).unwrap();

        let (paths, collapsed) = collapse_aliases(paths_returning("A"), pool);
        assert_eq!(serde_json::to_string(&collapsed).unwrap(), before);
        assert_eq!(response_ref(&paths).as_deref(), Some("A"));
    }

    #[test]
    fn test_chain_into_cycle_stops_at_first_cycle_node() {
        let pool = pool_from(json!({
            "Entry": {"$ref": "#/components/schemas/A"},
            "A": {"$ref": "#/components/schemas/B"},
            "B": {"$ref": "#/components/schemas/A"}
        }));

        let (paths, pool) = collapse_aliases(paths_returning("Entry"), pool);
        assert_eq!(response_ref(&paths).as_deref(), Some("A"));
        assert_eq!(pool.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(pool["A"].ref_target(), Some("B"));
        assert_eq!(pool["B"].ref_target(), Some("A"));
    }

    #[test]
    fn test_self_alias_is_a_cycle() {
        let pool = pool_from(json!({"Loop": {"$ref": "#/components/schemas/Loop"}}));
        let (_, pool) = collapse_aliases(paths_returning("Loop"), pool);
        assert!(pool.contains_key("Loop"));
    }

    #[test]
    fn test_dangling_alias_kept() {
        let pool = pool_from(json!({"A": {"$ref": "#/components/schemas/Missing"}}));
        let (paths, pool) = collapse_aliases(paths_returning("A"), pool);
        assert!(pool.contains_key("A"));
        assert_eq!(response_ref(&paths).as_deref(), Some("A"));
    }

    #[test]
    fn test_external_alias_kept() {
        let pool = pool_from(json!({
            "Money": {"$ref": "https://example.com/money.json"},
            "Order": {"type": "object", "properties": {"total": {"$ref": "#/components/schemas/Money"}}}
        }));

        let (_, pool) = collapse_aliases(paths_returning("Order"), pool);
        assert_eq!(pool.keys().collect::<Vec<_>>(), vec!["Money", "Order"]);
        assert_eq!(pool["Order"].properties["total"].ref_target(), Some("Money"));
    }

    #[test]
    fn test_chain_into_external_alias_stops_there() {
        let pool = pool_from(json!({
            "Price": {"$ref": "#/components/schemas/Money"},
            "Money": {"$ref": "https://example.com/money.json"}
        }));

        let (paths, pool) = collapse_aliases(paths_returning("Price"), pool);
        assert_eq!(response_ref(&paths).as_deref(), Some("Money"));
        assert_eq!(pool.keys().collect::<Vec<_>>(), vec!["Money"]);
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let pool = pool_from(json!({
            "Entry": {"$ref": "#/components/schemas/A"},
            "A": {"$ref": "#/components/schemas/B"},
            "B": {"$ref": "#/components/schemas/A"},
            "Alias": {"$ref": "#/components/schemas/Real"},
            "Real": {"type": "object", "properties": {"self": {"$ref": "#/components/schemas/Alias"}}}
        }));

        let once = collapse_aliases(paths_returning("Entry"), pool);
        let twice = collapse_aliases(once.0.clone(), once.1.clone());

        assert_eq!(
            serde_json::to_string(&twice.1).unwrap(),
            serde_json::to_string(&once.1).unwrap()
        );
        assert_eq!(twice.0, once.0);
        assert_eq!(once.1["Real"].properties["self"].ref_target(), Some("Real"));
    }
}
