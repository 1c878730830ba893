//! Operation-level and global security requirement merging.
//!
//! An operation without security decorators inherits the global requirement list
//! unchanged. An operation with decorators gets exactly one requirement object: its own
//! schemes AND every scheme of every global entry, with scope lists union-deduplicated.
//! Operation security therefore adds to the global requirements instead of replacing them.

use crate::descriptor::SecurityRequirement;
use crate::openapi_builder::Paths;
use log::debug;

/// Combine several requirement objects with AND into one, deduplicating scopes per scheme
pub fn combine_requirements(requirements: &[SecurityRequirement]) -> SecurityRequirement {
    let mut combined = SecurityRequirement::new();
    for requirement in requirements {
        for (scheme, scopes) in requirement {
            let merged = combined.entry(scheme.clone()).or_default();
            for scope in scopes {
                if !merged.contains(scope) {
                    merged.push(scope.clone());
                }
            }
        }
    }
    combined
}

/// Merge the requirements declared on one operation with the global list
pub fn merge_security(
    operation: &[SecurityRequirement],
    global: &[SecurityRequirement],
) -> Vec<SecurityRequirement> {
    if operation.is_empty() {
        return global.to_vec();
    }
    let all: Vec<SecurityRequirement> = global.iter().chain(operation).cloned().collect();
    vec![combine_requirements(&all)]
}

/// Apply [`merge_security`] to every operation of the document
pub fn apply_security(mut paths: Paths, global: &[SecurityRequirement]) -> Paths {
    for (path, item) in paths.iter_mut() {
        for operation in item.operations_mut() {
            let declared = operation.security.take().unwrap_or_default();
            let merged = merge_security(&declared, global);
            if !declared.is_empty() {
                debug!("Merged operation security on {}: {:?}", path, merged);
            }
            operation.security = (!merged.is_empty()).then_some(merged);
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{HttpMethod, MethodDescriptor};
    use crate::operation_assembler::OperationAssembler;
    use crate::openapi_builder::PathItem;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn requirement(entries: &[(&str, &[&str])]) -> SecurityRequirement {
        entries
            .iter()
            .map(|(scheme, scopes)| {
                (
                    scheme.to_string(),
                    scopes.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_inherits_global_when_undeclared() {
        let global = vec![requirement(&[("bearer", &[])]), requirement(&[("apiKey", &[])])];
        assert_eq!(merge_security(&[], &global), global);
    }

    #[test]
    fn test_operation_scopes_added_to_global() {
        let global = vec![requirement(&[("bearer", &[])])];
        let operation = vec![requirement(&[("oauth2", &["read"])])];

        assert_eq!(
            merge_security(&operation, &global),
            vec![requirement(&[("bearer", &[]), ("oauth2", &["read"])])]
        );
    }

    #[test]
    fn test_scopes_deduplicated_per_scheme() {
        let global = vec![
            requirement(&[("oauth2", &["read"])]),
            requirement(&[("oauth2", &["read", "write"])]),
        ];
        let operation = vec![requirement(&[("oauth2", &["write", "admin"])])];

        assert_eq!(
            merge_security(&operation, &global),
            vec![requirement(&[("oauth2", &["read", "write", "admin"])])]
        );
    }

    #[test]
    fn test_no_global_keeps_operation_requirement() {
        let operation = vec![requirement(&[("bearer", &[])])];
        assert_eq!(merge_security(&operation, &[]), operation);
    }

    #[test]
    fn test_apply_security_over_paths() {
        let assembler = OperationAssembler::default();
        let mut secured = MethodDescriptor::new(HttpMethod::Get, "/admin", "admin");
        secured.security.push(requirement(&[("oauth2", &["admin"])]));
        let open = MethodDescriptor::new(HttpMethod::Get, "/health", "health");

        let mut paths: Paths = IndexMap::new();
        for descriptor in [&secured, &open] {
            let (path, operation) = assembler.assemble(descriptor);
            paths.entry(path).or_insert_with(PathItem::default).get = Some(operation);
        }

        let global = vec![requirement(&[("bearer", &[])])];
        let paths = apply_security(paths, &global);

        assert_eq!(
            paths["/admin"].get.as_ref().unwrap().security,
            Some(vec![requirement(&[("bearer", &[]), ("oauth2", &["admin"])])])
        );
        assert_eq!(paths["/health"].get.as_ref().unwrap().security, Some(global));
    }
}
