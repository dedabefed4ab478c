use std::collections::BTreeSet;

use super::{AuthConfigError, EntityAuthConfig, ParentChainNode, ResolveMode};
use crate::matrix::ParentRolePermissions;

const MAX_IDENTIFIER_LEN: usize = 63;

/// Matrix entries that can never produce a grant because the parent chain
/// has no node to reach them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InertGrant {
    UnmatchedParentKey { path: String, key: String },
    NestedChainWithoutChildren { path: String, key: String },
}

/// Accepts plain, unquoted SQL identifiers: a letter or underscore followed by
/// letters, digits or underscores.
pub fn is_valid_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    identifier.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(super) fn validate_chain(nodes: &[ParentChainNode], path: &str) -> Result<(), AuthConfigError> {
    let mut keys = BTreeSet::new();

    for node in nodes {
        if node.key.trim().is_empty() {
            return Err(AuthConfigError::EmptyChainAttribute {
                path: path.to_string(),
                attribute: "key",
            });
        }
        let node_path = format!("{path}.{}", node.key);

        if !keys.insert(node.key.as_str()) {
            return Err(AuthConfigError::DuplicateChainKey {
                path: path.to_string(),
                key: node.key.clone(),
            });
        }
        if node.object_type.trim().is_empty() {
            return Err(AuthConfigError::EmptyChainAttribute {
                path: node_path,
                attribute: "object type",
            });
        }

        match &node.resolve {
            ResolveMode::Field { field } if field.trim().is_empty() => {
                return Err(AuthConfigError::EmptyChainAttribute {
                    path: node_path,
                    attribute: "field",
                });
            }
            ResolveMode::Field { .. } => {}
            ResolveMode::Junction { junction } => {
                for identifier in [
                    &junction.table,
                    &junction.child_column,
                    &junction.parent_column,
                ] {
                    if !is_valid_identifier(identifier) {
                        return Err(AuthConfigError::InvalidJunctionIdentifier {
                            path: node_path,
                            identifier: identifier.clone(),
                        });
                    }
                }
            }
        }

        validate_chain(&node.children, &node_path)?;
    }

    Ok(())
}

pub fn detect_inert_grants(config: &EntityAuthConfig) -> Vec<InertGrant> {
    let mut inert = Vec::new();
    collect_inert(
        config.parent_chain(),
        &config.matrix().parent_role_permissions,
        config.object_type(),
        &mut inert,
    );
    inert
}

fn collect_inert(
    nodes: &[ParentChainNode],
    permissions: &ParentRolePermissions,
    path: &str,
    out: &mut Vec<InertGrant>,
) {
    for (key, entry) in permissions {
        let Some(node) = nodes.iter().find(|n| &n.key == key) else {
            out.push(InertGrant::UnmatchedParentKey {
                path: path.to_string(),
                key: key.clone(),
            });
            continue;
        };

        if !entry.has_nested_chain() {
            continue;
        }
        if node.children.is_empty() {
            out.push(InertGrant::NestedChainWithoutChildren {
                path: path.to_string(),
                key: key.clone(),
            });
            continue;
        }
        collect_inert(
            &node.children,
            &entry.parent_role_permissions,
            &format!("{path}.{key}"),
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_config::JunctionDescriptor;
    use crate::matrix::{MatrixNode, OperationGrants, PermissionMatrix};

    fn config(chain: Vec<ParentChainNode>, matrix: PermissionMatrix) -> EntityAuthConfig {
        EntityAuthConfig::new("document", matrix, chain, vec![]).unwrap()
    }

    #[test]
    fn identifiers_accept_plain_names() {
        assert!(is_valid_identifier("bb_building_resource"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("building_id2"));
    }

    #[test]
    fn identifiers_reject_injection_and_oddities() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("bb_resource; DROP TABLE bb_permission"));
        assert!(!is_valid_identifier("schema.table"));
        assert!(!is_valid_identifier(&"a".repeat(64)));
    }

    #[test]
    fn rejects_duplicate_sibling_keys() {
        let err = EntityAuthConfig::new(
            "document",
            PermissionMatrix::new(),
            vec![
                ParentChainNode::field("owner", "building", "owner_id"),
                ParentChainNode::field("owner", "resource", "owner_id"),
            ],
            vec![],
        )
        .unwrap_err();

        assert_eq!(
            err,
            AuthConfigError::DuplicateChainKey {
                path: "document".to_string(),
                key: "owner".to_string(),
            }
        );
    }

    #[test]
    fn rejects_empty_field_name() {
        let err = EntityAuthConfig::new(
            "document",
            PermissionMatrix::new(),
            vec![ParentChainNode::field("owner", "building", "")],
            vec![],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AuthConfigError::EmptyChainAttribute { attribute: "field", .. }
        ));
    }

    #[test]
    fn rejects_bad_junction_identifier_in_child() {
        let err = EntityAuthConfig::new(
            "document",
            PermissionMatrix::new(),
            vec![
                ParentChainNode::field("owner", "resource", "owner_id").with_child(
                    ParentChainNode::junction(
                        "building",
                        "building",
                        JunctionDescriptor::new("bb_building_resource", "resource id", "building_id"),
                    ),
                ),
            ],
            vec![],
        )
        .unwrap_err();

        assert_eq!(
            err,
            AuthConfigError::InvalidJunctionIdentifier {
                path: "document.owner.building".to_string(),
                identifier: "resource id".to_string(),
            }
        );
    }

    #[test]
    fn detects_parent_key_without_chain_node() {
        let cfg = config(
            vec![ParentChainNode::field("owner", "building", "owner_id")],
            PermissionMatrix::new()
                .with_parent("owner", MatrixNode::new())
                .with_parent("season", MatrixNode::new()),
        );

        assert_eq!(
            detect_inert_grants(&cfg),
            vec![InertGrant::UnmatchedParentKey {
                path: "document".to_string(),
                key: "season".to_string(),
            }]
        );
    }

    #[test]
    fn detects_nested_chain_without_children() {
        let cfg = config(
            vec![ParentChainNode::field("owner", "resource", "owner_id")],
            PermissionMatrix::new().with_parent(
                "owner",
                MatrixNode::new().with_parent(
                    "building",
                    MatrixNode::new().with_role("manager", OperationGrants::all()),
                ),
            ),
        );

        assert_eq!(
            detect_inert_grants(&cfg),
            vec![InertGrant::NestedChainWithoutChildren {
                path: "document".to_string(),
                key: "owner".to_string(),
            }]
        );
    }

    #[test]
    fn fully_wired_chain_has_no_inert_grants() {
        let cfg = config(
            vec![
                ParentChainNode::field("owner", "resource", "owner_id").with_child(
                    ParentChainNode::junction(
                        "building",
                        "building",
                        JunctionDescriptor::new("bb_building_resource", "resource_id", "building_id"),
                    ),
                ),
            ],
            PermissionMatrix::new().with_parent(
                "owner",
                MatrixNode::new().with_parent(
                    "building",
                    MatrixNode::new().with_role("manager", OperationGrants::all()),
                ),
            ),
        );

        assert!(detect_inert_grants(&cfg).is_empty());
    }
}
