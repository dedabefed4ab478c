use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::types::{
    Grant, MatrixNode, OperationGrants, ParentRolePermissions, PermissionMatrix, RoleGrants,
};
use crate::entity::Operation;

pub const DEFAULT_KEY: &str = "default";
pub const GLOBAL_KEY: &str = "global";
pub const PARENT_ROLE_PERMISSIONS_KEY: &str = "parent_role_permissions";

const ROOT_PATH: &str = "$";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("expected an object at '{path}'")]
    NotAnObject { path: String },

    #[error("unknown operation '{operation}' at '{path}'")]
    UnknownOperation { path: String, operation: String },

    #[error("invalid grant at '{path}': expected a boolean or a map of field names to booleans")]
    InvalidGrant { path: String },

    #[error("field-level grant at '{path}' is only allowed for write")]
    FieldGrantOnNonWrite { path: String },
}

impl PermissionMatrix {
    /// Builds the typed matrix from its nested-map form, splitting the
    /// reserved keys from role names. `null` is an empty matrix.
    pub fn from_value(value: &Value) -> Result<Self, MatrixError> {
        if value.is_null() {
            return Ok(Self::default());
        }

        let map = as_object(value, ROOT_PATH)?;
        let mut matrix = PermissionMatrix::default();

        for (key, entry) in map {
            let path = child_path(ROOT_PATH, key);
            match key.as_str() {
                DEFAULT_KEY => matrix.default = parse_operation_grants(entry, &path)?,
                GLOBAL_KEY => matrix.global = parse_role_grants(entry, &path)?,
                PARENT_ROLE_PERMISSIONS_KEY => {
                    matrix.parent_role_permissions = parse_parent_permissions(entry, &path)?;
                }
                role => {
                    matrix
                        .direct_roles
                        .insert(role.to_string(), parse_operation_grants(entry, &path)?);
                }
            }
        }

        Ok(matrix)
    }
}

fn parse_parent_permissions(
    value: &Value,
    path: &str,
) -> Result<ParentRolePermissions, MatrixError> {
    let mut parents = ParentRolePermissions::new();
    for (key, entry) in as_object(value, path)? {
        let node_path = child_path(path, key);
        parents.insert(key.clone(), parse_matrix_node(entry, &node_path)?);
    }
    Ok(parents)
}

fn parse_matrix_node(value: &Value, path: &str) -> Result<MatrixNode, MatrixError> {
    let mut node = MatrixNode::default();
    for (key, entry) in as_object(value, path)? {
        let entry_path = child_path(path, key);
        if key == PARENT_ROLE_PERMISSIONS_KEY {
            node.parent_role_permissions = parse_parent_permissions(entry, &entry_path)?;
        } else {
            node.roles
                .insert(key.clone(), parse_operation_grants(entry, &entry_path)?);
        }
    }
    Ok(node)
}

fn parse_role_grants(value: &Value, path: &str) -> Result<RoleGrants, MatrixError> {
    let mut roles = RoleGrants::new();
    for (role, entry) in as_object(value, path)? {
        let role_path = child_path(path, role);
        roles.insert(role.clone(), parse_operation_grants(entry, &role_path)?);
    }
    Ok(roles)
}

fn parse_operation_grants(value: &Value, path: &str) -> Result<OperationGrants, MatrixError> {
    let mut grants = OperationGrants::new();
    for (name, entry) in as_object(value, path)? {
        let grant_path = child_path(path, name);
        let operation: Operation = name.parse().map_err(|_| MatrixError::UnknownOperation {
            path: path.to_string(),
            operation: name.clone(),
        })?;
        grants.insert(operation, parse_grant(entry, operation, &grant_path)?);
    }
    Ok(grants)
}

fn parse_grant(value: &Value, operation: Operation, path: &str) -> Result<Grant, MatrixError> {
    match value {
        Value::Bool(allowed) => Ok(Grant::from(*allowed)),
        Value::Object(fields) if operation == Operation::Write => {
            let mut allowed = BTreeSet::new();
            for (field, flag) in fields {
                match flag {
                    Value::Bool(true) => {
                        allowed.insert(field.clone());
                    }
                    Value::Bool(false) => {}
                    _ => {
                        return Err(MatrixError::InvalidGrant {
                            path: child_path(path, field),
                        });
                    }
                }
            }
            Ok(Grant::Fields(allowed))
        }
        Value::Object(_) => Err(MatrixError::FieldGrantOnNonWrite {
            path: path.to_string(),
        }),
        _ => Err(MatrixError::InvalidGrant {
            path: path.to_string(),
        }),
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, MatrixError> {
    value.as_object().ok_or_else(|| MatrixError::NotAnObject {
        path: path.to_string(),
    })
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{parent}.{key}")
}
