mod loader;
pub mod types;

pub use loader::{DEFAULT_KEY, GLOBAL_KEY, MatrixError, PARENT_ROLE_PERMISSIONS_KEY};
pub use types::{
    Grant, MatrixNode, OperationGrants, ParentRolePermissions, PermissionMatrix, RoleGrants,
};
