use std::collections::{BTreeMap, BTreeSet};

use crate::entity::Operation;

/// Raw permission value for one operation at one matrix node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    Allowed,
    Denied,
    /// Write-only: the fields that may be written.
    Fields(BTreeSet<String>),
}

impl Grant {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Grant::Fields(fields.into_iter().map(Into::into).collect())
    }
}

impl From<bool> for Grant {
    fn from(allowed: bool) -> Self {
        if allowed { Grant::Allowed } else { Grant::Denied }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationGrants {
    grants: BTreeMap<Operation, Grant>,
}

impl OperationGrants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation set to `Grant::Allowed`.
    pub fn all() -> Self {
        Operation::ALL
            .into_iter()
            .fold(Self::new(), |grants, op| grants.with(op, Grant::Allowed))
    }

    pub fn with(mut self, operation: Operation, grant: impl Into<Grant>) -> Self {
        self.insert(operation, grant);
        self
    }

    pub fn insert(&mut self, operation: Operation, grant: impl Into<Grant>) {
        self.grants.insert(operation, grant.into());
    }

    pub fn get(&self, operation: Operation) -> Option<&Grant> {
        self.grants.get(&operation)
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Operation, &Grant)> {
        self.grants.iter().map(|(op, grant)| (*op, grant))
    }
}

pub type RoleGrants = BTreeMap<String, OperationGrants>;

pub type ParentRolePermissions = BTreeMap<String, MatrixNode>;

/// Matrix entry for one parent key: role grants evaluated against roles held
/// on the resolved parent, plus an optional grandparent level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixNode {
    pub roles: RoleGrants,
    pub parent_role_permissions: ParentRolePermissions,
}

impl MatrixNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: impl Into<String>, grants: OperationGrants) -> Self {
        self.roles.insert(role.into(), grants);
        self
    }

    pub fn with_parent(mut self, key: impl Into<String>, node: MatrixNode) -> Self {
        self.parent_role_permissions.insert(key.into(), node);
        self
    }

    pub fn has_nested_chain(&self) -> bool {
        !self.parent_role_permissions.is_empty()
    }
}

/// Top level of an object type's permission matrix.
///
/// `direct_roles` holds every non-reserved key: grants for roles held on the
/// object instance itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
    pub default: OperationGrants,
    pub global: RoleGrants,
    pub direct_roles: RoleGrants,
    pub parent_role_permissions: ParentRolePermissions,
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, operation: Operation, grant: impl Into<Grant>) -> Self {
        self.default.insert(operation, grant);
        self
    }

    pub fn with_global_role(mut self, role: impl Into<String>, grants: OperationGrants) -> Self {
        self.global.insert(role.into(), grants);
        self
    }

    pub fn with_direct_role(mut self, role: impl Into<String>, grants: OperationGrants) -> Self {
        self.direct_roles.insert(role.into(), grants);
        self
    }

    pub fn with_parent(mut self, key: impl Into<String>, node: MatrixNode) -> Self {
        self.parent_role_permissions.insert(key.into(), node);
        self
    }
}
