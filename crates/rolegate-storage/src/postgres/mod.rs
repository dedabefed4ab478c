mod queries;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use rolegate_core::auth_config::JunctionDescriptor;
use rolegate_core::entity::SubjectId;

use crate::traits::{RoleStore, StorageError, validate_identifier, validate_junction};

/// Names of the role assignment tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTables {
    /// Object-scoped assignments: `(id, subject_id, object_id, object_type, role)`.
    pub permission: String,
    /// Global assignments: `(id, subject_id, role)`.
    pub root_permission: String,
}

impl Default for PermissionTables {
    fn default() -> Self {
        Self {
            permission: "bb_permission".to_string(),
            root_permission: "bb_permission_root".to_string(),
        }
    }
}

impl PermissionTables {
    pub fn validate(&self) -> Result<(), StorageError> {
        validate_identifier(&self.permission)?;
        validate_identifier(&self.root_permission)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresRoleStore {
    pool: PgPool,
    tables: PermissionTables,
}

impl PostgresRoleStore {
    pub fn new(pool: PgPool, tables: PermissionTables) -> Result<Self, StorageError> {
        tables.validate()?;
        Ok(Self { pool, tables })
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        tables: PermissionTables,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Self::new(pool, tables)
    }

    pub fn tables(&self) -> &PermissionTables {
        &self.tables
    }
}

impl RoleStore for PostgresRoleStore {
    async fn global_roles(&self, subject: SubjectId) -> Result<Vec<String>, StorageError> {
        queries::global_roles(&self.pool, &self.tables.root_permission, subject.value()).await
    }

    async fn object_roles(
        &self,
        subject: SubjectId,
        object_type: &str,
        object_id: i64,
    ) -> Result<Vec<String>, StorageError> {
        queries::object_roles(
            &self.pool,
            &self.tables.permission,
            subject.value(),
            object_type,
            object_id,
        )
        .await
    }

    async fn junction_parent(
        &self,
        junction: &JunctionDescriptor,
        child_id: i64,
    ) -> Result<Option<i64>, StorageError> {
        validate_junction(junction)?;
        queries::junction_parent(&self.pool, junction, child_id).await
    }
}
