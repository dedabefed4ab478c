use std::sync::Arc;

use rolegate_core::auth_config::JunctionDescriptor;
use rolegate_core::engine::{AuthzError, PermissionRepository};
use rolegate_core::entity::SubjectId;
use rolegate_storage::{RoleStore, StorageError};

/// Serves the engine's role lookups from a [`RoleStore`].
pub struct StoreRepository<S: RoleStore> {
    store: Arc<S>,
}

impl<S: RoleStore> StoreRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

fn to_authz_error(e: StorageError) -> AuthzError {
    tracing::error!(error = %e, "role store lookup failed");
    AuthzError::Repository(e.to_string())
}

impl<S: RoleStore> PermissionRepository for StoreRepository<S> {
    async fn global_roles(&self, subject: SubjectId) -> Result<Vec<String>, AuthzError> {
        self.store
            .global_roles(subject)
            .await
            .map_err(to_authz_error)
    }

    async fn object_roles(
        &self,
        subject: SubjectId,
        object_id: i64,
        object_type: &str,
    ) -> Result<Vec<String>, AuthzError> {
        self.store
            .object_roles(subject, object_type, object_id)
            .await
            .map_err(to_authz_error)
    }

    async fn resolve_junction_parent_id(
        &self,
        child_id: i64,
        junction: &JunctionDescriptor,
    ) -> Result<Option<i64>, AuthzError> {
        self.store
            .junction_parent(junction, child_id)
            .await
            .map_err(to_authz_error)
    }
}
