use rolegate_core::auth_config::JunctionDescriptor;
use rolegate_core::entity::SubjectId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("invalid SQL identifier: {0}")]
    InvalidIdentifier(String),
    #[error("role assignment already exists: {0}")]
    DuplicateAssignment(String),
    #[error("invalid role seed: {0}")]
    InvalidSeed(String),
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// Read access to the role assignments of the surrounding system.
///
/// Roles are returned in assignment order.
pub trait RoleStore: Send + Sync {
    fn global_roles(
        &self,
        subject: SubjectId,
    ) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    fn object_roles(
        &self,
        subject: SubjectId,
        object_type: &str,
        object_id: i64,
    ) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    fn junction_parent(
        &self,
        junction: &JunctionDescriptor,
        child_id: i64,
    ) -> impl Future<Output = Result<Option<i64>, StorageError>> + Send;
}

pub(crate) fn validate_identifier(identifier: &str) -> Result<(), StorageError> {
    if rolegate_core::auth_config::is_valid_identifier(identifier) {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(identifier.to_string()))
    }
}

pub(crate) fn validate_junction(junction: &JunctionDescriptor) -> Result<(), StorageError> {
    validate_identifier(&junction.table)?;
    validate_identifier(&junction.child_column)?;
    validate_identifier(&junction.parent_column)
}
