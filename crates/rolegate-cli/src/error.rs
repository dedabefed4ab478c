use rolegate_core::engine::AuthzError;
use rolegate_core::entity::Operation;
use rolegate_storage::StorageError;

use crate::config::ConfigError;
use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{operation} on '{object_type}' is not permitted")]
    Forbidden {
        object_type: String,
        operation: Operation,
    },

    #[error("authorization error: {0}")]
    Authz(#[from] AuthzError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("entity type registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the caller is at fault (403/404-like) rather than the system
    /// (5xx-like).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::UnknownEntityType(_) | ApiError::InvalidRequest(_) | ApiError::Forbidden { .. }
        )
    }
}
