mod authorize;

pub use authorize::{AuthorizationService, AuthorizeRequest};

use std::collections::BTreeSet;

use serde::Serialize;

use crate::auth_config::JunctionDescriptor;
use crate::entity::{Entity, SubjectId};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("permission repository error: {0}")]
    Repository(String),

    #[error("administrator check failed: {0}")]
    AdminCheck(String),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application whose administrators bypass every matrix.
    pub admin_scope: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin_scope: "booking".to_string(),
        }
    }
}

/// Outcome of an authorization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "fields", rename_all = "snake_case")]
pub enum Decision {
    Denied,
    GrantedFull,
    /// Only produced for `write`.
    GrantedFields(BTreeSet<String>),
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, Decision::Denied)
    }

    pub fn fields(&self) -> Option<&BTreeSet<String>> {
        match self {
            Decision::GrantedFields(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn allows_field(&self, field: &str) -> bool {
        match self {
            Decision::Denied => false,
            Decision::GrantedFull => true,
            Decision::GrantedFields(fields) => fields.contains(field),
        }
    }

    /// Restricts a proposed update to the fields this decision may write.
    /// A full grant still keeps only the declared `all_fields`.
    pub fn filter_update(&self, update: &Entity, all_fields: &[String]) -> Entity {
        let mut filtered = update.clone();
        match self {
            Decision::Denied => filtered.retain(|_| false),
            Decision::GrantedFull => filtered.retain(|name| all_fields.iter().any(|f| f == name)),
            Decision::GrantedFields(fields) => filtered.retain(|name| fields.contains(name)),
        }
        filtered
    }
}

/// Role lookups the engine needs from the surrounding system.
///
/// Results are treated as a snapshot for the duration of one `authorize` call.
pub trait PermissionRepository: Send + Sync {
    fn global_roles(
        &self,
        subject: SubjectId,
    ) -> impl Future<Output = Result<Vec<String>, AuthzError>> + Send;

    fn object_roles(
        &self,
        subject: SubjectId,
        object_id: i64,
        object_type: &str,
    ) -> impl Future<Output = Result<Vec<String>, AuthzError>> + Send;

    /// `Ok(None)` when the child has no parent through this junction.
    fn resolve_junction_parent_id(
        &self,
        child_id: i64,
        junction: &JunctionDescriptor,
    ) -> impl Future<Output = Result<Option<i64>, AuthzError>> + Send;
}

pub trait AdminCheck: Send + Sync {
    fn is_administrator(
        &self,
        subject: SubjectId,
        scope: &str,
    ) -> impl Future<Output = Result<bool, AuthzError>> + Send;
}

/// Nobody is an administrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdministrators;

impl AdminCheck for NoAdministrators {
    async fn is_administrator(&self, _subject: SubjectId, _scope: &str) -> Result<bool, AuthzError> {
        Ok(false)
    }
}
