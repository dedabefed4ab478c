use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;

use rolegate_core::auth_config::JunctionDescriptor;
use rolegate_core::entity::SubjectId;

use crate::traits::{RoleStore, StorageError, validate_junction};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ObjectRole {
    subject: SubjectId,
    object_type: String,
    object_id: i64,
    role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct JunctionRow {
    junction: JunctionDescriptor,
    child_id: i64,
    parent_id: i64,
}

#[derive(Debug, Default)]
struct InnerState {
    global: Vec<(SubjectId, String)>,
    object: Vec<ObjectRole>,
    junctions: Vec<JunctionRow>,
}

/// Role store kept in process memory. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleStore {
    state: Arc<Mutex<InnerState>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &RoleSeed) -> Result<Self, StorageError> {
        let store = Self::new();
        for entry in &seed.global {
            store.assign_global_role(SubjectId::new(entry.subject), &entry.role)?;
        }
        for entry in &seed.object {
            store.assign_object_role(
                SubjectId::new(entry.subject),
                &entry.object_type,
                entry.object_id,
                &entry.role,
            )?;
        }
        for entry in &seed.junction {
            let junction = JunctionDescriptor::new(
                &entry.table,
                &entry.child_column,
                &entry.parent_column,
            );
            store.link_junction(&junction, entry.child_id, entry.parent_id)?;
        }
        Ok(store)
    }

    pub fn assign_global_role(&self, subject: SubjectId, role: &str) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if state.global.iter().any(|(s, r)| *s == subject && r == role) {
            return Err(StorageError::DuplicateAssignment(format!(
                "subject {subject} already holds global role '{role}'"
            )));
        }
        state.global.push((subject, role.to_string()));
        Ok(())
    }

    pub fn assign_object_role(
        &self,
        subject: SubjectId,
        object_type: &str,
        object_id: i64,
        role: &str,
    ) -> Result<(), StorageError> {
        let assignment = ObjectRole {
            subject,
            object_type: object_type.to_string(),
            object_id,
            role: role.to_string(),
        };
        let mut state = self.lock()?;
        if state.object.contains(&assignment) {
            return Err(StorageError::DuplicateAssignment(format!(
                "subject {subject} already holds '{role}' on {object_type}:{object_id}"
            )));
        }
        state.object.push(assignment);
        Ok(())
    }

    pub fn link_junction(
        &self,
        junction: &JunctionDescriptor,
        child_id: i64,
        parent_id: i64,
    ) -> Result<(), StorageError> {
        validate_junction(junction)?;
        let row = JunctionRow {
            junction: junction.clone(),
            child_id,
            parent_id,
        };
        let mut state = self.lock()?;
        if !state.junctions.contains(&row) {
            state.junctions.push(row);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, InnerState>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Internal("role store lock poisoned".to_string()))
    }
}

impl RoleStore for InMemoryRoleStore {
    async fn global_roles(&self, subject: SubjectId) -> Result<Vec<String>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .global
            .iter()
            .filter(|(s, _)| *s == subject)
            .map(|(_, role)| role.clone())
            .collect())
    }

    async fn object_roles(
        &self,
        subject: SubjectId,
        object_type: &str,
        object_id: i64,
    ) -> Result<Vec<String>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .object
            .iter()
            .filter(|a| {
                a.subject == subject && a.object_type == object_type && a.object_id == object_id
            })
            .map(|a| a.role.clone())
            .collect())
    }

    async fn junction_parent(
        &self,
        junction: &JunctionDescriptor,
        child_id: i64,
    ) -> Result<Option<i64>, StorageError> {
        validate_junction(junction)?;
        let state = self.lock()?;
        Ok(state
            .junctions
            .iter()
            .filter(|row| row.junction == *junction && row.child_id == child_id)
            .map(|row| row.parent_id)
            .min())
    }
}

/// Role assignments loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleSeed {
    #[serde(default)]
    pub global: Vec<GlobalRoleSeed>,
    #[serde(default)]
    pub object: Vec<ObjectRoleSeed>,
    #[serde(default)]
    pub junction: Vec<JunctionSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalRoleSeed {
    pub subject: i64,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRoleSeed {
    pub subject: i64,
    pub object_type: String,
    pub object_id: i64,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JunctionSeed {
    pub table: String,
    pub child_column: String,
    pub parent_column: String,
    pub child_id: i64,
    pub parent_id: i64,
}

impl RoleSeed {
    pub fn from_toml_str(contents: &str) -> Result<Self, StorageError> {
        toml::from_str(contents).map_err(|e| StorageError::InvalidSeed(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StorageError::InvalidSeed(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}
