mod validation;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matrix::{MatrixError, PermissionMatrix};

pub use validation::{InertGrant, detect_inert_grants, is_valid_identifier};

/// Association table linking a child id to its parent id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JunctionDescriptor {
    pub table: String,
    pub child_column: String,
    pub parent_column: String,
}

impl JunctionDescriptor {
    pub fn new(
        table: impl Into<String>,
        child_column: impl Into<String>,
        parent_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            child_column: child_column.into(),
            parent_column: parent_column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolve", rename_all = "lowercase")]
pub enum ResolveMode {
    /// Parent id is read from a field of the entity.
    Field { field: String },
    /// Parent id is looked up through a junction table, keyed by the entity id.
    Junction { junction: JunctionDescriptor },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentChainNode {
    pub key: String,
    pub object_type: String,
    #[serde(flatten)]
    pub resolve: ResolveMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParentChainNode>,
}

impl ParentChainNode {
    pub fn field(
        key: impl Into<String>,
        object_type: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            object_type: object_type.into(),
            resolve: ResolveMode::Field {
                field: field.into(),
            },
            children: Vec::new(),
        }
    }

    pub fn junction(
        key: impl Into<String>,
        object_type: impl Into<String>,
        junction: JunctionDescriptor,
    ) -> Self {
        Self {
            key: key.into(),
            object_type: object_type.into(),
            resolve: ResolveMode::Junction { junction },
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ParentChainNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthConfigError {
    #[error("object type must not be empty")]
    EmptyObjectType,

    #[error("field names must not be empty")]
    EmptyFieldName,

    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    #[error("parent chain node at '{path}' has an empty {attribute}")]
    EmptyChainAttribute {
        path: String,
        attribute: &'static str,
    },

    #[error("duplicate parent chain key '{key}' at '{path}'")]
    DuplicateChainKey { path: String, key: String },

    #[error("invalid junction identifier '{identifier}' at '{path}'")]
    InvalidJunctionIdentifier { path: String, identifier: String },

    #[error("invalid permission matrix for '{object_type}': {source}")]
    Matrix {
        object_type: String,
        #[source]
        source: MatrixError,
    },
}

/// File representation of an object type's authorization config.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityTypeDefinition {
    pub object_type: String,
    #[serde(default)]
    pub all_fields: Vec<String>,
    #[serde(default)]
    pub parent_chain: Vec<ParentChainNode>,
    #[serde(default)]
    pub permissions: Value,
}

/// Authorization description of one object type. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAuthConfig {
    object_type: String,
    matrix: PermissionMatrix,
    parent_chain: Vec<ParentChainNode>,
    all_fields: Vec<String>,
}

impl EntityAuthConfig {
    pub fn new(
        object_type: impl Into<String>,
        matrix: PermissionMatrix,
        parent_chain: Vec<ParentChainNode>,
        all_fields: Vec<String>,
    ) -> Result<Self, AuthConfigError> {
        let object_type = object_type.into();
        if object_type.trim().is_empty() {
            return Err(AuthConfigError::EmptyObjectType);
        }

        let mut seen = BTreeSet::new();
        for field in &all_fields {
            if field.trim().is_empty() {
                return Err(AuthConfigError::EmptyFieldName);
            }
            if !seen.insert(field.as_str()) {
                return Err(AuthConfigError::DuplicateField(field.clone()));
            }
        }

        validation::validate_chain(&parent_chain, &object_type)?;

        Ok(Self {
            object_type,
            matrix,
            parent_chain,
            all_fields,
        })
    }

    pub fn from_definition(definition: EntityTypeDefinition) -> Result<Self, AuthConfigError> {
        let matrix = PermissionMatrix::from_value(&definition.permissions).map_err(|source| {
            AuthConfigError::Matrix {
                object_type: definition.object_type.clone(),
                source,
            }
        })?;

        Self::new(
            definition.object_type,
            matrix,
            definition.parent_chain,
            definition.all_fields,
        )
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    pub fn parent_chain(&self) -> &[ParentChainNode] {
        &self.parent_chain
    }

    pub fn all_fields(&self) -> &[String] {
        &self.all_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Operation;
    use crate::matrix::Grant;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_rejects_empty_object_type() {
        let err = EntityAuthConfig::new(" ", PermissionMatrix::new(), vec![], vec![]).unwrap_err();
        assert_eq!(err, AuthConfigError::EmptyObjectType);
    }

    #[test]
    fn new_rejects_duplicate_fields() {
        let err = EntityAuthConfig::new(
            "document",
            PermissionMatrix::new(),
            vec![],
            fields(&["name", "category", "name"]),
        )
        .unwrap_err();

        assert_eq!(err, AuthConfigError::DuplicateField("name".to_string()));
    }

    #[test]
    fn new_keeps_field_order() {
        let config = EntityAuthConfig::new(
            "document",
            PermissionMatrix::new(),
            vec![],
            fields(&["name", "category", "description"]),
        )
        .unwrap();

        assert_eq!(config.all_fields(), ["name", "category", "description"]);
    }

    #[test]
    fn from_definition_parses_toml() {
        let definition: EntityTypeDefinition = toml::from_str(
            r#"
object_type = "document_resource"
all_fields = ["name", "category"]

[[parent_chain]]
key = "owner"
object_type = "resource"
resolve = "field"
field = "owner_id"

[[parent_chain.children]]
key = "building"
object_type = "building"
resolve = "junction"
junction = { table = "bb_building_resource", child_column = "resource_id", parent_column = "building_id" }

[permissions.default]
read = true

[permissions.parent_role_permissions.owner.manager]
write = true

[permissions.parent_role_permissions.owner.parent_role_permissions.building.manager]
write = true
"#,
        )
        .unwrap();

        let config = EntityAuthConfig::from_definition(definition).unwrap();

        assert_eq!(config.object_type(), "document_resource");
        assert_eq!(
            config.matrix().default.get(Operation::Read),
            Some(&Grant::Allowed)
        );

        let owner = &config.parent_chain()[0];
        assert_eq!(
            owner.resolve,
            ResolveMode::Field {
                field: "owner_id".to_string()
            }
        );
        assert_eq!(
            owner.children[0].resolve,
            ResolveMode::Junction {
                junction: JunctionDescriptor::new(
                    "bb_building_resource",
                    "resource_id",
                    "building_id"
                )
            }
        );
    }

    #[test]
    fn from_definition_reports_matrix_errors_with_type() {
        let definition = EntityTypeDefinition {
            object_type: "document".to_string(),
            all_fields: vec![],
            parent_chain: vec![],
            permissions: serde_json::json!({"default": {"publish": true}}),
        };

        let err = EntityAuthConfig::from_definition(definition).unwrap_err();
        assert!(
            matches!(err, AuthConfigError::Matrix { ref object_type, .. } if object_type == "document"),
            "expected Matrix error, got: {err}"
        );
        assert!(err.to_string().contains("publish"));
    }

    #[test]
    fn from_definition_without_permissions_is_empty_matrix() {
        let definition: EntityTypeDefinition =
            toml::from_str(r#"object_type = "building""#).unwrap();

        let config = EntityAuthConfig::from_definition(definition).unwrap();
        assert_eq!(config.matrix(), &PermissionMatrix::default());
        assert!(config.parent_chain().is_empty());
    }
}
