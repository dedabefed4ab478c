use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rolegate_core::auth_config::{AuthConfigError, EntityAuthConfig, EntityTypeDefinition};
use rolegate_core::presets;

use crate::config::EntityTypesConfig;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("entity type '{0}' is registered twice")]
    Duplicate(String),

    #[error("failed to read entity type file '{path}': {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse entity type file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Invalid(#[from] AuthConfigError),
}

/// Entity authorization configs by object type, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct EntityTypeRegistry {
    types: BTreeMap<String, Arc<EntityAuthConfig>>,
}

impl EntityTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for config in presets::builtin()? {
            registry.register(config)?;
        }
        Ok(registry)
    }

    pub fn load(config: &EntityTypesConfig) -> Result<Self, RegistryError> {
        let mut registry = if config.include_builtin {
            Self::builtin()?
        } else {
            Self::new()
        };

        for path in &config.paths {
            registry.register(load_definition(path)?)?;
            tracing::debug!(path = %path.display(), "loaded entity type file");
        }

        Ok(registry)
    }

    pub fn register(&mut self, config: EntityAuthConfig) -> Result<(), RegistryError> {
        let object_type = config.object_type().to_string();
        if self.types.contains_key(&object_type) {
            return Err(RegistryError::Duplicate(object_type));
        }
        self.types.insert(object_type, Arc::new(config));
        Ok(())
    }

    pub fn get(&self, object_type: &str) -> Option<Arc<EntityAuthConfig>> {
        self.types.get(object_type).cloned()
    }

    pub fn object_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityAuthConfig> {
        self.types.values().map(|config| config.as_ref())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Reads a `.json` or `.toml` entity type definition.
pub fn load_definition(path: &Path) -> Result<EntityAuthConfig, RegistryError> {
    let contents = std::fs::read_to_string(path).map_err(|e| RegistryError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let parse_error = |message: String| RegistryError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let definition: EntityTypeDefinition = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
        _ => toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
    };

    Ok(EntityAuthConfig::from_definition(definition)?)
}
