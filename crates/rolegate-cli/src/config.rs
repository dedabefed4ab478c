use serde::Deserialize;
use std::path::{Path, PathBuf};

use rolegate_storage::PermissionTables;

use crate::admin::AclEntry;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfigValues,
    pub acl: Vec<AclEntry>,
    pub entity_types: EntityTypesConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Role assignments for the memory backend.
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub permission_table: String,
    pub root_permission_table: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfigValues {
    pub admin_scope: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntityTypesConfig {
    pub include_builtin: bool,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let tables = PermissionTables::default();
        Self {
            url: String::new(),
            max_connections: 5,
            permission_table: tables.permission,
            root_permission_table: tables.root_permission,
        }
    }
}

impl Default for EngineConfigValues {
    fn default() -> Self {
        Self {
            admin_scope: rolegate_core::engine::EngineConfig::default().admin_scope,
        }
    }
}

impl Default for EntityTypesConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            paths: Vec::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e.to_string()))?;
            toml::from_str::<AppConfig>(&contents)
                .map_err(|e| ConfigError::ParseToml(e.to_string()))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ROLEGATE_STORE_BACKEND") {
            match v.as_str() {
                "memory" => self.store.backend = StoreBackend::Memory,
                "postgres" => self.store.backend = StoreBackend::Postgres,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("ROLEGATE_DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("ROLEGATE_DATABASE_MAX_CONNECTIONS")
            && let Ok(n) = v.parse()
        {
            self.database.max_connections = n;
        }
        if let Ok(v) = std::env::var("ROLEGATE_ADMIN_SCOPE") {
            self.engine.admin_scope = v;
        }
        if let Ok(v) = std::env::var("ROLEGATE_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Ok(v) = std::env::var("ROLEGATE_LOG_FORMAT") {
            match v.as_str() {
                "json" => self.log.format = LogFormat::Json,
                "pretty" => self.log.format = LogFormat::Pretty,
                _ => {}
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be non-zero".to_string(),
            ));
        }
        if self.engine.admin_scope.trim().is_empty() {
            return Err(ConfigError::Validation(
                "engine.admin_scope must not be empty".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Postgres && self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database.url is required for the postgres backend".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_engine_config(&self) -> rolegate_core::engine::EngineConfig {
        rolegate_core::engine::EngineConfig {
            admin_scope: self.engine.admin_scope.clone(),
        }
    }

    pub fn to_permission_tables(&self) -> PermissionTables {
        PermissionTables {
            permission: self.database.permission_table.clone(),
            root_permission: self.database.root_permission_table.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse TOML config: {0}")]
    ParseToml(String),

    #[error("config validation failed: {0}")]
    Validation(String),
}
