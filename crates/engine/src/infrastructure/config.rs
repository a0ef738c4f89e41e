//! Runtime configuration from environment variables.

use std::path::PathBuf;

pub const DEFAULT_SYSTEM_ID: &str = "CoC7";
const SETTINGS_DB_FILE: &str = "settings.db";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be true or false, got '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

/// Configuration of the `coc7-migrate` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub world_dir: PathBuf,
    pub settings_db: PathBuf,
    /// System package id; the settings namespace and the asset path prefix.
    pub system_id: String,
    /// Run the pass when the gate offers it, without asking.
    pub auto_migrate: bool,
    pub dry_run: bool,
}

impl MigrationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let world_dir = PathBuf::from(value("COC7_WORLD_DIR").ok_or(ConfigError::Missing("COC7_WORLD_DIR"))?);
        let settings_db = value("COC7_SETTINGS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| world_dir.join(SETTINGS_DB_FILE));
        let system_id = value("COC7_SYSTEM_ID").unwrap_or_else(|| DEFAULT_SYSTEM_ID.to_string());

        Ok(Self {
            auto_migrate: flag("COC7_AUTO_MIGRATE", value("COC7_AUTO_MIGRATE"))?,
            dry_run: flag("COC7_DRY_RUN", value("COC7_DRY_RUN"))?,
            world_dir,
            settings_db,
            system_id,
        })
    }
}

fn flag(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some(_) => Err(ConfigError::InvalidFlag {
            name,
            value: value.unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<MigrationConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MigrationConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("COC7_WORLD_DIR", "/data/worlds/masks")]).unwrap();
        assert_eq!(cfg.settings_db, PathBuf::from("/data/worlds/masks/settings.db"));
        assert_eq!(cfg.system_id, "CoC7");
        assert!(!cfg.auto_migrate);
        assert!(!cfg.dry_run);
    }

    #[test]
    fn test_world_dir_is_required() {
        assert_eq!(config(&[]), Err(ConfigError::Missing("COC7_WORLD_DIR")));
        assert_eq!(config(&[("COC7_WORLD_DIR", "  ")]), Err(ConfigError::Missing("COC7_WORLD_DIR")));
    }

    #[test]
    fn test_flags() {
        let cfg = config(&[
            ("COC7_WORLD_DIR", "w"),
            ("COC7_AUTO_MIGRATE", "TRUE"),
            ("COC7_DRY_RUN", "1"),
        ])
        .unwrap();
        assert!(cfg.auto_migrate);
        assert!(cfg.dry_run);

        let err = config(&[("COC7_WORLD_DIR", "w"), ("COC7_DRY_RUN", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFlag { name: "COC7_DRY_RUN", .. }));
    }
}
