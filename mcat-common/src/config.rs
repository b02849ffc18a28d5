//! Configuration file loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Levels 1 and 2 are handled by the binary's argument parser; this module
//! covers locating and reading the TOML file and the compiled defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::query::SortField;
use crate::schema::CatalogSchema;
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "MCAT_CONFIG";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub cors_origin: Option<String>,
    pub log_level: Option<String>,
    pub expose_internal_errors: Option<bool>,
    pub catalog: CatalogConfig,
}

/// `[catalog]` table: schema preset plus per-key overrides
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub preset: Option<String>,
    pub genres: Option<Vec<String>>,
    pub default_sort: Option<String>,
    pub default_limit: Option<u32>,
    pub max_limit: Option<u32>,
    pub accept_clock_durations: Option<bool>,
}

impl CatalogConfig {
    /// Build the catalogue schema: preset first, then overrides
    pub fn to_schema(&self) -> Result<CatalogSchema> {
        let mut schema = match &self.preset {
            Some(name) => CatalogSchema::preset(name)
                .ok_or_else(|| Error::Config(format!("Unknown catalog preset: {}", name)))?,
            None => CatalogSchema::default(),
        };

        if let Some(genres) = &self.genres {
            let genres: Vec<String> = genres
                .iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect();
            if genres.is_empty() {
                return Err(Error::Config("catalog.genres must not be empty".to_string()));
            }
            schema.genres = genres;
        }

        if let Some(sort) = &self.default_sort {
            schema.default_sort = SortField::parse(sort)
                .ok_or_else(|| Error::Config(format!("Unknown catalog.default_sort: {}", sort)))?;
        }

        if let Some(max_limit) = self.max_limit {
            if max_limit == 0 {
                return Err(Error::Config("catalog.max_limit must be positive".to_string()));
            }
            schema.max_limit = max_limit;
        }

        if let Some(default_limit) = self.default_limit {
            if default_limit == 0 {
                return Err(Error::Config("catalog.default_limit must be positive".to_string()));
            }
            schema.default_limit = default_limit;
        }

        if schema.default_limit > schema.max_limit {
            warn!(
                "catalog.default_limit {} exceeds max_limit {}, clamping",
                schema.default_limit, schema.max_limit
            );
            schema.default_limit = schema.max_limit;
        }

        if let Some(accept) = self.accept_clock_durations {
            schema.accept_clock_durations = accept;
        }

        Ok(schema)
    }
}

/// Locate the config file: explicit path, then `$MCAT_CONFIG`, then
/// `<config_dir>/mcat/config.toml`
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("mcat").join("config.toml"))
}

/// Read and parse a config file
///
/// A missing file (or no path at all) yields defaults; an unreadable or
/// malformed file is an error. Runs before logging is set up, so callers
/// report which case applied.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(TomlConfig::default());
    };

    let content = std::fs::read_to_string(path)?;
    toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mcat"))
        .unwrap_or_else(|| PathBuf::from("./mcat_data"))
        .join("catalogue.db")
}

/// First of `cli` (argument or environment), `file`, `default`
pub fn resolve<T>(cli: Option<T>, file: Option<T>, default: T) -> T {
    cli.or(file).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog_is_default_schema() {
        let schema = CatalogConfig::default().to_schema().unwrap();
        assert_eq!(schema, CatalogSchema::default());
    }

    #[test]
    fn test_overrides_apply_over_preset() {
        let config = CatalogConfig {
            preset: Some("catalan".to_string()),
            default_sort: Some("created_at".to_string()),
            default_limit: Some(25),
            accept_clock_durations: Some(false),
            ..CatalogConfig::default()
        };
        let schema = config.to_schema().unwrap();
        assert!(schema.has_genre("Altres"));
        assert_eq!(schema.default_sort, SortField::CreatedAt);
        assert_eq!(schema.default_limit, 25);
        assert!(!schema.accept_clock_durations);
    }

    #[test]
    fn test_default_limit_clamped_to_max() {
        let config = CatalogConfig {
            default_limit: Some(50),
            max_limit: Some(20),
            ..CatalogConfig::default()
        };
        let schema = config.to_schema().unwrap();
        assert_eq!(schema.default_limit, 20);
    }

    #[test]
    fn test_invalid_catalog_values() {
        let bad_preset = CatalogConfig {
            preset: Some("klingon".to_string()),
            ..CatalogConfig::default()
        };
        assert!(matches!(bad_preset.to_schema(), Err(Error::Config(_))));

        let bad_sort = CatalogConfig {
            default_sort: Some("password".to_string()),
            ..CatalogConfig::default()
        };
        assert!(bad_sort.to_schema().is_err());

        let blank_genres = CatalogConfig {
            genres: Some(vec![" ".to_string()]),
            ..CatalogConfig::default()
        };
        assert!(blank_genres.to_schema().is_err());
    }

    #[test]
    fn test_resolve_priority() {
        assert_eq!(resolve(Some(1), Some(2), 3), 1);
        assert_eq!(resolve(None, Some(2), 3), 2);
        assert_eq!(resolve(None, None, 3), 3);
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path();
        assert!(path.ends_with("catalogue.db"));
    }
}
