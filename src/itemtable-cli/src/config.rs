//! Configuration management for the itemtable CLI

use anyhow::{Context, Result};
use itemtable::{CatalogOptions, NormalizerConfig, SchemaLayout};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default database when `--database` is not given
    pub database: Option<PathBuf>,
    /// Forced schema layout; detected when unset
    pub layout: Option<SchemaLayout>,
    pub normalizer: NormalizerConfig,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("itemtable");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Database to open: the flag wins over the config file
    pub fn database(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.database.clone())
            .unwrap_or_else(|| PathBuf::from(itemtable::sqlite::DEFAULT_DB_PATH))
    }

    /// Catalog options, with a layout flag overriding the file
    pub fn catalog_options(&self, layout: Option<SchemaLayout>) -> CatalogOptions {
        CatalogOptions {
            layout: layout.or(self.layout),
            normalizer: self.normalizer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_exists() {
        let result = Config::config_path();
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.normalizer.accessory_fallback, "ring");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config {
            database: Some(PathBuf::from("/srv/l1j/items.db")),
            layout: Some(SchemaLayout::Merged),
            ..Default::default()
        };
        config.normalizer.id_overrides.insert(40_308, "other".to_string());
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[normalizer]\naccessory_fallback = \"amulet\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.normalizer.accessory_fallback, "amulet");
        assert_eq!(config.normalizer.spell_icon_use_type, Some(99));
        assert!(config.database.is_none());
    }

    #[test]
    fn test_flag_precedence() {
        let config = Config {
            database: Some(PathBuf::from("from-file.db")),
            layout: Some(SchemaLayout::Legacy),
            ..Default::default()
        };
        assert_eq!(config.database(None), PathBuf::from("from-file.db"));
        assert_eq!(
            config.database(Some(Path::new("flag.db"))),
            PathBuf::from("flag.db")
        );
        assert_eq!(
            Config::default().database(None),
            PathBuf::from(itemtable::sqlite::DEFAULT_DB_PATH)
        );
        assert_eq!(
            config.catalog_options(Some(SchemaLayout::Merged)).layout,
            Some(SchemaLayout::Merged)
        );
        assert_eq!(config.catalog_options(None).layout, Some(SchemaLayout::Legacy));
    }
}
