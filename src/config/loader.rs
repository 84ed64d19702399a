//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{defaults, paths, schema::Config};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Explicit config file, or the root config when none is given
    /// 3. Built-in defaults
    ///
    /// An explicit file must exist; a missing root config is not an error.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file_config = match path {
            Some(path) => Some(Self::load_file(path)?),
            None => {
                let root = paths::root_config_path();
                if root.exists() {
                    Some(Self::load_file(&root)?)
                } else {
                    tracing::debug!("No config file at {}, using defaults", root.display());
                    None
                }
            }
        };

        // A parsed file already carries the defaults for every field it omits,
        // so it replaces the default layer outright.
        let config = file_config.unwrap_or_else(Self::load_defaults);

        Ok(Self::apply_env_overrides(config))
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration by loading and checking for errors
    ///
    /// This fails on:
    /// - Invalid YAML syntax or value types
    /// - An empty output directory or default group
    /// - A namespace listed under more than one group
    /// - A group name containing `/`
    pub fn validate(path: Option<&Path>) -> Result<()> {
        let config = Self::load(path).context("Failed to load merged configuration")?;
        Self::check(&config)
    }

    /// Semantic checks on an already parsed configuration
    pub fn check(config: &Config) -> Result<()> {
        if config.output_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("outputDir must not be empty"));
        }
        if config.default_group.trim().is_empty() {
            return Err(anyhow::anyhow!("defaultGroup must not be empty"));
        }

        // Groups are the first segment of a rendered component key
        let groups = std::iter::once(&config.default_group).chain(config.namespace_groups.keys());
        for group in groups {
            if group.contains('/') {
                return Err(anyhow::anyhow!("Group name '{}' must not contain '/'", group));
            }
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (group, namespaces) in &config.namespace_groups {
            for ns in namespaces {
                if let Some(previous) = seen.insert(ns.as_str(), group.as_str()) {
                    return Err(anyhow::anyhow!(
                        "Namespace {} is listed under both '{}' and '{}'",
                        ns,
                        previous,
                        group
                    ));
                }
            }
        }

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }


    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        // THREATMAP_OUTPUT_DIR override
        if let Ok(dir) = std::env::var("THREATMAP_OUTPUT_DIR") {
            config.output_dir = dir;
        }

        // THREATMAP_EXCLUDE override (comma separated groups)
        if let Ok(exclude) = std::env::var("THREATMAP_EXCLUDE") {
            config.excluded_groups = split_list(&exclude);
        }

        // THREATMAP_OVERWRITE override
        if let Ok(overwrite) = std::env::var("THREATMAP_OVERWRITE") {
            if let Ok(val) = overwrite.parse::<bool>() {
                config.overwrite_reports = val;
            }
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path a `config set` writes to
    pub fn target_path(path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf)
            .unwrap_or_else(paths::root_config_path)
    }
}

/// Split a comma separated list, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.output_dir, "output");
        assert_eq!(config.default_group, "other");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "overwriteReports: true\noutputDir: reports\n").unwrap();

        let config = ConfigLoader::load_file(&path).unwrap();
        assert!(config.overwrite_reports);
        assert_eq!(config.output_dir, "reports");
        assert_eq!(config.default_group, "other");
        assert_eq!(config.host_mount_ignore_prefixes, vec!["/var".to_string()]);
        assert_eq!(config.namespace_groups, crate::config::default_namespace_groups());
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: set_var is unsafe in Rust 2024 due to potential data races.
        // No other test reads or writes these variables.
        unsafe {
            std::env::set_var("THREATMAP_EXCLUDE", "observability, OLM,");
            std::env::set_var("THREATMAP_OVERWRITE", "true");
        }

        let config = ConfigLoader::apply_env_overrides(Config::default());

        assert_eq!(config.excluded_groups, vec!["observability", "OLM"]);
        assert!(config.overwrite_reports);

        // SAFETY: see above
        unsafe {
            std::env::remove_var("THREATMAP_EXCLUDE");
            std::env::remove_var("THREATMAP_OVERWRITE");
        }
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "runningPodsOnly: false\ndefaultGroup: misc\n").unwrap();

        let config = ConfigLoader::load_file(&path).unwrap();
        assert!(!config.running_pods_only);
        assert_eq!(config.default_group, "misc");

        assert!(ConfigLoader::load_file(&tmp.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.yaml");
        let config = Config {
            excluded_groups: vec!["OLM".to_string()],
            ..Default::default()
        };
        ConfigLoader::save(&config, &path).unwrap();
        assert_eq!(ConfigLoader::load_file(&path).unwrap(), config);
    }

    #[test]
    fn test_check_rejects_slash_in_group() {
        let mut config = Config::default();
        config
            .namespace_groups
            .insert("team/a".to_string(), vec!["shop".to_string()]);
        let err = ConfigLoader::check(&config).unwrap_err();
        assert!(err.to_string().contains("team/a"));

        let config = Config {
            default_group: "misc/other".to_string(),
            ..Default::default()
        };
        assert!(ConfigLoader::check(&config).is_err());
    }

    #[test]
    fn test_check_rejects_duplicate_namespace() {
        let mut config = Config::default();
        config
            .namespace_groups
            .insert("extra".to_string(), vec!["dns".to_string()]);
        let err = ConfigLoader::check(&config).unwrap_err();
        assert!(err.to_string().contains("dns"));
        assert!(ConfigLoader::check(&Config::default()).is_ok());
    }
}
