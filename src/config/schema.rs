//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use super::defaults::default_namespace_groups;
use crate::constants::DEFAULT_GROUP;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Groups whose components are skipped entirely
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_groups: Vec<String>,

    /// Directory report artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Replace report artifacts that already exist
    #[serde(default = "default_false")]
    pub overwrite_reports: bool,

    /// Only list pods in phase Running
    #[serde(default = "default_true")]
    pub running_pods_only: bool,

    /// Volume mount path prefixes not reported as host mounts
    #[serde(default = "default_host_mount_ignore_prefixes")]
    pub host_mount_ignore_prefixes: Vec<String>,

    /// Group for namespaces missing from `namespaceGroups`
    #[serde(default = "default_group")]
    pub default_group: String,

    /// Group → namespaces (without the `openshift-` prefix)
    #[serde(default = "default_namespace_groups")]
    pub namespace_groups: BTreeMap<String, Vec<String>>,
}

// Default value functions
fn default_output_dir() -> String {
    "output".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_host_mount_ignore_prefixes() -> Vec<String> {
    vec!["/var".to_string()]
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            excluded_groups: Vec::new(),
            output_dir: default_output_dir(),
            overwrite_reports: default_false(),
            running_pods_only: default_true(),
            host_mount_ignore_prefixes: default_host_mount_ignore_prefixes(),
            default_group: default_group(),
            namespace_groups: default_namespace_groups(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.output_dir, "output");
        assert!(!config.overwrite_reports);
        assert!(config.running_pods_only);
        assert_eq!(config.host_mount_ignore_prefixes, vec!["/var"]);
        assert!(config.namespace_groups.contains_key("networking"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("outputDir"));
        assert!(yaml.contains("namespaceGroups"));
        assert!(!yaml.contains("excludedGroups"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
excludedGroups: [observability, OLM]
outputDir: /tmp/reports
namespaceGroups:
  payments: [billing]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.excluded_groups, vec!["observability", "OLM"]);
        assert_eq!(config.output_dir, "/tmp/reports");
        assert_eq!(config.namespace_groups.len(), 1);
        // unspecified fields keep their defaults
        assert!(config.running_pods_only);
        assert_eq!(config.default_group, "other");
    }
}
