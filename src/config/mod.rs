//! Configuration system for threatmap
//!
//! Layered configuration (built-in defaults, YAML file, environment) plus the
//! namespace → group classification table.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use defaults::default_namespace_groups;
pub use loader::ConfigLoader;
pub use schema::Config;

/// Get a configuration value by key
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "excludedGroups" => Ok(config.excluded_groups.join(",")),
        "outputDir" => Ok(config.output_dir.clone()),
        "overwriteReports" => Ok(config.overwrite_reports.to_string()),
        "runningPodsOnly" => Ok(config.running_pods_only.to_string()),
        "hostMountIgnorePrefixes" => Ok(config.host_mount_ignore_prefixes.join(",")),
        "defaultGroup" => Ok(config.default_group.clone()),
        "namespaceGroups" => serde_yaml::to_string(&config.namespace_groups)
            .map_err(|e| anyhow::anyhow!("Failed to serialize namespaceGroups: {}", e)),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key
///
/// List values accept either a YAML array or a comma separated list.
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "excludedGroups" => {
            config.excluded_groups = parse_list(key, value)?;
        }
        "outputDir" => {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("outputDir must not be empty"));
            }
            config.output_dir = value.to_string();
        }
        "overwriteReports" => {
            config.overwrite_reports = value
                .parse()
                .context("overwriteReports must be 'true' or 'false'")?;
        }
        "runningPodsOnly" => {
            config.running_pods_only = value
                .parse()
                .context("runningPodsOnly must be 'true' or 'false'")?;
        }
        "hostMountIgnorePrefixes" => {
            config.host_mount_ignore_prefixes = parse_list(key, value)?;
        }
        "defaultGroup" => {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("defaultGroup must not be empty"));
            }
            config.default_group = value.to_string();
        }
        "namespaceGroups" => {
            config.namespace_groups = serde_yaml::from_str(value).context(
                "namespaceGroups must be a YAML mapping (e.g., '{payments: [billing]}')",
            )?;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

fn parse_list(key: &str, value: &str) -> anyhow::Result<Vec<String>> {
    use anyhow::Context;
    if value.trim_start().starts_with('[') {
        serde_yaml::from_str(value)
            .with_context(|| format!("{} must be a YAML array (e.g., ['a', 'b'])", key))
    } else {
        Ok(loader::split_list(value))
    }
}
