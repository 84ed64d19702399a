//! Structured component dumps

use crate::models::Component;
use crate::topology::ComponentGraph;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// All components keyed by their rendered key
pub fn render_all(graph: &ComponentGraph) -> Result<String> {
    let by_key: BTreeMap<String, &Component> = graph
        .components()
        .map(|(key, c)| (key.as_path(), c))
        .collect();
    serde_yaml::to_string(&by_key).context("Failed to serialize components to YAML")
}

/// One component
pub fn render_one(component: &Component) -> Result<String> {
    serde_yaml::to_string(component)
        .with_context(|| format!("Failed to serialize component {}", component.key()))
}

/// Relative path of a component's own dump
///
/// `components/<group with underscores>/<namespace>_<name>.yaml`; the
/// namespace keeps same-named workloads of one group apart.
pub fn component_path(component: &Component) -> PathBuf {
    PathBuf::from("components")
        .join(component.group.replace(' ', "_"))
        .join(format!("{}_{}.yaml", component.namespace, component.name))
}
