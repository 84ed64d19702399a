//! Namespace classification
//!
//! Maps a (prefix-stripped) namespace to the coarse functional group it
//! belongs to. The table is configuration, passed in explicitly so callers
//! and tests can swap classifications.

use crate::config::schema::Config;
use crate::constants::OPENSHIFT_PREFIX;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Namespace → group lookup
#[derive(Debug, Clone)]
pub struct NamespaceClassifier {
    groups_by_namespace: HashMap<String, String>,
    groups: BTreeSet<String>,
    default_group: String,
}

impl NamespaceClassifier {
    /// Build from a group → namespaces table
    ///
    /// When a namespace is listed under several groups the alphabetically
    /// last group wins.
    pub fn new(table: &BTreeMap<String, Vec<String>>, default_group: impl Into<String>) -> Self {
        let mut groups_by_namespace = HashMap::new();
        for (group, namespaces) in table {
            for ns in namespaces {
                let ns = normalize_namespace(ns).to_string();
                if let Some(previous) = groups_by_namespace.insert(ns.clone(), group.clone()) {
                    tracing::warn!(
                        "Namespace {} classified as both {} and {}, using {}",
                        ns,
                        previous,
                        group,
                        group
                    );
                }
            }
        }

        Self {
            groups_by_namespace,
            groups: table.keys().cloned().collect(),
            default_group: default_group.into(),
        }
    }

    /// Build from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.namespace_groups, config.default_group.clone())
    }

    /// Group of a namespace; the prefix is stripped before lookup
    pub fn group_for(&self, namespace: &str) -> &str {
        self.groups_by_namespace
            .get(normalize_namespace(namespace))
            .map(String::as_str)
            .unwrap_or(&self.default_group)
    }

    /// All groups named by the table, sorted
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    pub fn default_group(&self) -> &str {
        &self.default_group
    }
}

impl Default for NamespaceClassifier {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Strip the leading `openshift-` prefix every platform namespace carries
pub fn normalize_namespace(namespace: &str) -> &str {
    namespace
        .strip_prefix(OPENSHIFT_PREFIX)
        .unwrap_or(namespace)
}
