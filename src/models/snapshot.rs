//! Point-in-time cluster inventory
//!
//! The snapshot is the only input the topology engine reads besides the
//! optional flow export. It is serializable so a snapshot taken from a live
//! cluster can be saved and analyzed offline.

use super::route::Route;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Materialized cluster objects the analysis runs over
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub pods: Vec<Pod>,
    #[serde(default)]
    pub replica_sets: Vec<ReplicaSet>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl ClusterSnapshot {
    /// Services grouped by namespace, in listing order
    pub fn services_by_namespace(&self) -> HashMap<String, Vec<Service>> {
        let mut by_ns: HashMap<String, Vec<Service>> = HashMap::new();
        for svc in &self.services {
            let ns = svc.metadata.namespace.clone().unwrap_or_default();
            by_ns.entry(ns).or_default().push(svc.clone());
        }
        by_ns
    }

    /// Namespaces keyed by name
    pub fn namespaces_by_name(&self) -> HashMap<String, Namespace> {
        self.namespaces
            .iter()
            .filter_map(|ns| ns.metadata.name.clone().map(|name| (name, ns.clone())))
            .collect()
    }

    /// Short human-readable inventory summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} namespaces, {} pods, {} replica sets, {} services, {} routes",
            self.namespaces.len(),
            self.pods.len(),
            self.replica_sets.len(),
            self.services.len(),
            self.routes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn service(ns: &str, name: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(ns.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_services_by_namespace() {
        let snapshot = ClusterSnapshot {
            services: vec![
                service("openshift-dns", "dns-default"),
                service("openshift-dns", "dns-metrics"),
                service("openshift-etcd", "etcd"),
            ],
            ..Default::default()
        };
        let by_ns = snapshot.services_by_namespace();
        assert_eq!(by_ns["openshift-dns"].len(), 2);
        assert_eq!(by_ns["openshift-etcd"].len(), 1);
        assert!(!by_ns.contains_key("default"));
    }

    #[test]
    fn test_yaml_round_trip_keeps_counts() {
        let snapshot = ClusterSnapshot {
            services: vec![service("default", "kubernetes")],
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&snapshot).unwrap();
        let back: ClusterSnapshot = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.services.len(), 1);
        assert_eq!(back.summary(), snapshot.summary());
    }
}
