//! Component graph
//!
//! Holds one `Component` per resolved key plus the index that redirects
//! Service keys onto the workload behind them. Components are kept in a
//! `BTreeMap` so every projection iterates in sorted key order.

use super::connectivity;
use super::error::TopologyResult;
use super::resolver::{ComponentResolver, Resolution};
use crate::models::{ClusterSnapshot, Component, ComponentKey, PodObservation};
use std::collections::{BTreeMap, HashMap};

/// Deduplicated component graph for one snapshot
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    components: BTreeMap<ComponentKey, Component>,
    service_index: HashMap<ComponentKey, ComponentKey>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a pod observation into its component, creating it on first sight
    pub fn observe(&mut self, obs: &PodObservation) {
        self.components
            .entry(obs.key.clone())
            .or_insert_with(|| Component::new(&obs.key))
            .observe(obs);
    }

    /// Record that `service` is served by `component`
    pub fn index_service(&mut self, service: ComponentKey, component: ComponentKey) {
        if let Some(previous) = self.service_index.get(&service) {
            if previous != &component {
                tracing::debug!(
                    "Service {} selects both {} and {}, keeping {}",
                    service,
                    previous,
                    component,
                    component
                );
            }
        }
        self.service_index.insert(service, component);
    }

    /// Workload behind a Service key, if the service selects any known pod
    pub fn owner_of_service(&self, service: &ComponentKey) -> Option<&ComponentKey> {
        self.service_index.get(service)
    }

    /// Add a directed edge between two known components
    ///
    /// Returns true if either side gained a new entry. Unknown endpoints are
    /// left untouched.
    pub fn connect(&mut self, src: &ComponentKey, dst: &ComponentKey) -> bool {
        if !self.contains(src) || !self.contains(dst) {
            return false;
        }
        let mut added = false;
        if let Some(c) = self.components.get_mut(src) {
            added |= c.connect_to(dst);
        }
        if let Some(c) = self.components.get_mut(dst) {
            added |= c.connect_from(src);
        }
        added
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.components.contains_key(key)
    }

    pub fn get(&self, key: &ComponentKey) -> Option<&Component> {
        self.components.get(key)
    }

    /// Components in sorted key order
    pub fn components(&self) -> impl Iterator<Item = (&ComponentKey, &Component)> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of distinct directed edges
    pub fn edge_count(&self) -> usize {
        self.components
            .values()
            .map(|c| c.outgoing_connections.len())
            .sum()
    }

    /// Distinct groups that have at least one component, sorted
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self
            .components
            .values()
            .map(|c| c.group.as_str())
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }
}

/// Builds a `ComponentGraph` from a cluster snapshot
pub struct GraphBuilder<'a> {
    resolver: &'a ComponentResolver,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(resolver: &'a ComponentResolver) -> Self {
        Self { resolver }
    }

    /// Resolve every pod and fold it into the graph
    ///
    /// Aborts on the first pod without exactly one owner.
    pub fn build(&self, snapshot: &ClusterSnapshot) -> TopologyResult<ComponentGraph> {
        let namespaces = snapshot.namespaces_by_name();
        let services_by_ns = snapshot.services_by_namespace();
        let mut graph = ComponentGraph::new();
        let mut skipped = 0usize;

        for pod in &snapshot.pods {
            let key = match self.resolver.resolve(pod)? {
                Resolution::Resolved(key) => key,
                Resolution::Guard | Resolution::Excluded(_) => {
                    skipped += 1;
                    continue;
                }
            };

            let raw_ns = pod.metadata.namespace.as_deref().unwrap_or_default();
            let services = services_by_ns
                .get(raw_ns)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let conn = connectivity::derive(pod, services, &snapshot.routes);

            for svc in &conn.services {
                let svc_name = svc.metadata.name.as_deref().unwrap_or_default();
                graph.index_service(
                    ComponentKey::service(&key.group, &key.namespace, svc_name),
                    key.clone(),
                );
            }

            let mut obs = self.resolver.observe_pod(pod, &key, &namespaces);
            obs.inbound_traffic = conn.inbound_traffic;
            obs.externally_exposed = conn.externally_exposed;
            graph.observe(&obs);
        }

        tracing::info!(
            "Built {} components from {} pods ({} skipped)",
            graph.len(),
            snapshot.pods.len(),
            skipped
        );
        Ok(graph)
    }
}
