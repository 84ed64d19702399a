//! Component record
//!
//! One `Component` exists per resolved `ComponentKey`. It is built by folding
//! every pod observation for that key into it: the first observation seeds the
//! record and later ones only accumulate (flags OR, sets union) or fill fields
//! that are still empty. Folding the same observation twice is a no-op.

use super::component_key::ComponentKey;
use super::posture::SecurityPosture;
use crate::constants::{OPERATOR_SUFFIX, PRIVILEGED_SCC};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything the pipeline derives from a single pod
///
/// Produced by the resolver, security merger and connectivity deriver, then
/// folded into the owning component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodObservation {
    pub key: ComponentKey,
    pub runs_on: String,
    pub run_level: Option<String>,
    pub priority_class: Option<String>,
    pub host_ipc: bool,
    pub host_network: bool,
    pub host_pid: bool,
    pub host_mounts: BTreeSet<String>,
    pub scc: Option<String>,
    pub security_context: SecurityPosture,
    pub inbound_traffic: bool,
    pub externally_exposed: bool,
}

/// A logically distinct workload with its merged posture and connectivity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    pub namespace: String,
    pub group: String,
    pub deployed_as: String,
    #[serde(default)]
    pub runs_on: String,
    #[serde(default)]
    pub is_operator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityPosture>,
    #[serde(default)]
    pub host_ipc: bool,
    #[serde(default)]
    pub host_network: bool,
    #[serde(default)]
    pub host_pid: bool,
    #[serde(default)]
    pub inbound_traffic: bool,
    #[serde(default)]
    pub externally_exposed: bool,
    #[serde(default)]
    pub incoming_connections: BTreeSet<ComponentKey>,
    #[serde(default)]
    pub outgoing_connections: BTreeSet<ComponentKey>,
    #[serde(default)]
    pub host_mounts: BTreeSet<String>,
    /// Number of pods folded into this component
    #[serde(default)]
    pub pod_count: usize,
}

impl Component {
    /// Empty component for a key; identity fields come from the key
    pub fn new(key: &ComponentKey) -> Self {
        Self {
            name: key.name.clone(),
            namespace: key.namespace.clone(),
            group: key.group.clone(),
            deployed_as: key.kind.clone(),
            runs_on: String::new(),
            is_operator: key.name.ends_with(OPERATOR_SUFFIX),
            scc: None,
            run_level: None,
            priority_class: None,
            security_context: None,
            host_ipc: false,
            host_network: false,
            host_pid: false,
            inbound_traffic: false,
            externally_exposed: false,
            incoming_connections: BTreeSet::new(),
            outgoing_connections: BTreeSet::new(),
            host_mounts: BTreeSet::new(),
            pod_count: 0,
        }
    }

    /// Identity of this component
    pub fn key(&self) -> ComponentKey {
        ComponentKey::new(
            &self.group,
            &self.namespace,
            &self.deployed_as,
            &self.name,
        )
    }

    /// Fold one pod observation into the component
    pub fn fold(mut self, obs: &PodObservation) -> Self {
        self.observe(obs);
        self
    }

    /// In-place form of [`Component::fold`]
    pub fn observe(&mut self, obs: &PodObservation) {
        self.pod_count += 1;

        if self.runs_on.is_empty() {
            self.runs_on = obs.runs_on.clone();
        }
        fill_if_empty(&mut self.run_level, &obs.run_level);
        fill_if_empty(&mut self.priority_class, &obs.priority_class);

        self.host_ipc |= obs.host_ipc;
        self.host_network |= obs.host_network;
        self.host_pid |= obs.host_pid;
        self.inbound_traffic |= obs.inbound_traffic;
        self.externally_exposed |= obs.externally_exposed;
        self.host_mounts.extend(obs.host_mounts.iter().cloned());

        // The SCC label and the posture baseline come from the same pod. A pod
        // without an SCC only provides a provisional baseline until one arrives;
        // monotonic flags are carried across the swap.
        let scc_empty = self.scc.as_deref().map(str::is_empty).unwrap_or(true);
        let incoming_scc = obs.scc.as_deref().filter(|s| !s.is_empty());
        match (scc_empty, incoming_scc, &mut self.security_context) {
            (true, Some(scc), existing) => {
                let mut baseline = obs.security_context.clone();
                if let Some(previous) = existing.as_ref() {
                    baseline.absorb_monotonic(previous);
                }
                *existing = Some(baseline);
                self.scc = Some(scc.to_string());
            }
            (_, _, Some(existing)) => existing.absorb_monotonic(&obs.security_context),
            (_, _, existing) => *existing = Some(obs.security_context.clone()),
        }
        if self.is_privileged() {
            self.scc = Some(PRIVILEGED_SCC.to_string());
        }
    }

    /// Whether the merged posture is privileged
    pub fn is_privileged(&self) -> bool {
        self.security_context
            .as_ref()
            .map(|sc| sc.privileged)
            .unwrap_or(false)
    }

    /// Record an outgoing edge; returns false if it was already present
    pub fn connect_to(&mut self, dst: &ComponentKey) -> bool {
        self.outgoing_connections.insert(dst.clone())
    }

    /// Record an incoming edge and mark the component as receiving traffic
    pub fn connect_from(&mut self, src: &ComponentKey) -> bool {
        self.inbound_traffic = true;
        self.incoming_connections.insert(src.clone())
    }
}

fn fill_if_empty(slot: &mut Option<String>, value: &Option<String>) {
    let empty = slot.as_deref().map(str::is_empty).unwrap_or(true);
    if empty {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            *slot = Some(v.to_string());
        }
    }
}
