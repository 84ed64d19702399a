//! Workload owner kinds
//!
//! Centralizes the owner kinds the resolver gives special treatment so the
//! heuristics match on an enum instead of string literals. Owner kinds that
//! are not listed here still flow through component keys verbatim.

use std::fmt;
use std::str::FromStr;

/// Owner kinds with resolver-specific behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Deployment,
    DaemonSet,
    StatefulSet,
    ReplicaSet,
    Job,
    // Static pods are mirrored by the kubelet with the Node as owner
    Node,
    // Revision controllers own static-pod installer state through ConfigMaps
    ConfigMap,
    Service,
    // Synthetic kind for kubelet-managed pods
    StaticPods,
}

impl WorkloadKind {
    /// Get the kind as it appears in owner references and component keys
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::ReplicaSet => "ReplicaSet",
            WorkloadKind::Job => "Job",
            WorkloadKind::Node => "Node",
            WorkloadKind::ConfigMap => "ConfigMap",
            WorkloadKind::Service => "Service",
            WorkloadKind::StaticPods => "StaticPods",
        }
    }

    /// Try to parse an owner kind, returning None for kinds without special handling
    pub fn parse_optional(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Default node placement when no node-role selector is present
    ///
    /// Returns None for kinds whose placement cannot be inferred from the kind alone.
    pub fn default_placement(&self) -> Option<&'static str> {
        match self {
            WorkloadKind::DaemonSet | WorkloadKind::StatefulSet => Some("all"),
            WorkloadKind::Deployment => Some("worker"),
            _ => None,
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deployment" => Ok(WorkloadKind::Deployment),
            "DaemonSet" => Ok(WorkloadKind::DaemonSet),
            "StatefulSet" => Ok(WorkloadKind::StatefulSet),
            "ReplicaSet" => Ok(WorkloadKind::ReplicaSet),
            "Job" => Ok(WorkloadKind::Job),
            "Node" => Ok(WorkloadKind::Node),
            "ConfigMap" => Ok(WorkloadKind::ConfigMap),
            "Service" => Ok(WorkloadKind::Service),
            "StaticPods" => Ok(WorkloadKind::StaticPods),
            _ => Err(format!("Unknown workload kind: {}", s)),
        }
    }
}
