//! Component identity resolution
//!
//! Turns a pod into the `ComponentKey` of the workload that logically owns it
//! and derives the per-pod facts that are folded into that component.
//!
//! Identity rules:
//! - `app=guard` pods are dropped before anything else
//! - a pod must carry exactly one owner reference
//! - ReplicaSet owners are followed one hop to their own owner
//! - Node owners (kubelet mirror pods) become `StaticPods` named after the
//!   `app` label
//! - flow endpoints owned by a ConfigMap are static pods as well; the
//!   rotating `revision-status-*` names collapse onto the namespace
//! - `default/Service/kubernetes` is the kube-apiserver static pod

use super::classifier::{NamespaceClassifier, normalize_namespace};
use super::error::{TopologyError, TopologyResult};
use super::security;
use crate::constants::{
    APP_LABEL, GUARD_APP, NODE_ROLE_PREFIX, OPENSHIFT_PREFIX, REVISION_STATUS_PREFIX,
    RUN_LEVEL_LABEL,
};
use crate::models::{ComponentKey, PodObservation, WorkloadKind};
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use std::collections::{BTreeSet, HashMap};

const APISERVER_NAMESPACE: &str = "kube-apiserver";
const APISERVER_NAME: &str = "kube-apiserver";
const KUBERNETES_SERVICE: &str = "kubernetes";
const DEFAULT_NAMESPACE: &str = "default";

/// Outcome of resolving one pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Pod belongs to the component with this key
    Resolved(ComponentKey),
    /// Static-pod guard; carries no workload of its own
    Guard,
    /// Pod resolved into a group the caller excluded
    Excluded(ComponentKey),
}

/// Resolves pods and flow endpoints to component keys
#[derive(Debug, Clone)]
pub struct ComponentResolver {
    classifier: NamespaceClassifier,
    // (namespace, name) -> (owner kind, owner name); None when the ReplicaSet has no owner
    replica_set_owners: HashMap<(String, String), Option<(String, String)>>,
    excluded_groups: BTreeSet<String>,
    host_mount_ignore_prefixes: Vec<String>,
}

impl ComponentResolver {
    pub fn new(classifier: NamespaceClassifier, replica_sets: &[ReplicaSet]) -> Self {
        let replica_set_owners = replica_sets
            .iter()
            .filter_map(|rs| {
                let ns = rs.metadata.namespace.clone().unwrap_or_default();
                let name = rs.metadata.name.clone()?;
                let owner = rs
                    .metadata
                    .owner_references
                    .as_ref()
                    .and_then(|refs| refs.first())
                    .map(|o| (o.kind.clone(), o.name.clone()));
                Some(((ns, name), owner))
            })
            .collect();

        Self {
            classifier,
            replica_set_owners,
            excluded_groups: BTreeSet::new(),
            host_mount_ignore_prefixes: vec!["/var".to_string()],
        }
    }

    /// Skip pods whose group is in `groups`
    pub fn with_excluded_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_groups = groups
            .into_iter()
            .map(Into::into)
            .filter(|g: &String| !g.is_empty())
            .collect();
        self
    }

    /// Volume mount paths under these prefixes are not reported as host mounts
    pub fn with_host_mount_ignore_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.host_mount_ignore_prefixes = prefixes;
        self
    }

    pub fn classifier(&self) -> &NamespaceClassifier {
        &self.classifier
    }

    pub fn is_excluded(&self, group: &str) -> bool {
        self.excluded_groups.contains(group)
    }

    /// Resolve the component a pod belongs to
    ///
    /// Fails when the pod does not carry exactly one owner reference.
    pub fn resolve(&self, pod: &Pod) -> TopologyResult<Resolution> {
        if label(pod, APP_LABEL) == Some(GUARD_APP) {
            return Ok(Resolution::Guard);
        }

        let raw_namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
        let pod_name = pod.metadata.name.as_deref().unwrap_or_default();

        let owners = pod.metadata.owner_references.as_deref().unwrap_or_default();
        let [owner] = owners else {
            return Err(TopologyError::UnexpectedOwnerCount {
                namespace: raw_namespace.to_string(),
                pod: pod_name.to_string(),
                count: owners.len(),
            });
        };

        let mut kind = owner.kind.clone();
        let mut name = owner.name.clone();

        if WorkloadKind::parse_optional(&kind) == Some(WorkloadKind::ReplicaSet) {
            match self
                .replica_set_owners
                .get(&(raw_namespace.to_string(), name.clone()))
            {
                Some(Some((owner_kind, owner_name))) => {
                    kind = owner_kind.clone();
                    name = owner_name.clone();
                }
                Some(None) => {
                    tracing::warn!(
                        "ReplicaSet {}/{} has no owner, keeping it as the component",
                        raw_namespace,
                        name
                    );
                }
                None => {
                    tracing::warn!(
                        "ReplicaSet {}/{} owning pod {} not found in snapshot",
                        raw_namespace,
                        name,
                        pod_name
                    );
                }
            }
        }

        if WorkloadKind::parse_optional(&kind) == Some(WorkloadKind::Node) {
            kind = WorkloadKind::StaticPods.to_string();
            name = static_pod_name(pod);
        }

        let key = self.component_key(raw_namespace, &kind, &name);
        if self.is_excluded(&key.group) {
            tracing::debug!("Skipping {} due to exclusions", key);
            return Ok(Resolution::Excluded(key));
        }

        tracing::debug!("Resolved pod {}/{} to {}", raw_namespace, pod_name, key);
        Ok(Resolution::Resolved(key))
    }

    /// Key for an owner in a (possibly prefixed) namespace
    pub fn component_key(&self, namespace: &str, kind: &str, name: &str) -> ComponentKey {
        let namespace = normalize_namespace(namespace);

        if namespace == DEFAULT_NAMESPACE
            && kind == WorkloadKind::Service.as_str()
            && name == KUBERNETES_SERVICE
        {
            return ComponentKey::new(
                self.classifier.group_for(APISERVER_NAMESPACE),
                APISERVER_NAMESPACE,
                WorkloadKind::StaticPods.as_str(),
                APISERVER_NAME,
            );
        }

        ComponentKey::new(self.classifier.group_for(namespace), namespace, kind, name)
    }

    /// Key for one side of a flow record
    ///
    /// Returns None when the record carries no namespace or owner for this side,
    /// which is the case for traffic leaving or entering the cluster.
    pub fn flow_endpoint_key(
        &self,
        namespace: &str,
        owner_type: &str,
        owner_name: &str,
    ) -> Option<ComponentKey> {
        if namespace.is_empty() || owner_type.is_empty() || owner_name.is_empty() {
            return None;
        }

        let namespace = normalize_namespace(namespace);
        if WorkloadKind::parse_optional(owner_type) == Some(WorkloadKind::ConfigMap) {
            let name = if owner_name.starts_with(REVISION_STATUS_PREFIX) {
                namespace
            } else {
                owner_name
            };
            return Some(self.component_key(namespace, WorkloadKind::StaticPods.as_str(), name));
        }

        Some(self.component_key(namespace, owner_type, owner_name))
    }

    /// Per-pod facts folded into the component under `key`
    ///
    /// Connectivity flags are left unset; the graph builder fills them in.
    pub fn observe_pod(
        &self,
        pod: &Pod,
        key: &ComponentKey,
        namespaces: &HashMap<String, Namespace>,
    ) -> PodObservation {
        let spec = pod.spec.as_ref();
        let (scc, security_context) = security::merge(pod);

        let run_level = pod
            .metadata
            .namespace
            .as_deref()
            .and_then(|ns| namespaces.get(ns))
            .and_then(|ns| ns.metadata.labels.as_ref())
            .and_then(|labels| labels.get(RUN_LEVEL_LABEL))
            .cloned();

        PodObservation {
            key: key.clone(),
            runs_on: runs_on(pod, &key.kind),
            run_level,
            priority_class: spec.and_then(|s| s.priority_class_name.clone()),
            host_ipc: spec.and_then(|s| s.host_ipc).unwrap_or(false),
            host_network: spec.and_then(|s| s.host_network).unwrap_or(false),
            host_pid: spec.and_then(|s| s.host_pid).unwrap_or(false),
            host_mounts: self.host_mounts(pod),
            scc,
            security_context,
            inbound_traffic: false,
            externally_exposed: false,
        }
    }

    fn host_mounts(&self, pod: &Pod) -> BTreeSet<String> {
        pod.spec
            .iter()
            .flat_map(|s| s.containers.iter())
            .flat_map(|c| c.volume_mounts.iter().flatten())
            .map(|m| m.mount_path.as_str())
            .filter(|path| {
                !self
                    .host_mount_ignore_prefixes
                    .iter()
                    .any(|prefix| path.starts_with(prefix.as_str()))
            })
            .map(str::to_string)
            .collect()
    }
}

fn label<'a>(pod: &'a Pod, key: &str) -> Option<&'a str> {
    pod.metadata
        .labels
        .as_ref()
        .and_then(|l| l.get(key))
        .map(String::as_str)
}

/// Name of a kubelet mirror pod's component
///
/// Uses the `app` label; pods without one fall back to the pod name with the
/// `-<nodeName>` suffix the kubelet appends removed.
fn static_pod_name(pod: &Pod) -> String {
    if let Some(app) = label(pod, APP_LABEL).filter(|a| !a.is_empty()) {
        return app.strip_prefix(OPENSHIFT_PREFIX).unwrap_or(app).to_string();
    }

    let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
    let node_name = pod
        .spec
        .as_ref()
        .and_then(|s| s.node_name.as_deref())
        .unwrap_or_default();
    if !node_name.is_empty() {
        if let Some(base) = pod_name.strip_suffix(&format!("-{}", node_name)) {
            return base.to_string();
        }
    }
    pod_name.to_string()
}

/// Node placement label, e.g. `master nodes`
fn runs_on(pod: &Pod, kind: &str) -> String {
    let spec = pod.spec.as_ref();

    let from_selector = spec
        .and_then(|s| s.node_selector.as_ref())
        .and_then(|selector| {
            selector
                .keys()
                .filter(|k| k.starts_with(NODE_ROLE_PREFIX))
                .filter_map(|k| k.rsplit('/').next())
                .last()
                .map(str::to_string)
        });

    let role = from_selector.or_else(|| match WorkloadKind::parse_optional(kind) {
        Some(WorkloadKind::StaticPods) => spec
            .and_then(|s| s.node_name.as_deref())
            .and_then(|n| n.split('-').next())
            .map(str::to_string),
        Some(k) => k.default_placement().map(str::to_string),
        None => None,
    });

    format!("{} nodes", role.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PodSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    fn owner(kind: &str, name: &str) -> OwnerReference {
        OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            uid: format!("uid-{}", name),
            ..Default::default()
        }
    }

    fn pod(ns: &str, name: &str, owners: Vec<OwnerReference>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(ns.to_string()),
                owner_references: Some(owners),
                ..Default::default()
            },
            spec: Some(PodSpec::default()),
            ..Default::default()
        }
    }

    fn resolver() -> ComponentResolver {
        ComponentResolver::new(NamespaceClassifier::default(), &[])
    }

    #[test]
    fn test_daemonset_key() {
        let p = pod("openshift-dns", "dns-abcde", vec![owner("DaemonSet", "dns")]);
        let r = resolver().resolve(&p).unwrap();
        assert_eq!(
            r,
            Resolution::Resolved(ComponentKey::new("networking", "dns", "DaemonSet", "dns"))
        );
    }

    #[test]
    fn test_owner_count_must_be_one() {
        let none = pod("openshift-dns", "orphan", vec![]);
        let err = resolver().resolve(&none).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnexpectedOwnerCount { count: 0, .. }
        ));

        let two = pod(
            "openshift-dns",
            "twins",
            vec![owner("DaemonSet", "a"), owner("DaemonSet", "b")],
        );
        assert!(resolver().resolve(&two).is_err());
    }

    #[test]
    fn test_guard_pod_dropped_before_owner_check() {
        let mut p = pod("openshift-etcd", "etcd-guard-master-0", vec![]);
        p.metadata.labels = Some(BTreeMap::from([(APP_LABEL.to_string(), GUARD_APP.to_string())]));
        assert_eq!(resolver().resolve(&p).unwrap(), Resolution::Guard);
    }

    #[test]
    fn test_static_pod_name_fallback() {
        let mut p = pod("openshift-etcd", "etcd-master-0", vec![owner("Node", "master-0")]);
        p.spec = Some(PodSpec {
            node_name: Some("master-0".to_string()),
            ..Default::default()
        });
        assert_eq!(static_pod_name(&p), "etcd");

        p.metadata.labels = Some(BTreeMap::from([(
            APP_LABEL.to_string(),
            "openshift-etcd".to_string(),
        )]));
        let r = resolver().resolve(&p).unwrap();
        assert_eq!(
            r,
            Resolution::Resolved(ComponentKey::new(
                "kube control plane",
                "etcd",
                "StaticPods",
                "etcd"
            ))
        );
    }

    #[test]
    fn test_flow_endpoint_heuristics() {
        let r = resolver();
        assert_eq!(
            r.flow_endpoint_key("openshift-kube-scheduler", "ConfigMap", "revision-status-7"),
            Some(ComponentKey::new(
                "kube control plane",
                "kube-scheduler",
                "StaticPods",
                "kube-scheduler"
            ))
        );
        assert_eq!(
            r.flow_endpoint_key("default", "Service", "kubernetes"),
            Some(ComponentKey::new(
                "kube control plane",
                "kube-apiserver",
                "StaticPods",
                "kube-apiserver"
            ))
        );
        assert_eq!(r.flow_endpoint_key("", "", ""), None);
    }

    #[test]
    fn test_runs_on() {
        let mut p = pod("openshift-dns", "dns-abcde", vec![]);
        assert_eq!(runs_on(&p, "DaemonSet"), "all nodes");
        assert_eq!(runs_on(&p, "Deployment"), "worker nodes");
        assert_eq!(runs_on(&p, "Job"), " nodes");

        p.spec = Some(PodSpec {
            node_selector: Some(BTreeMap::from([(
                "node-role.kubernetes.io/master".to_string(),
                String::new(),
            )])),
            node_name: Some("ip-10-0-1-1".to_string()),
            ..Default::default()
        });
        assert_eq!(runs_on(&p, "Deployment"), "master nodes");

        p.spec = Some(PodSpec {
            node_name: Some("master-0".to_string()),
            ..Default::default()
        });
        assert_eq!(runs_on(&p, "StaticPods"), "master nodes");
    }

    #[test]
    fn test_excluded_group() {
        let p = pod("openshift-monitoring", "prom-0", vec![owner("StatefulSet", "prometheus")]);
        let r = resolver().with_excluded_groups(["observability"]);
        assert!(matches!(r.resolve(&p).unwrap(), Resolution::Excluded(_)));
    }
}
