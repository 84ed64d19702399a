//! Tab-separated audit export
//!
//! One header row, then one row per component in sorted key order.

use crate::models::{Component, ComponentKey, SecurityPosture};
use crate::topology::ComponentGraph;
use anyhow::{Context, Result};
use std::collections::BTreeSet;

pub const HEADER: [&str; 26] = [
    "Group",
    "Namespace",
    "Name",
    "DeployedAs",
    "RunsOn",
    "IsOperator",
    "Default SCC",
    "RunLevel",
    "HostIPC",
    "HostNetwork",
    "HostPID",
    "RunAsNonRoot",
    "RunAsGroup",
    "RunAsUser",
    "SELinuxOptions",
    "SeccompProfile",
    "Capabilities",
    "Privileged",
    "ReadOnlyRootFilesystem",
    "AllowPrivilegeEscalation",
    "PriorityClass",
    "InboundTraffic?",
    "ExternallyExposed?",
    "IncomingConnections",
    "OutgoingConnections",
    "HostMounts",
];

/// Cell values of one component, in `HEADER` order
pub fn row(c: &Component) -> Vec<String> {
    let default_posture = SecurityPosture::default();
    let sc = c.security_context.as_ref().unwrap_or(&default_posture);
    let opt_num = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();

    vec![
        c.group.clone(),
        c.namespace.clone(),
        c.name.clone(),
        c.deployed_as.clone(),
        c.runs_on.clone(),
        c.is_operator.to_string(),
        c.scc.clone().unwrap_or_default(),
        c.run_level.clone().unwrap_or_default(),
        c.host_ipc.to_string(),
        c.host_network.to_string(),
        c.host_pid.to_string(),
        sc.run_as_non_root.to_string(),
        opt_num(sc.run_as_group),
        opt_num(sc.run_as_user),
        sc.se_linux_summary(),
        sc.seccomp_summary(),
        sc.capabilities_summary(),
        sc.privileged.to_string(),
        sc.read_only_root_filesystem.to_string(),
        sc.allow_privilege_escalation.to_string(),
        c.priority_class.clone().unwrap_or_default(),
        c.inbound_traffic.to_string(),
        c.externally_exposed.to_string(),
        join_keys(&c.incoming_connections),
        join_keys(&c.outgoing_connections),
        c.host_mounts.iter().cloned().collect::<Vec<_>>().join(","),
    ]
}

fn join_keys(keys: &BTreeSet<ComponentKey>) -> String {
    keys.iter()
        .map(ComponentKey::as_path)
        .collect::<Vec<_>>()
        .join(",")
}

/// Render the whole graph as TSV
pub fn render(graph: &ComponentGraph) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .context("Failed to write TSV header")?;
    for (key, component) in graph.components() {
        writer
            .write_record(row(component))
            .with_context(|| format!("Failed to write TSV row for {}", key))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush TSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("TSV output is not valid UTF-8")
}
