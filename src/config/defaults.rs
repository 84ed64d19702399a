//! Default configuration values
//!
//! Provides the default configuration instance and the built-in
//! namespace classification table for OpenShift platform namespaces.

use super::schema::Config;
use std::collections::BTreeMap;

/// Get the default configuration
pub fn default_config() -> Config {
    Config::default()
}

/// Built-in group → namespace table
///
/// Namespaces are listed without their `openshift-` prefix.
pub fn default_namespace_groups() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        (
            "kube control plane",
            &[
                "kube-apiserver-operator",
                "kube-apiserver",
                "kube-controller-manager-operator",
                "kube-controller-manager",
                "kube-scheduler-operator",
                "kube-scheduler",
                "etcd-operator",
                "etcd",
            ],
        ),
        (
            "openshift control plane",
            &[
                "apiserver-operator",
                "apiserver",
                "controller-manager-operator",
                "controller-manager",
                "cloud-controller-manager-operator",
                "cloud-credential-operator",
                "cluster-version",
                "config-operator",
            ],
        ),
        (
            "machine management",
            &[
                "cluster-machine-approver",
                "cluster-node-tuning-operator",
                "machine-api",
                "machine-config-operator",
            ],
        ),
        ("OLM", &["marketplace", "operator-lifecycle-manager"]),
        (
            "auth",
            &["authentication-operator", "authentication", "oauth-apiserver"],
        ),
        ("console", &["console-operator", "console"]),
        (
            "networking",
            &[
                "dns-operator",
                "dns",
                "multus",
                "network-diagnostics",
                "network-operator",
                "ingress-canary",
                "ingress-operator",
                "ingress",
                "route-controller-manager",
                "sdn",
                "service-ca-operator",
                "service-ca",
            ],
        ),
        ("observability", &["monitoring"]),
        (
            "storage",
            &[
                "cluster-storage-operator",
                "kube-storage-version-migrator-operator",
                "kube-storage-version-migrator",
                "image-registry",
            ],
        ),
        ("other", &["cluster-samples-operator", "insights"]),
    ];

    table
        .iter()
        .map(|(group, namespaces)| {
            (
                group.to_string(),
                namespaces.iter().map(|ns| ns.to_string()).collect(),
            )
        })
        .collect()
}
