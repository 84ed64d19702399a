//! Merged security posture of a component
//!
//! A pod carries one pod-level security context and one security context per
//! container. `SecurityPosture` folds them into a single view: the pod-level
//! context is the baseline, container values override it, capabilities added
//! by any container accumulate, and the privilege booleans only ever move from
//! false to true.

use k8s_openapi::api::core::v1::{
    PodSecurityContext, SELinuxOptions, SeccompProfile, SecurityContext, Sysctl,
    WindowsSecurityContextOptions,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Normalized security attributes of a component
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPosture {
    // Pod-only attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_group: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_group_change_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supplemental_groups: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sysctls: Vec<Sysctl>,

    // Pod attributes containers may override
    #[serde(default)]
    pub run_as_non_root: bool,
    #[serde(default)]
    pub run_as_group: Option<i64>,
    #[serde(default)]
    pub run_as_user: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub se_linux_options: Option<SELinuxOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seccomp_profile: Option<SeccompProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_options: Option<WindowsSecurityContextOptions>,

    // Container-only attributes
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub capabilities_add: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub capabilities_drop: BTreeSet<String>,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub read_only_root_filesystem: bool,
    #[serde(default)]
    pub allow_privilege_escalation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proc_mount: Option<String>,
}

impl SecurityPosture {
    /// Baseline from the pod-level security context
    pub fn from_pod_context(sc: &PodSecurityContext) -> Self {
        Self {
            fs_group: sc.fs_group,
            fs_group_change_policy: sc.fs_group_change_policy.clone(),
            supplemental_groups: sc.supplemental_groups.clone().unwrap_or_default(),
            sysctls: sc.sysctls.clone().unwrap_or_default(),
            run_as_non_root: sc.run_as_non_root.unwrap_or(false),
            run_as_group: sc.run_as_group,
            run_as_user: sc.run_as_user,
            se_linux_options: sc.se_linux_options.clone(),
            seccomp_profile: sc.seccomp_profile.clone(),
            windows_options: sc.windows_options.clone(),
            ..Default::default()
        }
    }

    /// Layer one container's security context over the current posture
    ///
    /// Call in container declaration order: the last non-nil value wins for
    /// overridable fields.
    pub fn apply_container_context(&mut self, sc: &SecurityContext) {
        if sc.run_as_user.is_some() {
            self.run_as_user = sc.run_as_user;
        }
        if sc.run_as_group.is_some() {
            self.run_as_group = sc.run_as_group;
        }
        if let Some(non_root) = sc.run_as_non_root {
            self.run_as_non_root = non_root;
        }
        if sc.se_linux_options.is_some() {
            self.se_linux_options = sc.se_linux_options.clone();
        }
        if sc.seccomp_profile.is_some() {
            self.seccomp_profile = sc.seccomp_profile.clone();
        }
        if sc.windows_options.is_some() {
            self.windows_options = sc.windows_options.clone();
        }
        if sc.proc_mount.is_some() {
            self.proc_mount = sc.proc_mount.clone();
        }

        self.privileged |= sc.privileged.unwrap_or(false);
        self.read_only_root_filesystem |= sc.read_only_root_filesystem.unwrap_or(false);
        self.allow_privilege_escalation |= sc.allow_privilege_escalation.unwrap_or(false);

        if let Some(add) = sc.capabilities.as_ref().and_then(|c| c.add.as_ref()) {
            self.capabilities_add.extend(add.iter().cloned());
        }
    }

    /// Accumulate the monotonic flags of a later observation
    ///
    /// Only the privilege booleans and added capabilities carry over; every
    /// other field keeps the first observation's value.
    pub fn absorb_monotonic(&mut self, other: &SecurityPosture) {
        self.privileged |= other.privileged;
        self.read_only_root_filesystem |= other.read_only_root_filesystem;
        self.allow_privilege_escalation |= other.allow_privilege_escalation;
        self.capabilities_add
            .extend(other.capabilities_add.iter().cloned());
    }

    /// `user:role:type:level` rendering of the SELinux options, empty when unset
    pub fn se_linux_summary(&self) -> String {
        self.se_linux_options
            .as_ref()
            .map(|o| {
                [&o.user, &o.role, &o.type_, &o.level]
                    .iter()
                    .map(|v| v.as_deref().unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(":")
            })
            .unwrap_or_default()
    }

    /// Seccomp profile type, with the localhost profile path when present
    pub fn seccomp_summary(&self) -> String {
        match &self.seccomp_profile {
            Some(p) => match &p.localhost_profile {
                Some(path) => format!("{}:{}", p.type_, path),
                None => p.type_.clone(),
            },
            None => String::new(),
        }
    }

    /// `add=[..] drop=[..]` rendering, empty when no capabilities were declared
    pub fn capabilities_summary(&self) -> String {
        if self.capabilities_add.is_empty() && self.capabilities_drop.is_empty() {
            return String::new();
        }
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(",");
        format!(
            "add=[{}] drop=[{}]",
            join(&self.capabilities_add),
            join(&self.capabilities_drop)
        )
    }
}
