//! Security posture merging
//!
//! Folds a pod's pod-level and container-level security contexts into one
//! `SecurityPosture` and derives the effective SCC label.

use crate::constants::{PRIVILEGED_SCC, SCC_ANNOTATION};
use crate::models::SecurityPosture;
use k8s_openapi::api::core::v1::{Container, Pod};

/// Merge one pod's security contexts
///
/// Returns the effective SCC (the `openshift.io/scc` annotation, forced to
/// `privileged` when any container runs privileged) and the merged posture.
/// Containers are applied in declaration order.
pub fn merge(pod: &Pod) -> (Option<String>, SecurityPosture) {
    let spec = pod.spec.as_ref();
    let mut posture = spec
        .and_then(|s| s.security_context.as_ref())
        .map(SecurityPosture::from_pod_context)
        .unwrap_or_default();

    let mut scc = pod
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(SCC_ANNOTATION))
        .filter(|v| !v.is_empty())
        .cloned();

    let containers: &[Container] = spec.map(|s| s.containers.as_slice()).unwrap_or_default();
    let mut drop_taken = false;
    for container in containers {
        let Some(sc) = &container.security_context else {
            continue;
        };

        if sc.privileged == Some(true) {
            scc = Some(PRIVILEGED_SCC.to_string());
        }

        // Dropped capabilities come from the first container that declares any
        if !drop_taken {
            if let Some(caps) = &sc.capabilities {
                posture
                    .capabilities_drop
                    .extend(caps.drop.iter().flatten().cloned());
                drop_taken = true;
            }
        }

        posture.apply_container_context(sc);
    }

    (scc, posture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        Capabilities, PodSecurityContext, PodSpec, SecurityContext,
    };
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    fn pod_with(
        annotation: Option<&str>,
        pod_sc: Option<PodSecurityContext>,
        containers: Vec<Option<SecurityContext>>,
    ) -> Pod {
        let annotations = annotation.map(|scc| {
            let mut a = BTreeMap::new();
            a.insert(SCC_ANNOTATION.to_string(), scc.to_string());
            a
        });
        Pod {
            metadata: ObjectMeta {
                name: Some("test".to_string()),
                annotations,
                ..Default::default()
            },
            spec: Some(PodSpec {
                security_context: pod_sc,
                containers: containers
                    .into_iter()
                    .enumerate()
                    .map(|(i, sc)| Container {
                        name: format!("c{}", i),
                        security_context: sc,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_annotation_is_scc() {
        let pod = pod_with(Some("restricted-v2"), None, vec![None]);
        let (scc, posture) = merge(&pod);
        assert_eq!(scc.as_deref(), Some("restricted-v2"));
        assert_eq!(posture, SecurityPosture::default());
    }

    #[test]
    fn test_no_spec_yields_default_posture() {
        let pod = Pod::default();
        let (scc, posture) = merge(&pod);
        assert!(scc.is_none());
        assert_eq!(posture, SecurityPosture::default());
    }

    #[test]
    fn test_later_container_wins() {
        let pod = pod_with(
            None,
            Some(PodSecurityContext {
                run_as_user: Some(1000),
                ..Default::default()
            }),
            vec![
                Some(SecurityContext {
                    run_as_user: Some(2000),
                    ..Default::default()
                }),
                None,
                Some(SecurityContext {
                    run_as_user: Some(3000),
                    ..Default::default()
                }),
            ],
        );
        let (_, posture) = merge(&pod);
        assert_eq!(posture.run_as_user, Some(3000));
    }

    #[test]
    fn test_drop_from_first_declaring_container() {
        let pod = pod_with(
            None,
            None,
            vec![
                Some(SecurityContext {
                    capabilities: Some(Capabilities {
                        add: Some(vec!["NET_BIND_SERVICE".to_string()]),
                        drop: Some(vec!["ALL".to_string()]),
                    }),
                    ..Default::default()
                }),
                Some(SecurityContext {
                    capabilities: Some(Capabilities {
                        add: Some(vec!["NET_RAW".to_string()]),
                        drop: Some(vec!["MKNOD".to_string()]),
                    }),
                    ..Default::default()
                }),
            ],
        );
        let (_, posture) = merge(&pod);
        assert_eq!(posture.capabilities_add.len(), 2);
        assert_eq!(
            posture.capabilities_drop.iter().collect::<Vec<_>>(),
            vec!["ALL"]
        );
    }
}
