//! Connectivity derivation
//!
//! Matches Services and Routes against a pod to decide whether the pod's
//! component receives traffic and whether it is exposed outside the cluster.
//!
//! Services that only front health probes or metrics endpoints are ignored.
//! The decision is made per service port:
//! - a port is *serving* when some container declares it under a name that
//!   does not mention metrics
//! - a port is *auxiliary* when it is not serving and either an HTTP probe
//!   targets it or the container port that declares it is metrics-named
//!
//! A service is suppressed only when it has ports and every one of them is
//! auxiliary. A service without a selector never matches.

use crate::constants::METRICS_MARKER;
use crate::models::Route;
use k8s_openapi::api::core::v1::{Container, Pod, Probe, Service, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// Connectivity facts derived for one pod
#[derive(Debug, Clone, Default)]
pub struct Connectivity<'a> {
    /// Non-suppressed services selecting the pod
    pub services: Vec<&'a Service>,
    pub inbound_traffic: bool,
    pub externally_exposed: bool,
}

/// Derive connectivity of a pod against the services of its namespace and all routes
pub fn derive<'a>(pod: &Pod, services: &'a [Service], routes: &[Route]) -> Connectivity<'a> {
    let matching = services_selecting(pod, services);
    let externally_exposed = matching
        .iter()
        .any(|svc| !routes_targeting(svc, routes).is_empty());

    Connectivity {
        inbound_traffic: !matching.is_empty(),
        externally_exposed,
        services: matching,
    }
}

/// Services in `services` that select `pod`, excluding metrics and probe-only services
///
/// Callers pass the services of the pod's namespace; services from other
/// namespaces are skipped regardless.
pub fn services_selecting<'a>(pod: &Pod, services: &'a [Service]) -> Vec<&'a Service> {
    let pod_ns = pod.metadata.namespace.as_deref().unwrap_or_default();

    services
        .iter()
        .filter(|svc| svc.metadata.namespace.as_deref().unwrap_or_default() == pod_ns)
        .filter(|svc| {
            let name = svc.metadata.name.as_deref().unwrap_or_default();
            if name.contains(METRICS_MARKER) {
                tracing::debug!("Ignoring metrics service {}/{}", pod_ns, name);
                return false;
            }
            true
        })
        .filter(|svc| selector_matches(pod, svc))
        .filter(|svc| {
            if is_auxiliary_only(pod, svc) {
                tracing::debug!(
                    "Ignoring probe/metrics-only service {}/{}",
                    pod_ns,
                    svc.metadata.name.as_deref().unwrap_or_default()
                );
                return false;
            }
            true
        })
        .collect()
}

/// Routes in the service's namespace that point at the service
pub fn routes_targeting<'a>(service: &Service, routes: &'a [Route]) -> Vec<&'a Route> {
    let (Some(ns), Some(name)) = (
        service.metadata.namespace.as_deref(),
        service.metadata.name.as_deref(),
    ) else {
        return Vec::new();
    };
    routes
        .iter()
        .filter(|r| r.targets_service(ns, name))
        .collect()
}

fn selector_matches(pod: &Pod, service: &Service) -> bool {
    let Some(selector) = service.spec.as_ref().and_then(|s| s.selector.as_ref()) else {
        return false;
    };
    if selector.is_empty() {
        return false;
    }
    let labels = pod.metadata.labels.as_ref();
    selector
        .iter()
        .all(|(k, v)| labels.and_then(|l| l.get(k)) == Some(v))
}

fn containers(pod: &Pod) -> &[Container] {
    pod.spec
        .as_ref()
        .map(|s| s.containers.as_slice())
        .unwrap_or_default()
}

fn is_auxiliary_only(pod: &Pod, service: &Service) -> bool {
    let ports = service
        .spec
        .as_ref()
        .and_then(|s| s.ports.as_deref())
        .unwrap_or_default();
    if ports.is_empty() {
        return false;
    }
    let containers = containers(pod);
    ports.iter().all(|p| port_is_auxiliary(containers, p))
}

fn port_is_auxiliary(containers: &[Container], service_port: &ServicePort) -> bool {
    let Some(target) = resolve_target_port(containers, service_port) else {
        // Named target port no container declares; nothing suggests it is auxiliary
        return false;
    };

    let mut serving = false;
    let mut metrics_named = false;
    let mut probed = false;

    for container in containers {
        for cp in container.ports.iter().flatten() {
            if cp.container_port != target {
                continue;
            }
            let named_metrics = cp
                .name
                .as_deref()
                .map(|n| n.contains(METRICS_MARKER))
                .unwrap_or(false);
            if named_metrics {
                metrics_named = true;
            } else {
                serving = true;
            }
        }

        let probes = [
            &container.liveness_probe,
            &container.readiness_probe,
            &container.startup_probe,
        ];
        if probes
            .into_iter()
            .flatten()
            .any(|probe| probe_port(container, probe) == Some(target))
        {
            probed = true;
        }
    }

    !serving && (probed || metrics_named)
}

/// Numeric port a service port forwards to
///
/// A missing target port defaults to the service port; a named one resolves
/// through the pod's container port names.
fn resolve_target_port(containers: &[Container], service_port: &ServicePort) -> Option<i32> {
    match &service_port.target_port {
        None => Some(service_port.port),
        Some(IntOrString::Int(port)) => Some(*port),
        Some(IntOrString::String(name)) => containers
            .iter()
            .flat_map(|c| c.ports.iter().flatten())
            .find(|cp| cp.name.as_deref() == Some(name.as_str()))
            .map(|cp| cp.container_port),
    }
}

fn probe_port(container: &Container, probe: &Probe) -> Option<i32> {
    match &probe.http_get.as_ref()?.port {
        IntOrString::Int(port) => Some(*port),
        IntOrString::String(name) => container
            .ports
            .iter()
            .flatten()
            .find(|cp| cp.name.as_deref() == Some(name.as_str()))
            .map(|cp| cp.container_port),
    }
}
