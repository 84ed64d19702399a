//! Shared builders for integration tests
//!
//! Builds k8s-openapi objects in code so each test states only the fields
//! it cares about.

#![allow(dead_code)]

use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, Namespace, Pod, PodSpec, SecurityContext, Service, ServicePort,
    ServiceSpec, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use threatmap::models::{Route, RouteSpec, RouteTargetReference};

pub fn owner(kind: &str, name: &str) -> OwnerReference {
    OwnerReference {
        api_version: "apps/v1".to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        uid: format!("uid-{}", name),
        ..Default::default()
    }
}

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Pod builder with sensible defaults
pub struct PodBuilder {
    pod: Pod,
}

impl PodBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            pod: Pod {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    namespace: Some(namespace.to_string()),
                    ..Default::default()
                },
                spec: Some(PodSpec::default()),
                ..Default::default()
            },
        }
    }

    fn spec(&mut self) -> &mut PodSpec {
        self.pod.spec.get_or_insert_with(PodSpec::default)
    }

    pub fn owned_by(mut self, kind: &str, name: &str) -> Self {
        self.pod
            .metadata
            .owner_references
            .get_or_insert_with(Vec::new)
            .push(owner(kind, name));
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.pod
            .metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.pod
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn node_name(mut self, node: &str) -> Self {
        self.spec().node_name = Some(node.to_string());
        self
    }

    pub fn node_selector(mut self, key: &str) -> Self {
        self.spec()
            .node_selector
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), String::new());
        self
    }

    pub fn host_network(mut self) -> Self {
        self.spec().host_network = Some(true);
        self
    }

    pub fn priority_class(mut self, class: &str) -> Self {
        self.spec().priority_class_name = Some(class.to_string());
        self
    }

    pub fn container(mut self, container: Container) -> Self {
        self.spec().containers.push(container);
        self
    }

    pub fn build(self) -> Pod {
        self.pod
    }
}

pub fn container(name: &str) -> Container {
    Container {
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn with_security(mut c: Container, sc: SecurityContext) -> Container {
    c.security_context = Some(sc);
    c
}

pub fn with_mounts(mut c: Container, paths: &[&str]) -> Container {
    c.volume_mounts = Some(
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| VolumeMount {
                name: format!("vol-{}", i),
                mount_path: p.to_string(),
                ..Default::default()
            })
            .collect(),
    );
    c
}

pub fn with_port(mut c: Container, port: i32, name: Option<&str>) -> Container {
    c.ports.get_or_insert_with(Vec::new).push(ContainerPort {
        container_port: port,
        name: name.map(str::to_string),
        ..Default::default()
    });
    c
}

pub fn replica_set(namespace: &str, name: &str, owner_ref: Option<(&str, &str)>) -> ReplicaSet {
    ReplicaSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            owner_references: owner_ref.map(|(k, n)| vec![owner(k, n)]),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn namespace(name: &str, run_level: Option<&str>) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: run_level.map(|lvl| labels(&[("openshift.io/run-level", lvl)])),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn service(namespace: &str, name: &str, selector: &[(&str, &str)], ports: &[i32]) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(labels(selector)),
            ports: Some(
                ports
                    .iter()
                    .map(|p| ServicePort {
                        port: *p,
                        target_port: Some(IntOrString::Int(*p)),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn route(namespace: &str, name: &str, service: &str) -> Route {
    let mut route = Route::new(
        name,
        RouteSpec {
            host: Some(format!("{}.apps.example.com", name)),
            path: None,
            to: RouteTargetReference {
                kind: "Service".to_string(),
                name: service.to_string(),
                weight: Some(100),
            },
        },
    );
    route.metadata.namespace = Some(namespace.to_string());
    route
}

/// Flow export with a header row and one row per (src, dst) triple
pub fn flow_csv(rows: &[((&str, &str, &str), (&str, &str, &str))]) -> String {
    const WIDTH: usize = 32;
    let header = (0..WIDTH)
        .map(|i| format!("col{}", i))
        .collect::<Vec<_>>()
        .join(",");
    let mut out = vec![header];
    for (src, dst) in rows {
        let mut cols = vec![String::new(); WIDTH];
        cols[5] = src.0.to_string();
        cols[21] = src.1.to_string();
        cols[6] = src.2.to_string();
        cols[8] = dst.0.to_string();
        cols[16] = dst.1.to_string();
        cols[3] = dst.2.to_string();
        out.push(cols.join(","));
    }
    out.join("\n") + "\n"
}
