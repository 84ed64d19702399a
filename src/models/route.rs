//! OpenShift Route custom resource
//!
//! k8s-openapi only ships upstream Kubernetes types, so the `route.openshift.io/v1`
//! Route is declared here with just the fields exposure detection reads.
//! Unknown fields are ignored on deserialization.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Route specification
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    plural = "routes",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// External host name the router answers on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Path prefix routed to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Primary backend
    pub to: RouteTargetReference,
}

/// Backend a route points at
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTargetReference {
    /// Kind of the referent; only `Service` is meaningful for exposure
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

impl Route {
    /// Whether this route sends traffic to the named service in `namespace`
    pub fn targets_service(&self, namespace: &str, service: &str) -> bool {
        self.metadata.namespace.as_deref() == Some(namespace)
            && self.spec.to.kind == "Service"
            && self.spec.to.name == service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn route(namespace: &str, kind: &str, name: &str) -> Route {
        Route {
            metadata: ObjectMeta {
                name: Some("console".to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: RouteSpec {
                host: None,
                path: None,
                to: RouteTargetReference {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    weight: None,
                },
            },
        }
    }

    #[test]
    fn test_targets_service() {
        let r = route("openshift-console", "Service", "console");
        assert!(r.targets_service("openshift-console", "console"));
        assert!(!r.targets_service("openshift-console", "downloads"));
        assert!(!r.targets_service("default", "console"));
    }

    #[test]
    fn test_non_service_target_ignored() {
        let r = route("openshift-console", "Ingress", "console");
        assert!(!r.targets_service("openshift-console", "console"));
    }

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let json = serde_json::json!({
            "apiVersion": "route.openshift.io/v1",
            "kind": "Route",
            "metadata": {"name": "oauth", "namespace": "openshift-authentication"},
            "spec": {
                "host": "oauth.apps.example.com",
                "port": {"targetPort": 6443},
                "tls": {"termination": "passthrough"},
                "to": {"kind": "Service", "name": "oauth-openshift", "weight": 100}
            }
        });
        let r: Route = serde_json::from_value(json).unwrap();
        assert_eq!(r.spec.to.name, "oauth-openshift");
        assert_eq!(r.spec.to.weight, Some(100));
        assert!(r.targets_service("openshift-authentication", "oauth-openshift"));
    }
}
