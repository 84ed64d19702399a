//! Cluster snapshot sources
//!
//! A snapshot is either listed from a live cluster or read back from a file
//! saved earlier with `threatmap snapshot`.

use crate::constants::RUNNING_PODS_SELECTOR;
use crate::models::{ClusterSnapshot, Route};
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use kube::Api;
use kube::api::ListParams;
use std::path::{Path, PathBuf};

/// Source of a point-in-time cluster inventory
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Materialize the snapshot
    async fn fetch(&self) -> Result<ClusterSnapshot>;
}

/// Lists the snapshot from a live cluster
pub struct KubeSnapshotSource {
    client: kube::Client,
    running_pods_only: bool,
}

impl KubeSnapshotSource {
    pub fn new(client: kube::Client) -> Self {
        Self {
            client,
            running_pods_only: true,
        }
    }

    /// Include pods in every phase, not only Running
    pub fn with_running_pods_only(mut self, running_only: bool) -> Self {
        self.running_pods_only = running_only;
        self
    }

    fn pod_params(&self) -> ListParams {
        if self.running_pods_only {
            ListParams::default().fields(RUNNING_PODS_SELECTOR)
        } else {
            ListParams::default()
        }
    }

    async fn list_routes(&self) -> Vec<Route> {
        let api: Api<Route> = Api::all(self.client.clone());
        match api.list(&ListParams::default()).await {
            Ok(list) => list.items,
            Err(e) => {
                tracing::warn!("Unable to list routes, assuming none are exposed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SnapshotSource for KubeSnapshotSource {
    async fn fetch(&self) -> Result<ClusterSnapshot> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let pods: Api<Pod> = Api::all(self.client.clone());
        let replica_sets: Api<ReplicaSet> = Api::all(self.client.clone());
        let services: Api<Service> = Api::all(self.client.clone());
        let pod_params = self.pod_params();
        let params = ListParams::default();

        let (namespaces, pods, replica_sets, services, routes) = futures::try_join!(
            async {
                namespaces
                    .list(&params)
                    .await
                    .context("Failed to list namespaces")
            },
            async { pods.list(&pod_params).await.context("Failed to list pods") },
            async {
                replica_sets
                    .list(&params)
                    .await
                    .context("Failed to list replica sets")
            },
            async {
                services
                    .list(&params)
                    .await
                    .context("Failed to list services")
            },
            async { Ok::<_, anyhow::Error>(self.list_routes().await) },
        )?;

        let snapshot = ClusterSnapshot {
            namespaces: namespaces.items,
            pods: pods.items,
            replica_sets: replica_sets.items,
            services: services.items,
            routes,
        };
        tracing::info!("Fetched snapshot: {}", snapshot.summary());
        Ok(snapshot)
    }
}

/// Reads a snapshot saved to disk
///
/// Files ending in `.json` are parsed as JSON, anything else as YAML.
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::debug!("Created file snapshot source: {:?}", path);
        Self { path }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn fetch(&self) -> Result<ClusterSnapshot> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot: {:?}", self.path))?;

        let snapshot: ClusterSnapshot = if is_json(&self.path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON snapshot: {:?}", self.path))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML snapshot: {:?}", self.path))?
        };

        tracing::info!("Loaded snapshot from {:?}: {}", self.path, snapshot.summary());
        Ok(snapshot)
    }
}

/// Write a snapshot to disk, JSON or YAML by extension
pub async fn save_snapshot(snapshot: &ClusterSnapshot, path: &Path) -> Result<()> {
    let content = if is_json(path) {
        serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot to JSON")?
    } else {
        serde_yaml::to_string(snapshot).context("Failed to serialize snapshot to YAML")?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write snapshot: {:?}", path))?;
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn snapshot() -> ClusterSnapshot {
        ClusterSnapshot {
            pods: vec![Pod {
                metadata: ObjectMeta {
                    name: Some("dns-abcde".to_string()),
                    namespace: Some("openshift-dns".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_load_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snap.json");
        save_snapshot(&snapshot(), &path).await.unwrap();

        let loaded = FileSnapshotSource::new(&path).fetch().await.unwrap();
        assert_eq!(loaded.pods.len(), 1);
        assert_eq!(loaded.pods[0].metadata.name.as_deref(), Some("dns-abcde"));
    }

    #[tokio::test]
    async fn test_save_and_load_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("snap.yaml");
        save_snapshot(&snapshot(), &path).await.unwrap();

        let loaded = FileSnapshotSource::new(&path).fetch().await.unwrap();
        assert_eq!(loaded.pods.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = FileSnapshotSource::new("/nonexistent/snap.yaml")
            .fetch()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot"));
    }
}
