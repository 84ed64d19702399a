//! Kubernetes client module
//!
//! Builds the client used to take cluster snapshots and hosts the snapshot
//! sources.
//!
//! Supports HTTP/HTTPS proxy configuration via standard environment variables:
//! - `HTTP_PROXY` / `http_proxy`: HTTP proxy URL
//! - `HTTPS_PROXY` / `https_proxy`: HTTPS proxy URL
//! - `NO_PROXY` / `no_proxy`: Comma-separated list of hosts to bypass proxy
//!
//! Internal cluster hosts are added to NO_PROXY automatically.

pub mod fetch;

pub use fetch::{FileSnapshotSource, KubeSnapshotSource, SnapshotSource, save_snapshot};

use anyhow::{Context, Result};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use url::Url;

/// Initialize a Kubernetes client, optionally for a named kubeconfig context
///
/// Without a context the default loading strategy applies:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(ctx) => {
            let options = KubeConfigOptions {
                context: Some(ctx.to_string()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options)
                .await
                .with_context(|| format!("Failed to load kubeconfig context '{}'", ctx))?
        }
        None => Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };

    if let Ok(url) = Url::parse(&config.cluster_url.to_string()) {
        if let Some(host) = url.host_str() {
            ensure_no_proxy_bypass(host);
        }
    }

    tracing::debug!("Connecting to cluster at {}", config.cluster_url);
    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Add an internal cluster host to NO_PROXY unless already covered
fn ensure_no_proxy_bypass(host: &str) {
    if !is_internal_host(host) {
        return;
    }

    let current = ["NO_PROXY", "no_proxy"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .unwrap_or_default();

    if no_proxy_contains(&current, host) {
        return;
    }

    let updated = if current.is_empty() {
        host.to_string()
    } else {
        format!("{},{}", current, host)
    };

    tracing::debug!("Adding {} to NO_PROXY", host);
    // SAFETY: set_var is unsafe in Rust 2024 due to potential data races.
    // This runs once, before the client spawns tasks that read the environment.
    unsafe {
        std::env::set_var("NO_PROXY", &updated);
        std::env::set_var("no_proxy", &updated);
    }
}

/// Whether a host looks like a private or cluster-internal address
fn is_internal_host(host: &str) -> bool {
    if matches!(host, "localhost" | "127.0.0.1" | "::1") {
        return true;
    }

    if let Ok(std::net::IpAddr::V4(ip)) = host.parse::<std::net::IpAddr>() {
        return ip.is_private() || ip.is_loopback() || ip.is_link_local();
    }

    const INTERNAL_SUFFIXES: &[&str] = &[".local", ".internal", ".cluster.local", ".corp"];
    INTERNAL_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}

/// Whether a NO_PROXY list already covers the host
///
/// Entries match exactly or as a domain suffix; a leading dot is optional.
fn no_proxy_contains(no_proxy: &str, host: &str) -> bool {
    no_proxy
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .any(|pattern| {
            if pattern == "*" {
                return true;
            }
            let domain = pattern.strip_prefix('.').unwrap_or(pattern);
            host == domain || host.ends_with(&format!(".{}", domain))
        })
}
