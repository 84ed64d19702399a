//! threatmap library
//!
//! Correlates a point-in-time OpenShift cluster snapshot (and optionally an
//! exported network flow log) into a deduplicated graph of components with
//! merged security posture and connectivity, then projects it into reports.
//! It can be used both as a binary and as a library for testing.

pub mod cli;
pub mod config;
pub mod constants;
pub mod kube;
pub mod models;
pub mod report;
pub mod topology;

// Re-export commonly used types for convenience
pub use models::{ClusterSnapshot, Component, ComponentKey, SecurityPosture};
pub use topology::{Analysis, ComponentGraph, ComponentResolver, NamespaceClassifier, analyze};
