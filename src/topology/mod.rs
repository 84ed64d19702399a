//! Topology engine
//!
//! Converts a cluster snapshot (plus optional flow records) into a
//! deduplicated component graph.
//!
//! Structure:
//! - `classifier.rs` - Namespace → group lookup
//! - `resolver.rs` - Pod and flow endpoint identity
//! - `security.rs` - Pod/container security context merge
//! - `connectivity.rs` - Service and Route matching
//! - `network.rs` - Flow export parsing and edge correlation
//! - `graph.rs` - Component graph and builder
//! - `error.rs` - Engine errors

pub mod classifier;
pub mod connectivity;
pub mod error;
pub mod graph;
pub mod network;
pub mod resolver;
pub mod security;

pub use classifier::{NamespaceClassifier, normalize_namespace};
pub use error::{TopologyError, TopologyResult};
pub use graph::{ComponentGraph, GraphBuilder};
pub use network::{CorrelationSummary, FlowEndpoint, FlowRecord};
pub use resolver::{ComponentResolver, Resolution};

use crate::models::ClusterSnapshot;

/// Result of one analysis run
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub graph: ComponentGraph,
    /// Present when flow records were supplied
    pub correlation: Option<CorrelationSummary>,
}

/// Build the component graph and, when flows are given, correlate them into edges
pub fn analyze(
    snapshot: &ClusterSnapshot,
    flows: Option<&[FlowRecord]>,
    resolver: &ComponentResolver,
) -> TopologyResult<Analysis> {
    let mut graph = GraphBuilder::new(resolver).build(snapshot)?;

    let correlation = match flows {
        Some(flows) => Some(network::correlate(flows, &mut graph, resolver)),
        None => {
            tracing::warn!("No network flow data supplied, components will have no edges");
            None
        }
    };

    Ok(Analysis { graph, correlation })
}
