//! Topology engine errors

use std::path::PathBuf;

/// Errors raised while building the component graph
///
/// Only malformed inputs are fatal; unresolvable flow endpoints are logged
/// and skipped by the correlator instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Expected one owner for pod {namespace}/{pod}, got {count}")]
    UnexpectedOwnerCount {
        namespace: String,
        pod: String,
        count: usize,
    },

    #[error("Malformed flow record on line {line}: expected at least {expected} columns, got {columns}")]
    MalformedFlowRecord {
        line: usize,
        columns: usize,
        expected: usize,
    },

    #[error("Failed to read flow export: {0}")]
    FlowInput(#[from] csv::Error),

    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;
