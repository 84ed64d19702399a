//! Network flow correlation
//!
//! Reads an exported flow log and turns each record into a directed edge
//! between two known components. Endpoints are resolved with the same
//! identity rules as pods, then redirected through the service index when
//! they name a Service rather than a workload.

use super::error::{TopologyError, TopologyResult};
use super::graph::ComponentGraph;
use super::resolver::ComponentResolver;
use crate::models::ComponentKey;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// Zero-based columns of the flow export
const COL_DST_OWNER_NAME: usize = 3;
const COL_SRC_NAMESPACE: usize = 5;
const COL_SRC_OWNER_NAME: usize = 6;
const COL_DST_NAMESPACE: usize = 8;
const COL_DST_OWNER_TYPE: usize = 16;
const COL_SRC_OWNER_TYPE: usize = 21;

/// Minimum number of columns a flow row must carry
pub const MIN_FLOW_COLUMNS: usize = COL_SRC_OWNER_TYPE + 1;

/// One side of a flow record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowEndpoint {
    pub namespace: String,
    pub owner_type: String,
    pub owner_name: String,
}

impl FlowEndpoint {
    pub fn new(
        namespace: impl Into<String>,
        owner_type: impl Into<String>,
        owner_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            owner_type: owner_type.into(),
            owner_name: owner_name.into(),
        }
    }
}

/// One observed connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowRecord {
    pub src: FlowEndpoint,
    pub dst: FlowEndpoint,
}

/// Outcome of correlating a batch of flows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelationSummary {
    pub flows: usize,
    pub edges_added: usize,
    pub dropped: usize,
}

/// Parse a flow export; the header row is skipped
pub fn read_flows<R: Read>(reader: R) -> TopologyResult<Vec<FlowRecord>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut flows = Vec::new();
    for (idx, row) in csv.records().enumerate() {
        let row = row?;
        if row.len() < MIN_FLOW_COLUMNS {
            return Err(TopologyError::MalformedFlowRecord {
                // header is line 1
                line: row.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
                columns: row.len(),
                expected: MIN_FLOW_COLUMNS,
            });
        }
        let field = |i: usize| row.get(i).unwrap_or_default().trim().to_string();
        flows.push(FlowRecord {
            src: FlowEndpoint {
                namespace: field(COL_SRC_NAMESPACE),
                owner_type: field(COL_SRC_OWNER_TYPE),
                owner_name: field(COL_SRC_OWNER_NAME),
            },
            dst: FlowEndpoint {
                namespace: field(COL_DST_NAMESPACE),
                owner_type: field(COL_DST_OWNER_TYPE),
                owner_name: field(COL_DST_OWNER_NAME),
            },
        });
    }

    tracing::debug!("Read {} flow records", flows.len());
    Ok(flows)
}

/// Parse a flow export from disk
pub fn read_flows_from_path(path: &Path) -> TopologyResult<Vec<FlowRecord>> {
    let file = File::open(path).map_err(|source| TopologyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_flows(file)
}

/// Add one deduplicated edge per distinct (src, dst) pair of known components
///
/// Flows with an endpoint the graph does not know are dropped; each distinct
/// unknown key is warned about once.
pub fn correlate(
    flows: &[FlowRecord],
    graph: &mut ComponentGraph,
    resolver: &ComponentResolver,
) -> CorrelationSummary {
    let mut summary = CorrelationSummary {
        flows: flows.len(),
        ..Default::default()
    };
    let mut warned: HashSet<String> = HashSet::new();

    for flow in flows {
        let src = endpoint_key(&flow.src, graph, resolver);
        let dst = endpoint_key(&flow.dst, graph, resolver);

        let src = known_or_warn(src, &flow.src, "src", graph, &mut warned);
        let dst = known_or_warn(dst, &flow.dst, "dst", graph, &mut warned);

        match (src, dst) {
            (Some(src), Some(dst)) => {
                if graph.connect(&src, &dst) {
                    summary.edges_added += 1;
                }
            }
            _ => summary.dropped += 1,
        }
    }

    tracing::info!(
        "Correlated {} flows: {} edges added, {} dropped",
        summary.flows,
        summary.edges_added,
        summary.dropped
    );
    summary
}

fn endpoint_key(
    endpoint: &FlowEndpoint,
    graph: &ComponentGraph,
    resolver: &ComponentResolver,
) -> Option<ComponentKey> {
    let key = resolver.flow_endpoint_key(
        &endpoint.namespace,
        &endpoint.owner_type,
        &endpoint.owner_name,
    )?;
    Some(graph.owner_of_service(&key).cloned().unwrap_or(key))
}

fn known_or_warn(
    key: Option<ComponentKey>,
    endpoint: &FlowEndpoint,
    side: &str,
    graph: &ComponentGraph,
    warned: &mut HashSet<String>,
) -> Option<ComponentKey> {
    let rendered = match &key {
        Some(k) if graph.contains(k) => return key,
        Some(k) => k.as_path(),
        None => format!(
            "{}/{}/{}",
            endpoint.namespace, endpoint.owner_type, endpoint.owner_name
        ),
    };
    if warned.insert(rendered.clone()) {
        tracing::warn!("Unknown {} component {}", side, rendered);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(src: (&str, &str, &str), dst: (&str, &str, &str)) -> String {
        let mut cols = vec![String::new(); MIN_FLOW_COLUMNS + 2];
        cols[COL_SRC_NAMESPACE] = src.0.to_string();
        cols[COL_SRC_OWNER_TYPE] = src.1.to_string();
        cols[COL_SRC_OWNER_NAME] = src.2.to_string();
        cols[COL_DST_NAMESPACE] = dst.0.to_string();
        cols[COL_DST_OWNER_TYPE] = dst.1.to_string();
        cols[COL_DST_OWNER_NAME] = dst.2.to_string();
        cols.join(",")
    }

    #[test]
    fn test_read_flows_skips_header() {
        let header = (0..MIN_FLOW_COLUMNS + 2)
            .map(|i| format!("c{}", i))
            .collect::<Vec<_>>()
            .join(",");
        let data = format!(
            "{}\n{}\n",
            header,
            row(
                ("openshift-dns", "DaemonSet", "dns"),
                ("default", "Service", "kubernetes")
            )
        );
        let flows = read_flows(data.as_bytes()).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(
            flows[0].src,
            FlowEndpoint::new("openshift-dns", "DaemonSet", "dns")
        );
        assert_eq!(flows[0].dst, FlowEndpoint::new("default", "Service", "kubernetes"));
    }

    #[test]
    fn test_short_row_is_malformed() {
        let data = "a,b,c\n1,2,3\n";
        let err = read_flows(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::MalformedFlowRecord {
                line: 2,
                columns: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_flows_from_path(Path::new("/nonexistent/flows.csv")).unwrap_err();
        assert!(matches!(err, TopologyError::Io { .. }));
    }
}
