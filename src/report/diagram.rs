//! Grouped node/edge diagram
//!
//! Emits one diagram per group in a Threat Dragon style JSON document. A
//! group's diagram holds its own components, every known component they are
//! connected to, and one flow per distinct directed edge.

use crate::models::{Component, ComponentKey};
use crate::topology::ComponentGraph;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const DIAGRAM_VERSION: &str = "2.0.1";
const NODES_PER_ROW: usize = 8;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThreatModel {
    pub version: String,
    pub summary: Summary,
    pub detail: Detail,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Detail {
    pub diagrams: Vec<Diagram>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: usize,
    pub title: String,
    pub diagram_type: String,
    pub version: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CellRef {
    pub cell: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CellData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: String,
    pub shape: String,
    pub z_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CellRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<CellRef>,
    pub data: CellData,
}

impl Cell {
    fn process(component: &Component, index: usize) -> Self {
        Self {
            id: component.key().as_path(),
            shape: "process".to_string(),
            z_index: 1,
            position: Some(Position {
                x: ((index * 100) % 800) * 2,
                y: (100 * (index / NODES_PER_ROW)) * 2,
            }),
            source: None,
            target: None,
            data: CellData {
                name: component.name.clone(),
                kind: "tm.Process".to_string(),
            },
        }
    }

    fn flow(name: &str, src: &ComponentKey, dst: &ComponentKey) -> Self {
        Self {
            id: name.to_string(),
            shape: "flow".to_string(),
            z_index: 10,
            position: None,
            source: Some(CellRef {
                cell: src.as_path(),
            }),
            target: Some(CellRef {
                cell: dst.as_path(),
            }),
            data: CellData {
                name: name.to_string(),
                kind: "tm.Flow".to_string(),
            },
        }
    }
}

/// Edge name used as the flow cell id
pub fn edge_name(src: &ComponentKey, dst: &ComponentKey) -> String {
    format!("{} to {}", src, dst)
}

/// Diagram for one group
pub fn diagram_for_group(graph: &ComponentGraph, group: &str, id: usize) -> Diagram {
    let mut nodes: BTreeMap<ComponentKey, &Component> = BTreeMap::new();
    let mut edges: BTreeMap<String, (ComponentKey, ComponentKey)> = BTreeMap::new();

    for (key, component) in graph.components().filter(|(_, c)| c.group == group) {
        nodes.insert(key.clone(), component);

        let outgoing = component
            .outgoing_connections
            .iter()
            .map(|dst| (key.clone(), dst.clone()));
        let incoming = component
            .incoming_connections
            .iter()
            .map(|src| (src.clone(), key.clone()));

        for (src, dst) in outgoing.chain(incoming) {
            let mut known = true;
            for endpoint in [&src, &dst] {
                match graph.get(endpoint) {
                    Some(peer) => {
                        nodes.entry(endpoint.clone()).or_insert(peer);
                    }
                    None => {
                        tracing::warn!("Edge points to unknown component: {}", endpoint);
                        known = false;
                    }
                }
            }
            if known {
                edges.entry(edge_name(&src, &dst)).or_insert((src, dst));
            }
        }
    }

    let mut cells: Vec<Cell> = nodes
        .values()
        .enumerate()
        .map(|(i, c)| Cell::process(c, i))
        .collect();
    cells.extend(
        edges
            .iter()
            .map(|(name, (src, dst))| Cell::flow(name, src, dst)),
    );

    Diagram {
        id,
        title: format!("{} diagram", group),
        diagram_type: "Generic".to_string(),
        version: DIAGRAM_VERSION.to_string(),
        cells,
    }
}

/// Threat model document with one diagram per group
///
/// `groups` should already have excluded groups removed.
pub fn build(graph: &ComponentGraph, groups: &[String], generated: DateTime<Utc>) -> ThreatModel {
    let diagrams = groups
        .iter()
        .enumerate()
        .map(|(id, group)| diagram_for_group(graph, group, id))
        .collect();

    ThreatModel {
        version: DIAGRAM_VERSION.to_string(),
        summary: Summary {
            title: "Cluster threat model".to_string(),
            description: format!("Generated by threatmap on {}", generated.to_rfc3339()),
        },
        detail: Detail { diagrams },
    }
}

/// Pretty-printed JSON form
pub fn render(model: &ThreatModel) -> Result<String> {
    serde_json::to_string_pretty(model).context("Failed to serialize threat model to JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PodObservation;

    fn graph() -> ComponentGraph {
        let mut graph = ComponentGraph::new();
        let dns = ComponentKey::new("networking", "dns", "DaemonSet", "dns");
        let api = ComponentKey::new("kube control plane", "kube-apiserver", "StaticPods", "kube-apiserver");
        for key in [&dns, &api] {
            graph.observe(&PodObservation {
                key: key.clone(),
                ..Default::default()
            });
        }
        graph.connect(&dns, &api);
        graph
    }

    #[test]
    fn test_diagram_pulls_in_peers() {
        let d = diagram_for_group(&graph(), "networking", 0);
        let processes = d.cells.iter().filter(|c| c.shape == "process").count();
        let flows: Vec<_> = d.cells.iter().filter(|c| c.shape == "flow").collect();
        assert_eq!(processes, 2);
        assert_eq!(flows.len(), 1);
        assert_eq!(
            flows[0].id,
            "networking/dns/DaemonSet/dns to kube control plane/kube-apiserver/StaticPods/kube-apiserver"
        );
    }

    #[test]
    fn test_empty_group_has_no_cells() {
        let d = diagram_for_group(&graph(), "storage", 3);
        assert_eq!(d.id, 3);
        assert!(d.cells.is_empty());
    }
}
