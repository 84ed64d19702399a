//! threatmap model layer
//!
//! Structure:
//! - `snapshot.rs` - Cluster inventory the analysis reads
//! - `route.rs` - OpenShift Route custom resource
//! - `component_key.rs` / `component.rs` - Component identity and record
//! - `posture.rs` - Merged security posture
//! - `workload_kind.rs` - Owner kinds with resolver-specific handling

pub mod component;
pub mod component_key;
pub mod posture;
pub mod route;
pub mod snapshot;
pub mod workload_kind;

pub use component::{Component, PodObservation};
pub use component_key::ComponentKey;
pub use posture::SecurityPosture;
pub use route::{Route, RouteSpec, RouteTargetReference};
pub use snapshot::ClusterSnapshot;
pub use workload_kind::WorkloadKind;
