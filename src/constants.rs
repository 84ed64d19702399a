//! Well-known label, annotation and naming constants
//!
//! OpenShift conventions the resolver and reports rely on. Kept in one place
//! so heuristics do not scatter string literals.

/// Prefix carried by nearly every platform namespace; stripped before classification
pub const OPENSHIFT_PREFIX: &str = "openshift-";

/// Pod label naming the app; used to name static pods and to drop guard pods
pub const APP_LABEL: &str = "app";

/// Value of the `app` label carried by static-pod guard pods
pub const GUARD_APP: &str = "guard";

/// Pod annotation recording the admitted Security Context Constraint
pub const SCC_ANNOTATION: &str = "openshift.io/scc";

/// SCC reported for any pod with a privileged container
pub const PRIVILEGED_SCC: &str = "privileged";

/// Namespace label holding the OpenShift run level
pub const RUN_LEVEL_LABEL: &str = "openshift.io/run-level";

/// Prefix of node selector keys that pin a pod to a node role
pub const NODE_ROLE_PREFIX: &str = "node-role";

/// Owner-name prefix of the ConfigMaps static-pod revision controllers rotate
pub const REVISION_STATUS_PREFIX: &str = "revision-status";

/// Substring marking metrics-only services and container ports
pub const METRICS_MARKER: &str = "metrics";

/// Suffix marking operator components
pub const OPERATOR_SUFFIX: &str = "operator";

/// Group assigned to namespaces missing from the classification table
pub const DEFAULT_GROUP: &str = "other";

/// Field selector restricting pod listing to running pods
pub const RUNNING_PODS_SELECTOR: &str = "status.phase=Running";
