//! Component identity
//!
//! A component is addressed by `group/namespace/kind/name`. The rendered path
//! form is what reports print and what edges store, so ordering follows the
//! rendered string to keep report output lexicographically sorted.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Canonical identity of a component
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    pub group: String,
    pub namespace: String,
    pub kind: String,
    pub name: String,
}

impl ComponentKey {
    pub fn new(
        group: impl Into<String>,
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            namespace: namespace.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Rendered `group/namespace/kind/name` form
    pub fn as_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group, self.namespace, self.kind, self.name
        )
    }

    /// Key under which a service in the same group and namespace is indexed
    pub fn service(group: &str, namespace: &str, service: &str) -> Self {
        Self::new(group, namespace, "Service", service)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.group, self.namespace, self.kind, self.name
        )
    }
}

impl Ord for ComponentKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Ties on the rendered path only happen when a field contains '/'
        self.as_path().cmp(&other.as_path()).then_with(|| {
            (&self.group, &self.namespace, &self.kind, &self.name).cmp(&(
                &other.group,
                &other.namespace,
                &other.kind,
                &other.name,
            ))
        })
    }
}

impl PartialOrd for ComponentKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for ComponentKey {
    type Err = String;

    /// Parse the rendered form; group names may contain spaces but never slashes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(4, '/').collect();
        match parts.as_slice() {
            [group, namespace, kind, name] => Ok(Self::new(*group, *namespace, *kind, *name)),
            _ => Err(format!("Invalid component key: {}", s)),
        }
    }
}

impl Serialize for ComponentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_path())
    }
}

impl<'de> Deserialize<'de> for ComponentKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
