use std::fmt::{Display, Formatter};

use itertools::Itertools;

/// A named boolean condition reported by a peer, e.g. `Ready=true`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PeerCondition {
    pub kind: String,
    pub status: bool,
}

impl PeerCondition {
    pub fn new(kind: impl Into<String>, status: bool) -> Self {
        Self {
            kind: kind.into(),
            status,
        }
    }
}

impl Display for PeerCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.kind, self.status)
    }
}

/// Point in time status of a single peer as reported by the orchestrator.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PeerStatus {
    pub name: String,
    pub address: String,
    pub conditions: Vec<PeerCondition>,
}

impl PeerStatus {
    pub fn new(name: impl Into<String>, address: impl Into<String>, conditions: Vec<PeerCondition>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            conditions,
        }
    }

    pub fn is_ready(&self) -> bool {
        crate::readiness::is_ready(&self.conditions)
    }
}

impl Display for PeerStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PeerStatus {{ name: {}, address: {}, conditions: [{}] }}",
            self.name,
            self.address,
            self.conditions.iter().join(", "),
        )
    }
}

/// Namespace plus label selector. Snapshot and watch always use the same scope.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Scope {
    pub namespace: String,
    pub label_selector: String,
}

impl Scope {
    pub fn new(namespace: impl Into<String>, label_selector: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            label_selector: label_selector.into(),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.label_selector)
    }
}
