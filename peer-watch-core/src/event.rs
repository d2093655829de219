use std::fmt::{Display, Formatter};

use crate::peer::PeerStatus;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Deleted => "DELETED",
        };
        write!(f, "{}", kind)
    }
}

/// One entry of the orchestrator's change stream.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub peer: PeerStatus,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, peer: PeerStatus) -> Self {
        Self { kind, peer }
    }

    pub fn added(peer: PeerStatus) -> Self {
        Self::new(ChangeKind::Added, peer)
    }

    pub fn modified(peer: PeerStatus) -> Self {
        Self::new(ChangeKind::Modified, peer)
    }

    pub fn deleted(peer: PeerStatus) -> Self {
        Self::new(ChangeKind::Deleted, peer)
    }
}

impl Display for ChangeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.peer)
    }
}
