use crate::peer::PeerCondition;

pub const READY_CONDITION: &str = "Ready";

/// A peer is ready iff it reports a `Ready` condition with a true status.
pub fn is_ready(conditions: &[PeerCondition]) -> bool {
    conditions
        .iter()
        .any(|condition| condition.kind == READY_CONDITION && condition.status)
}

#[cfg(test)]
mod tests {
    use crate::peer::PeerCondition;
    use crate::readiness::is_ready;

    #[test]
    fn test_ready_condition() {
        assert!(is_ready(&[PeerCondition::new("Ready", true)]));
        assert!(is_ready(&[
            PeerCondition::new("Initialized", false),
            PeerCondition::new("Ready", true),
        ]));
    }

    #[test]
    fn test_not_ready() {
        assert!(!is_ready(&[]));
        assert!(!is_ready(&[PeerCondition::new("Ready", false)]));
        assert!(!is_ready(&[PeerCondition::new("ContainersReady", true)]));
        assert!(!is_ready(&[PeerCondition::new("ready", true)]));
    }
}
