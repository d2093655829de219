use std::fmt::{Display, Formatter};
use std::sync::Arc;

use ahash::HashSet;
use itertools::Itertools;
use parking_lot::RwLock;

/// Addresses believed ready, always including self.
pub type MembershipSet = HashSet<String>;

/// The authoritative membership set.
///
/// There is exactly one store and it is owned by the change stream processor, the
/// only writer. Everyone else reads through a [`MembershipView`].
#[derive(Debug)]
pub struct MembershipStore {
    members: Arc<RwLock<MembershipSet>>,
}

impl MembershipStore {
    pub fn new(initial: MembershipSet) -> Self {
        let members = initial.into_iter().filter(|address| !address.is_empty()).collect();
        Self {
            members: Arc::new(RwLock::new(members)),
        }
    }

    /// Returns `false` if the address was already present or is empty.
    pub fn insert(&mut self, address: &str) -> bool {
        if address.is_empty() {
            return false;
        }
        self.members.write().insert(address.to_string())
    }

    pub fn remove(&mut self, address: &str) -> bool {
        self.members.write().remove(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.members.read().contains(address)
    }

    pub fn snapshot_sorted(&self) -> Vec<String> {
        sorted(&self.members.read())
    }

    pub fn view(&self) -> MembershipView {
        MembershipView {
            members: self.members.clone(),
        }
    }
}

impl Display for MembershipStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.snapshot_sorted().iter().join(", "))
    }
}

/// Read only handle on the membership set, safe to share across tasks.
#[derive(Debug, Clone)]
pub struct MembershipView {
    members: Arc<RwLock<MembershipSet>>,
}

impl MembershipView {
    /// A view over a fixed set that no processor will ever update.
    pub fn fixed(members: MembershipSet) -> Self {
        MembershipStore::new(members).view()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.members.read().contains(address)
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    pub fn snapshot_sorted(&self) -> Vec<String> {
        sorted(&self.members.read())
    }
}

impl Display for MembershipView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.snapshot_sorted().iter().join(", "))
    }
}

fn sorted(members: &MembershipSet) -> Vec<String> {
    members.iter().cloned().sorted().collect()
}

#[cfg(test)]
mod tests {
    use ahash::HashSet;

    use crate::membership::{MembershipStore, MembershipView};

    fn set(addresses: &[&str]) -> HashSet<String> {
        addresses.iter().map(|address| address.to_string()).collect()
    }

    #[test]
    fn test_snapshot_sorted_without_duplicates() {
        let mut store = MembershipStore::new(set(&["10.0.0.9", "10.0.0.1"]));
        assert!(store.insert("10.0.0.10"));
        assert!(!store.insert("10.0.0.1"));
        assert!(store.insert("10.0.0.2"));
        assert!(store.remove("10.0.0.9"));
        assert!(!store.remove("10.0.0.9"));
        assert!(store.insert("10.0.0.9"));
        assert_eq!(store.snapshot_sorted(), vec!["10.0.0.1", "10.0.0.10", "10.0.0.2", "10.0.0.9"]);
    }

    #[test]
    fn test_empty_address_rejected() {
        let mut store = MembershipStore::new(set(&["", "10.0.0.1"]));
        assert!(!store.insert(""));
        assert!(!store.contains(""));
        assert_eq!(store.snapshot_sorted(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_view_follows_store() {
        let mut store = MembershipStore::new(set(&["10.0.0.1"]));
        let view = store.view();
        store.insert("10.0.0.3");
        assert!(view.contains("10.0.0.3"));
        assert_eq!(view.len(), 2);
        store.remove("10.0.0.3");
        assert!(!view.contains("10.0.0.3"));
        assert_eq!(view.to_string(), "[10.0.0.1]");
        let fixed = MembershipView::fixed(set(&["10.0.0.1"]));
        assert_eq!(fixed.snapshot_sorted(), vec!["10.0.0.1"]);
    }
}
