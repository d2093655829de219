use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::PeerWatchError;
use crate::event::{ChangeEvent, ChangeKind};
use crate::membership::MembershipStore;
use crate::notifier::{Notifier, Transition};
use crate::peer::Scope;
use crate::source::PeerSource;

/// Applies the orchestrator's change stream to the membership store.
///
/// A peer being created or deleted shows up as a series of MODIFIED events, so only
/// MODIFIED events whose readiness disagrees with the store are acted on. ADDED and
/// DELETED are logged and otherwise ignored.
#[derive(Debug)]
pub struct ChangeStreamProcessor {
    self_id: String,
    store: MembershipStore,
    notifier: Notifier,
    debug: bool,
}

impl ChangeStreamProcessor {
    pub fn new(self_id: String, store: MembershipStore, notifier: Notifier, debug: bool) -> Self {
        Self {
            self_id,
            store,
            notifier,
            debug,
        }
    }

    pub fn store(&self) -> &MembershipStore {
        &self.store
    }

    /// Watches `scope` until the stream closes. There is no reconnect: once this returns
    /// the membership set stays as it was.
    pub async fn run(mut self, source: &dyn PeerSource, scope: &Scope) {
        if self.debug {
            debug!("initial peer list = {}", self.store);
        }
        let mut stream = match source.watch(scope).await {
            Ok(stream) => stream,
            Err(error) => {
                let error = PeerWatchError::Watch(error);
                warn!("{} in {}, membership will not be updated", error, scope);
                return;
            }
        };
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    self.apply(event);
                }
                Err(error) => {
                    warn!("skip malformed event from {}: {:#}", scope, error);
                }
            }
        }
        warn!("watch stream of {} closed, membership frozen at {}", scope, self.store);
    }

    /// Applies a single event and returns the transition it caused, if any.
    pub fn apply(&mut self, event: ChangeEvent) -> Option<Transition> {
        let ChangeEvent { kind, peer } = event;
        let ready = peer.is_ready();
        if self.debug {
            debug!("{} peer {} with address {}. Ready = {}", kind, peer.name, peer.address, ready);
        }
        if kind != ChangeKind::Modified || peer.address.is_empty() || peer.address == self.self_id {
            return None;
        }
        let member = self.store.contains(&peer.address);
        let transition = if ready && !member {
            self.store.insert(&peer.address);
            info!("newly ready peer {} @ {}", peer.name, peer.address);
            Transition::Added
        } else if !ready && member {
            self.store.remove(&peer.address);
            info!("newly disappeared peer {} @ {}", peer.name, peer.address);
            Transition::Removed
        } else {
            return None;
        };
        self.notifier.notify(&peer.address, transition);
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ahash::HashSet;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    use crate::event::ChangeEvent;
    use crate::gate::InitGate;
    use crate::membership::MembershipStore;
    use crate::notifier::{Notification, Notifier, Transition};
    use crate::peer::Scope;
    use crate::processor::ChangeStreamProcessor;
    use crate::source::channel_source::{not_ready, ready, ChannelSource};

    const SELF_ID: &str = "10.0.0.1";

    fn processor() -> (ChangeStreamProcessor, UnboundedReceiver<Notification>) {
        let members: HashSet<String> = [SELF_ID, "10.0.0.2"].iter().map(|a| a.to_string()).collect();
        let (tx, rx) = unbounded_channel();
        let gate = InitGate::new();
        gate.open();
        let notifier = Notifier::spawn(1, Arc::new(move |n: Notification| { let _ = tx.send(n); }), gate.waiter());
        let processor = ChangeStreamProcessor::new(SELF_ID.to_string(), MembershipStore::new(members), notifier, true);
        (processor, rx)
    }

    async fn next(rx: &mut UnboundedReceiver<Notification>) -> anyhow::Result<Option<Notification>> {
        Ok(tokio::time::timeout(Duration::from_secs(1), rx.recv()).await?)
    }

    #[tokio::test]
    async fn test_transitions() -> anyhow::Result<()> {
        let (mut processor, mut rx) = processor();
        assert_eq!(processor.apply(ChangeEvent::modified(ready("10.0.0.3"))), Some(Transition::Added));
        assert_eq!(next(&mut rx).await?, Some(Notification::new("10.0.0.3", Transition::Added)));
        assert_eq!(processor.store().snapshot_sorted(), vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(processor.apply(ChangeEvent::modified(not_ready("10.0.0.2"))), Some(Transition::Removed));
        assert_eq!(next(&mut rx).await?, Some(Notification::new("10.0.0.2", Transition::Removed)));
        assert_eq!(processor.store().snapshot_sorted(), vec!["10.0.0.1", "10.0.0.3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_unchanged_readiness_is_idempotent() {
        let (mut processor, _rx) = processor();
        assert_eq!(processor.apply(ChangeEvent::modified(ready("10.0.0.3"))), Some(Transition::Added));
        assert_eq!(processor.apply(ChangeEvent::modified(ready("10.0.0.3"))), None);
        assert_eq!(processor.apply(ChangeEvent::modified(not_ready("10.0.0.4"))), None);
        assert_eq!(processor.apply(ChangeEvent::modified(ready("10.0.0.2"))), None);
    }

    #[tokio::test]
    async fn test_self_and_empty_address_ignored() {
        let (mut processor, _rx) = processor();
        assert_eq!(processor.apply(ChangeEvent::modified(not_ready(SELF_ID))), None);
        assert_eq!(processor.apply(ChangeEvent::modified(ready(""))), None);
        assert!(processor.store().contains(SELF_ID));
        assert_eq!(processor.store().snapshot_sorted(), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_added_and_deleted_ignored() {
        let (mut processor, _rx) = processor();
        assert_eq!(processor.apply(ChangeEvent::added(ready("10.0.0.5"))), None);
        assert_eq!(processor.apply(ChangeEvent::deleted(not_ready("10.0.0.2"))), None);
        assert_eq!(processor.store().snapshot_sorted(), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_run_skips_malformed_and_stops_on_close() -> anyhow::Result<()> {
        let (processor, mut rx) = processor();
        let view = processor.store().view();
        let (source, tx) = ChannelSource::new(vec![]);
        let scope = Scope::new("default", "app=peer-watch");
        tx.send(Err(anyhow::anyhow!("not a pod")))?;
        tx.send(Ok(ChangeEvent::modified(ready("10.0.0.3"))))?;
        tx.send(Ok(ChangeEvent::modified(ready("10.0.0.3"))))?;
        tx.send(Ok(ChangeEvent::modified(not_ready("10.0.0.2"))))?;
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), processor.run(&source, &scope)).await?;
        assert_eq!(next(&mut rx).await?, Some(Notification::new("10.0.0.3", Transition::Added)));
        assert_eq!(next(&mut rx).await?, Some(Notification::new("10.0.0.2", Transition::Removed)));
        assert_eq!(next(&mut rx).await?, None);
        assert_eq!(view.snapshot_sorted(), vec!["10.0.0.1", "10.0.0.3"]);
        assert_eq!(*source.scopes.lock(), vec![scope]);
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_failure_returns() -> anyhow::Result<()> {
        let (processor, _rx) = processor();
        let view = processor.store().view();
        let (source, _tx) = ChannelSource::new(vec![]);
        let source = source.with_watch_error("forbidden");
        let scope = Scope::new("default", "app=peer-watch");
        tokio::time::timeout(Duration::from_secs(1), processor.run(&source, &scope)).await?;
        assert_eq!(view.snapshot_sorted(), vec!["10.0.0.1", "10.0.0.2"]);
        Ok(())
    }
}
