use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::info;
use typed_builder::TypedBuilder;

use crate::error::PeerWatchError;
use crate::gate::InitGate;
use crate::membership::{MembershipStore, MembershipView};
use crate::notifier::{Notifier, PeerListener};
use crate::peer::Scope;
use crate::processor::ChangeStreamProcessor;
use crate::snapshot::fetch_initial;
use crate::source::PeerSource;

#[derive(TypedBuilder)]
pub struct PeerWatchSettings {
    #[builder(setter(into))]
    pub self_id: String,
    pub scope: Scope,
    pub source: Arc<dyn PeerSource>,
    pub listener: PeerListener,
    #[builder(default = false)]
    pub debug: bool,
    #[builder(default = 4)]
    pub notify_workers: usize,
    /// Supply a gate to open it yourself once your own view is seeded from
    /// [`PeerWatch::initial_peers`]. Without one the gate opens as soon as the snapshot
    /// is stored.
    #[builder(default, setter(strip_option))]
    pub gate: Option<InitGate>,
}

impl Debug for PeerWatchSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerWatchSettings")
            .field("self_id", &self.self_id)
            .field("scope", &self.scope)
            .field("debug", &self.debug)
            .field("notify_workers", &self.notify_workers)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

/// Live view of the ready peers in a scope.
#[derive(Debug)]
pub struct PeerWatch {
    self_id: String,
    scope: Scope,
    initial_peers: Vec<String>,
    view: MembershipView,
    gate: InitGate,
    processor: Mutex<Option<JoinHandle<()>>>,
}

impl PeerWatch {
    /// Fetches the initial snapshot and starts watching for readiness transitions in
    /// the background. Snapshot failures are returned, watch failures are only logged.
    pub async fn initialize(settings: PeerWatchSettings) -> Result<Self, PeerWatchError> {
        let PeerWatchSettings {
            self_id,
            scope,
            source,
            listener,
            debug,
            notify_workers,
            gate,
        } = settings;
        let self_id = self_id.trim().to_string();
        if self_id.is_empty() {
            return Err(PeerWatchError::Config("self id cannot be empty".to_string()));
        }
        let members = fetch_initial(source.as_ref(), &scope, &self_id).await?;
        let store = MembershipStore::new(members);
        let initial_peers = store.snapshot_sorted();
        let view = store.view();
        let (gate, open_gate) = match gate {
            None => (InitGate::new(), true),
            Some(gate) => (gate, false),
        };
        let notifier = Notifier::spawn(notify_workers, listener, gate.waiter());
        let processor = ChangeStreamProcessor::new(self_id.clone(), store, notifier, debug);
        if open_gate {
            gate.open();
        }
        info!("{} watching {} with initial peers {:?}", self_id, scope, initial_peers);
        let watch_scope = scope.clone();
        let handle = tokio::spawn(async move {
            processor.run(source.as_ref(), &watch_scope).await;
        });
        let peer_watch = Self {
            self_id,
            scope,
            initial_peers,
            view,
            gate,
            processor: Mutex::new(Some(handle)),
        };
        Ok(peer_watch)
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Sorted snapshot the watch was seeded with, self included.
    pub fn initial_peers(&self) -> &[String] {
        &self.initial_peers
    }

    /// Sorted current membership, self included.
    pub fn peers(&self) -> Vec<String> {
        self.view.snapshot_sorted()
    }

    pub fn view(&self) -> MembershipView {
        self.view.clone()
    }

    pub fn gate(&self) -> &InitGate {
        &self.gate
    }

    pub fn is_watching(&self) -> bool {
        self.processor
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stops watching. Notifications already queued are still delivered.
    pub fn stop(&self) {
        if let Some(handle) = self.processor.lock().take() {
            handle.abort();
            info!("{} stopped watching {}", self.self_id, self.scope);
        }
    }
}
