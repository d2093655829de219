use std::fmt::{Debug, Display, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::gate::GateWaiter;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Transition {
    Added,
    Removed,
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Added => write!(f, "Added"),
            Transition::Removed => write!(f, "Removed"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Notification {
    pub address: String,
    pub transition: Transition,
}

impl Notification {
    pub fn new(address: impl Into<String>, transition: Transition) -> Self {
        Self {
            address: address.into(),
            transition,
        }
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.address, self.transition)
    }
}

/// Caller supplied membership callback.
///
/// Runs on the notifier's worker tasks. It may be invoked concurrently with itself and
/// successive notifications may complete in any order, so it must not rely on event
/// order and must not block.
pub type PeerListener = Arc<dyn Fn(Notification) + Send + Sync>;

/// Fire and forget dispatch of [`Notification`]s onto a pool of worker tasks.
pub struct Notifier {
    tx: UnboundedSender<Notification>,
    workers: Vec<JoinHandle<()>>,
}

impl Notifier {
    pub fn spawn(workers: usize, listener: PeerListener, gate: GateWaiter) -> Self {
        let (tx, rx) = unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..workers.max(1))
            .map(|index| {
                let rx = rx.clone();
                let listener = listener.clone();
                let gate = gate.clone();
                tokio::spawn(Self::work(index, rx, listener, gate))
            })
            .collect();
        Self { tx, workers }
    }

    pub fn notify(&self, address: &str, transition: Transition) {
        let notification = Notification::new(address, transition);
        if let Err(error) = self.tx.send(notification) {
            warn!("notifier closed, drop {}", error.0);
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    async fn work(
        index: usize,
        rx: Arc<Mutex<UnboundedReceiver<Notification>>>,
        listener: PeerListener,
        mut gate: GateWaiter,
    ) {
        let mut initialized = false;
        loop {
            let notification = { rx.lock().await.recv().await };
            let Some(notification) = notification else {
                break;
            };
            if !initialized {
                gate.wait().await;
                initialized = true;
            }
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| listener(notification.clone())));
            if result.is_err() {
                error!("notify worker {} listener panicked on {}", index, notification);
            }
        }
        debug!("notify worker {} stopped", index);
    }
}

impl Debug for Notifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}
