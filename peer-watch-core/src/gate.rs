use tokio::sync::watch;

/// One shot signal that the initial snapshot has been published.
///
/// Opening is idempotent: only the first call flips the gate, later calls return
/// `false`. Waiters created before or after opening all observe it.
#[derive(Debug, Clone)]
pub struct InitGate {
    tx: watch::Sender<bool>,
}

impl InitGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn open(&self) -> bool {
        self.tx.send_if_modified(|opened| {
            if *opened {
                false
            } else {
                *opened = true;
                true
            }
        })
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn waiter(&self) -> GateWaiter {
        GateWaiter {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for InitGate {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct GateWaiter {
    rx: watch::Receiver<bool>,
}

impl GateWaiter {
    /// Resolves once the gate is open. Never resolves if every [`InitGate`] handle is
    /// dropped without opening it.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|opened| *opened).await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}
