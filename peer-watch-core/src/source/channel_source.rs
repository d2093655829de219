use anyhow::anyhow;
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::event::ChangeEvent;
use crate::peer::{PeerCondition, PeerStatus, Scope};
use crate::source::{ChangeStream, PeerSource};

pub(crate) type EventSender = UnboundedSender<anyhow::Result<ChangeEvent>>;

/// In memory orchestrator driven by a tokio channel.
pub(crate) struct ChannelSource {
    peers: Vec<PeerStatus>,
    list_error: Option<String>,
    watch_error: Option<String>,
    events: Mutex<Option<UnboundedReceiver<anyhow::Result<ChangeEvent>>>>,
    pub(crate) scopes: Mutex<Vec<Scope>>,
}

impl ChannelSource {
    pub(crate) fn new(peers: Vec<PeerStatus>) -> (Self, EventSender) {
        let (tx, rx) = unbounded_channel();
        let source = Self {
            peers,
            list_error: None,
            watch_error: None,
            events: Mutex::new(Some(rx)),
            scopes: Mutex::new(vec![]),
        };
        (source, tx)
    }

    pub(crate) fn with_list_error(mut self, error: &str) -> Self {
        self.list_error = Some(error.to_string());
        self
    }

    pub(crate) fn with_watch_error(mut self, error: &str) -> Self {
        self.watch_error = Some(error.to_string());
        self
    }
}

#[async_trait]
impl PeerSource for ChannelSource {
    async fn list(&self, scope: &Scope) -> anyhow::Result<Vec<PeerStatus>> {
        self.scopes.lock().push(scope.clone());
        match &self.list_error {
            None => Ok(self.peers.clone()),
            Some(error) => Err(anyhow!("{}", error)),
        }
    }

    async fn watch(&self, scope: &Scope) -> anyhow::Result<ChangeStream> {
        self.scopes.lock().push(scope.clone());
        if let Some(error) = &self.watch_error {
            return Err(anyhow!("{}", error));
        }
        let mut rx = self.events.lock().take().ok_or(anyhow!("channel source already watched"))?;
        let stream = futures::stream::poll_fn(move |cx| rx.poll_recv(cx));
        Ok(stream.boxed())
    }
}

pub(crate) fn ready(address: &str) -> PeerStatus {
    peer(address, true)
}

pub(crate) fn not_ready(address: &str) -> PeerStatus {
    peer(address, false)
}

fn peer(address: &str, ready: bool) -> PeerStatus {
    let name = format!("peer-{}", address.replace('.', "-"));
    PeerStatus::new(
        name,
        address,
        vec![
            PeerCondition::new("Initialized", true),
            PeerCondition::new("Ready", ready),
        ],
    )
}
