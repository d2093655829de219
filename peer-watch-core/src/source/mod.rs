use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::event::ChangeEvent;
use crate::peer::{PeerStatus, Scope};

#[cfg(test)]
pub(crate) mod channel_source;

pub type ChangeStream = BoxStream<'static, anyhow::Result<ChangeEvent>>;

/// The orchestrator side of peer discovery.
///
/// `list` returns every peer currently visible in the scope, ready or not. `watch`
/// opens an ordered, unbounded change stream for the same scope. An `Err` item in the
/// stream marks a payload that could not be understood, the stream itself stays usable.
/// The stream ending means the subscription is gone.
#[async_trait]
pub trait PeerSource: Send + Sync + 'static {
    async fn list(&self, scope: &Scope) -> anyhow::Result<Vec<PeerStatus>>;

    async fn watch(&self, scope: &Scope) -> anyhow::Result<ChangeStream>;
}
