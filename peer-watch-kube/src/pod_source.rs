use std::fmt::{Debug, Formatter};

use anyhow::Context;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams, WatchEvent, WatchParams};
use kube::Client;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use peer_watch_core::event::ChangeEvent;
use peer_watch_core::peer::{PeerStatus, Scope};
use peer_watch_core::source::{ChangeStream, PeerSource};

use crate::pod::{change_event, is_expired, peer_status, resource_version};

const ANY_VERSION: &str = "0";

type EventSender = UnboundedSender<anyhow::Result<ChangeEvent>>;

pub(crate) type PodEventStream<'a> = BoxStream<'a, kube::Result<WatchEvent<Pod>>>;

/// One long poll watch request starting after `version`.
pub(crate) trait PodEvents: Send + Sync + 'static {
    fn events<'a>(&'a self, version: &'a str) -> BoxFuture<'a, kube::Result<PodEventStream<'a>>>;
}

struct PodWatch {
    api: Api<Pod>,
    params: WatchParams,
}

impl PodEvents for PodWatch {
    fn events<'a>(&'a self, version: &'a str) -> BoxFuture<'a, kube::Result<PodEventStream<'a>>> {
        async move {
            let stream = self.api.watch(&self.params, version).await?;
            Ok(stream.boxed())
        }
        .boxed()
    }
}

/// Resource version of the last list, so a watch of the same scope starts where the
/// snapshot ended.
#[derive(Debug, Default)]
pub(crate) struct ListedVersion(Mutex<Option<(Scope, String)>>);

impl ListedVersion {
    pub(crate) fn record(&self, scope: &Scope, version: Option<&str>) {
        if let Some(version) = version.filter(|version| !version.is_empty()) {
            *self.0.lock() = Some((scope.clone(), version.to_string()));
        }
    }

    pub(crate) fn watch_from(&self, scope: &Scope) -> String {
        match &*self.0.lock() {
            Some((listed, version)) if listed == scope => version.clone(),
            _ => ANY_VERSION.to_string(),
        }
    }
}

/// Pods matching a label selector in a namespace.
pub struct KubePeerSource {
    client: Client,
    listed: ListedVersion,
}

impl KubePeerSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            listed: ListedVersion::default(),
        }
    }

    fn api(&self, scope: &Scope) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &scope.namespace)
    }
}

impl Debug for KubePeerSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePeerSource")
            .field("listed", &self.listed)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PeerSource for KubePeerSource {
    async fn list(&self, scope: &Scope) -> anyhow::Result<Vec<PeerStatus>> {
        let params = ListParams::default().labels(&scope.label_selector);
        let pods = self
            .api(scope)
            .list(&params)
            .await
            .with_context(|| format!("list pods in {}", scope))?;
        self.listed.record(scope, pods.metadata.resource_version.as_deref());
        Ok(pods.items.iter().map(peer_status).collect())
    }

    /// The kube stream is pumped on its own task so the returned stream owns nothing
    /// borrowed from the api handle. Establishment is reported back before returning.
    async fn watch(&self, scope: &Scope) -> anyhow::Result<ChangeStream> {
        let watch = PodWatch {
            api: self.api(scope),
            params: WatchParams::default().labels(&scope.label_selector),
        };
        let version = self.listed.watch_from(scope);
        let (established_tx, established_rx) = oneshot::channel();
        let (tx, mut rx) = unbounded_channel();
        tokio::spawn(pump(watch, scope.clone(), version, tx, established_tx));
        established_rx
            .await
            .context("pod watch task exited")?
            .with_context(|| format!("watch pods in {}", scope))?;
        let stream = futures::stream::poll_fn(move |cx| rx.poll_recv(cx));
        Ok(stream.boxed())
    }
}

enum Drained {
    /// The api server closed the request, resume from the version if any was seen.
    TimedOut(Option<String>),
    Expired,
    ReceiverDropped,
}

/// Forwards pod events to `tx`, watching again from the last seen resource version
/// each time the api server ends a request. Only the first request is reported on
/// `established`. The channel closes when a watch cannot be resumed.
pub(crate) async fn pump<W: PodEvents>(
    events: W,
    scope: Scope,
    mut version: String,
    tx: EventSender,
    established: oneshot::Sender<kube::Result<()>>,
) {
    let mut established = Some(established);
    loop {
        let stream = match events.events(&version).await {
            Ok(stream) => stream,
            Err(error) => {
                match established.take() {
                    Some(established) => {
                        let _ = established.send(Err(error));
                    }
                    None => warn!("resume pod watch of {} from {} failed: {}", scope, version, error),
                }
                return;
            }
        };
        if let Some(established) = established.take() {
            if established.send(Ok(())).is_err() {
                return;
            }
        }
        match drain(stream, &tx).await {
            Drained::TimedOut(latest) => {
                if let Some(latest) = latest {
                    version = latest;
                }
                debug!("pod watch request of {} ended, resume from {}", scope, version);
            }
            Drained::Expired => {
                warn!("pod watch of {} expired at resource version {}", scope, version);
                return;
            }
            Drained::ReceiverDropped => {
                debug!("pod watch receiver of {} dropped", scope);
                return;
            }
        }
    }
}

async fn drain(mut stream: PodEventStream<'_>, tx: &EventSender) -> Drained {
    let mut latest = None;
    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => {
                if is_expired(&event) {
                    return Drained::Expired;
                }
                if let Some(version) = resource_version(&event) {
                    latest = Some(version.to_string());
                }
                match change_event(event) {
                    Some(event) => event,
                    None => continue,
                }
            }
            Err(error) => Err(anyhow::Error::new(error).context("decode pod watch event")),
        };
        if tx.send(event).is_err() {
            return Drained::ReceiverDropped;
        }
    }
    Drained::TimedOut(latest)
}
