use std::sync::{Arc, OnceLock};

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use peer_watch_core::ext::init_logger_with_filter;
use peer_watch_core::gate::InitGate;
use peer_watch_core::membership::{MembershipSet, MembershipView};
use peer_watch_core::peer_watch::{PeerWatch, PeerWatchSettings};
use peer_watch_kube::{make_client, KubePeerSource};

use crate::args::{Args, ServerSettings};

mod args;
mod http;
mod listener;
mod signal;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const REVISION: Option<&str> = option_env!("PEER_WATCH_REVISION");

const DEFAULT_FILTER: &str = "info";
const DEBUG_FILTER: &str = "info,peer_watch_core=debug,peer_watch_kube=debug,peer_watch_server=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.version {
        println!("peer-watch: version={} revision={}", VERSION, REVISION.unwrap_or("unknown"));
        return Ok(());
    }
    let settings = ServerSettings::resolve(&args, |key| std::env::var(key).ok())?;
    let default_filter = if settings.watch.debug { DEBUG_FILTER } else { DEFAULT_FILTER };
    init_logger_with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)));

    let client = make_client(&settings.client)
        .await
        .context("error connecting to the client")?;
    let gate = InitGate::new();
    let published = Arc::new(OnceLock::new());
    let watch_settings = PeerWatchSettings::builder()
        .self_id(settings.self_id.clone())
        .scope(settings.watch.scope())
        .source(Arc::new(KubePeerSource::new(client)))
        .listener(listener::log_transitions(published.clone()))
        .debug(settings.watch.debug)
        .notify_workers(settings.watch.notify_workers)
        .gate(gate.clone())
        .build();
    let (watch, view) = match PeerWatch::initialize(watch_settings).await {
        Ok(watch) => {
            let view = watch.view();
            (Some(watch), view)
        }
        Err(error) if error.is_list() => {
            warn!("WARNING error getting initial peers, continuing with self only: {}", error);
            let members: MembershipSet = [settings.self_id.clone()].into_iter().collect();
            (None, MembershipView::fixed(members))
        }
        Err(error) => return Err(error.into()),
    };
    let view = listener::publish(&published, view);
    if settings.watch.debug {
        debug!("init {}", settings.self_id);
    }
    gate.open();
    info!("initial peers = {}", view);

    match settings.http {
        Some(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind http server at {}", addr))?;
            http::serve(listener, view, signal::shutdown_signal()).await?;
        }
        None => signal::shutdown_signal().await,
    }
    if let Some(watch) = watch {
        watch.stop();
    }
    Ok(())
}
