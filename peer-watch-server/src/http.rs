use std::future::Future;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::info;

use peer_watch_core::membership::MembershipView;

pub fn router(view: MembershipView) -> Router {
    Router::new()
        .route("/", get(peers_handler))
        .with_state(view)
}

/// Sorted JSON array of the current peer addresses.
async fn peers_handler(State(view): State<MembershipView>) -> Json<Vec<String>> {
    Json(view.snapshot_sorted())
}

pub async fn serve<F>(listener: TcpListener, view: MembershipView, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("http server starting at {}", listener.local_addr()?);
    axum::serve(listener, router(view))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("http server stopped");
    Ok(())
}
