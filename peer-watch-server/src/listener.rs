use std::sync::{Arc, OnceLock};

use itertools::Itertools;
use tracing::info;

use peer_watch_core::membership::MembershipView;
use peer_watch_core::notifier::{Notification, PeerListener};

/// Publishes the view the listener reports. The first published view stays.
pub fn publish(peers: &OnceLock<MembershipView>, view: MembershipView) -> MembershipView {
    peers.get_or_init(|| view).clone()
}

/// Logs every transition together with the peer list it produced. The view is set
/// once the initial snapshot is published.
pub fn log_transitions(peers: Arc<OnceLock<MembershipView>>) -> PeerListener {
    Arc::new(move |notification: Notification| {
        info!("got notify: {}", notification);
        if let Some(view) = peers.get() {
            info!("new peer list = [{}]", view.snapshot_sorted().iter().join(", "));
        }
    })
}
