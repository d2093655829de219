use tracing::debug;

use crate::error::PeerWatchError;
use crate::membership::MembershipSet;
use crate::peer::Scope;
use crate::source::PeerSource;

/// Lists the peers in `scope` and keeps self plus every other ready peer.
pub async fn fetch_initial(
    source: &dyn PeerSource,
    scope: &Scope,
    self_id: &str,
) -> Result<MembershipSet, PeerWatchError> {
    let peers = source.list(scope).await.map_err(PeerWatchError::List)?;
    let mut members = MembershipSet::default();
    if !self_id.is_empty() {
        members.insert(self_id.to_string());
    }
    for peer in peers {
        if peer.address.is_empty() || peer.address == self_id {
            continue;
        }
        if peer.is_ready() {
            members.insert(peer.address);
        } else {
            debug!("skip not ready peer {} @ {}", peer.name, peer.address);
        }
    }
    if members.is_empty() {
        return Err(PeerWatchError::EmptySnapshot);
    }
    Ok(members)
}
