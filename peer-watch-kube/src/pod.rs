use anyhow::anyhow;
use k8s_openapi::api::core::v1::Pod;
use kube::api::WatchEvent;

use peer_watch_core::event::ChangeEvent;
use peer_watch_core::peer::{PeerCondition, PeerStatus};

const CONDITION_TRUE: &str = "True";
const GONE: u16 = 410;

pub fn peer_status(pod: &Pod) -> PeerStatus {
    let name = pod.metadata.name.clone().unwrap_or_default();
    let status = pod.status.as_ref();
    let address = status
        .and_then(|status| status.pod_ip.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string();
    let conditions = status
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .map(|condition| PeerCondition::new(condition.type_.clone(), condition.status == CONDITION_TRUE))
                .collect()
        })
        .unwrap_or_default();
    PeerStatus::new(name, address, conditions)
}

/// Bookmarks carry no pod and map to `None`. Error events become malformed items.
pub fn change_event(event: WatchEvent<Pod>) -> Option<anyhow::Result<ChangeEvent>> {
    match event {
        WatchEvent::Added(pod) => Some(Ok(ChangeEvent::added(peer_status(&pod)))),
        WatchEvent::Modified(pod) => Some(Ok(ChangeEvent::modified(peer_status(&pod)))),
        WatchEvent::Deleted(pod) => Some(Ok(ChangeEvent::deleted(peer_status(&pod)))),
        WatchEvent::Bookmark(_) => None,
        WatchEvent::Error(error) => Some(Err(anyhow!("pod watch error event {:?}", error))),
    }
}

/// The resource version a watch can resume from after this event.
pub fn resource_version(event: &WatchEvent<Pod>) -> Option<&str> {
    match event {
        WatchEvent::Added(pod) | WatchEvent::Modified(pod) | WatchEvent::Deleted(pod) => {
            pod.metadata.resource_version.as_deref()
        }
        WatchEvent::Bookmark(bookmark) => Some(bookmark.metadata.resource_version.as_str()),
        WatchEvent::Error(_) => None,
    }
}

/// The resumed resource version is older than the api server keeps history for.
pub fn is_expired(event: &WatchEvent<Pod>) -> bool {
    matches!(event, WatchEvent::Error(error) if error.code == GONE)
}
