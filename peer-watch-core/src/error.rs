use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerWatchError {
    #[error("peer-watch: invalid configuration: {0}")]
    Config(String),
    #[error("peer-watch: could not get initial peer list: {0:#}")]
    List(#[source] anyhow::Error),
    #[error("peer-watch: no peers detected, not even self")]
    EmptySnapshot,
    #[error("peer-watch: could not watch peers: {0:#}")]
    Watch(#[source] anyhow::Error),
}

impl PeerWatchError {
    pub fn is_list(&self) -> bool {
        matches!(self, PeerWatchError::List(_))
    }
}
