pub mod client;
pub mod pod;
pub mod pod_source;

pub use client::{make_client, ClientSettings};
pub use pod_source::KubePeerSource;

#[cfg(test)]
mod test {
    use tracing::Level;

    use peer_watch_core::ext::init_logger;

    #[ctor::ctor]
    fn init() {
        init_logger(Level::DEBUG)
    }
}
