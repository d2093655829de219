pub const REFERENCE: &'static str = include_str!("../reference.toml");

pub mod config;
pub mod error;
pub mod event;
pub mod ext;
pub mod gate;
pub mod membership;
pub mod notifier;
pub mod peer;
pub mod peer_watch;
pub mod processor;
pub mod readiness;
pub mod snapshot;
pub mod source;

#[cfg(test)]
mod test {
    use tracing::Level;

    use crate::ext::init_logger;

    #[ctor::ctor]
    fn init() {
        init_logger(Level::DEBUG)
    }
}
