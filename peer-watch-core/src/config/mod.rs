use config::builder::DefaultState;
use config::{File, FileFormat, Source};
use serde::{Deserialize, Serialize};

use crate::peer::Scope;
use crate::REFERENCE;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PeerWatchConfig {
    pub namespace: String,
    #[serde(rename = "label-selector")]
    pub label_selector: String,
    pub debug: bool,
    #[serde(rename = "notify-workers")]
    pub notify_workers: usize,
}

impl PeerWatchConfig {
    pub fn builder() -> PeerWatchConfigBuilder {
        PeerWatchConfigBuilder::default()
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.namespace.clone(), self.label_selector.clone())
    }
}

impl Default for PeerWatchConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            label_selector: "app=peer-watch".to_string(),
            debug: false,
            notify_workers: 4,
        }
    }
}

/// Layers caller supplied sources over the embedded `reference.toml`. Sources added
/// later take precedence over earlier ones, the reference is always lowest.
#[derive(Debug, Default)]
pub struct PeerWatchConfigBuilder {
    builder: config::ConfigBuilder<DefaultState>,
}

impl PeerWatchConfigBuilder {
    pub fn add_source<T>(self, source: T) -> Self
    where
        T: Source + Send + Sync + 'static,
    {
        Self { builder: self.builder.add_source(source) }
    }

    pub fn set_override<V>(self, key: &str, value: V) -> anyhow::Result<Self>
    where
        V: Into<config::Value>,
    {
        Ok(Self { builder: self.builder.set_override(key, value)? })
    }

    pub fn build(self) -> anyhow::Result<PeerWatchConfig> {
        let builder = config::Config::builder()
            .add_source(File::from_str(REFERENCE, FileFormat::Toml))
            .add_source(self.builder.build()?);
        let config = builder.build()?.try_deserialize::<PeerWatchConfig>()?;
        Ok(config)
    }
}
