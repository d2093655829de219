use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use config::{File, FileFormat};

use peer_watch_core::config::PeerWatchConfig;
use peer_watch_kube::ClientSettings;

pub const SELF_ID_ENV: &str = "POD_IP";
pub const NAMESPACE_ENV: &str = "POD_CACHE_NAMESPACE";
pub const LABEL_SELECTOR_ENV: &str = "POD_CACHE_LABEL_SELECTOR";

#[derive(Parser, Debug)]
#[command(name = "peer-watch", disable_version_flag = true)]
pub struct Args {
    /// The label to watch against pods [default: app=peer-watch]
    #[arg(long)]
    pub label_selector: Option<String>,
    /// The Kubernetes namespace for the pods [default: default]
    #[arg(long)]
    pub namespace: Option<String>,
    /// Use the pod's service account credentials
    #[arg(long)]
    pub use_cluster_credentials: bool,
    /// Absolute path to the kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
    /// If non-empty, stand up a simple webserver that reports the peer state
    #[arg(long, default_value = "0.0.0.0:4040")]
    pub http: String,
    /// Log the raw pod event stream
    #[arg(long)]
    pub debug: bool,
    /// Extra TOML config layered over the built in reference
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Display version and exit
    #[arg(long)]
    pub version: bool,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub self_id: String,
    pub watch: PeerWatchConfig,
    pub client: ClientSettings,
    pub http: Option<SocketAddr>,
}

impl ServerSettings {
    /// Precedence, lowest first: reference config, `--config` file, flags, environment.
    pub fn resolve<E>(args: &Args, env: E) -> anyhow::Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
        let client = ClientSettings {
            in_cluster: args.use_cluster_credentials,
            kubeconfig: args.kubeconfig.clone(),
        };
        client.validate()?;
        let self_id = env(SELF_ID_ENV).ok_or(anyhow!("pod ip env value {} cannot be empty", SELF_ID_ENV))?;
        let mut builder = PeerWatchConfig::builder();
        if let Some(path) = &args.config {
            let path = path.to_str().ok_or(anyhow!("config path {} is not valid utf-8", path.display()))?;
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }
        if let Some(namespace) = env(NAMESPACE_ENV).or(args.namespace.clone()) {
            builder = builder.set_override("namespace", namespace)?;
        }
        if let Some(label_selector) = env(LABEL_SELECTOR_ENV).or(args.label_selector.clone()) {
            builder = builder.set_override("label-selector", label_selector)?;
        }
        if args.debug {
            builder = builder.set_override("debug", true)?;
        }
        let watch = builder.build().context("load peer-watch config")?;
        let http = parse_http_addr(&args.http)?;
        let settings = Self {
            self_id,
            watch,
            client,
            http,
        };
        Ok(settings)
    }
}

/// Accepts `host:port` or the bare `:port` form, empty disables the server.
fn parse_http_addr(addr: &str) -> anyhow::Result<Option<SocketAddr>> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Ok(None);
    }
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    let addr = addr.parse().with_context(|| format!("invalid http address {}", addr))?;
    Ok(Some(addr))
}
