use std::path::PathBuf;

use anyhow::{bail, Context};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::debug;
use typed_builder::TypedBuilder;

/// How to reach the API server: the pod's service account, or a kubeconfig file.
/// In cluster credentials win when both are set.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct ClientSettings {
    #[builder(default = false)]
    pub in_cluster: bool,
    #[builder(default, setter(strip_option, into))]
    pub kubeconfig: Option<PathBuf>,
}

impl ClientSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        let kubeconfig_empty = self
            .kubeconfig
            .as_ref()
            .map(|path| path.as_os_str().is_empty())
            .unwrap_or(true);
        if !self.in_cluster && kubeconfig_empty {
            bail!("both --kubeconfig and --use-cluster-credentials cannot be empty");
        }
        Ok(())
    }
}

pub async fn make_client(settings: &ClientSettings) -> anyhow::Result<Client> {
    settings.validate()?;
    let config = match &settings.kubeconfig {
        _ if settings.in_cluster => {
            debug!("using in-cluster credentials");
            kube::Config::incluster().context("load in-cluster config")?
        }
        Some(path) => {
            debug!("using kubeconfig {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("read kubeconfig {}", path.display()))?;
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .with_context(|| format!("load kubeconfig {}", path.display()))?
        }
        None => bail!("kube client config is not set"),
    };
    let client = Client::try_from(config).context("create kube client")?;
    Ok(client)
}
