use crate::k8s::{self, Secret};
use anyhow::{bail, Context, Result};
use lb_admission_core::SecretLookup;

/// Looks up secrets through the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecrets {
    client: k8s::Client,
}

impl KubeSecrets {
    pub fn new(client: k8s::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SecretLookup for KubeSecrets {
    async fn ensure_exists(&self, namespace: &str, name: &str) -> Result<()> {
        let api = k8s::Api::<Secret>::namespaced(self.client.clone(), namespace);
        let secret = api
            .get_opt(name)
            .await
            .with_context(|| format!("failed to get secret {namespace}/{name}"))?;
        if secret.is_none() {
            bail!("secrets \"{name}\" not found");
        }
        Ok(())
    }
}
