use anyhow::{bail, Context, Result};
use lb_admission_core::{Kind, ReconcileKey, Status, StatusSink};
use lb_admission_k8s_api::{
    self as k8s, ApiResource, AviInfraSetting, DynamicObject, HostRule, HttpRule,
    MultiClusterIngress, ServiceImport,
};
use tokio::time;

const FIELD_MANAGER: &str = "lb-admission";

/// Patches the status sub-resource of admitted resources.
#[derive(Clone)]
pub struct KubeStatusSink {
    client: k8s::Client,
    timeout: time::Duration,
}

// === impl KubeStatusSink ===

impl KubeStatusSink {
    pub fn new(client: k8s::Client, timeout: time::Duration) -> Self {
        Self { client, timeout }
    }

    fn api(&self, key: &ReconcileKey) -> Result<k8s::Api<DynamicObject>> {
        let resource = match key.kind {
            Kind::HostRule => ApiResource::erase::<HostRule>(&()),
            Kind::HttpRule => ApiResource::erase::<HttpRule>(&()),
            Kind::AviInfraSetting => ApiResource::erase::<AviInfraSetting>(&()),
            Kind::MultiClusterIngress => ApiResource::erase::<MultiClusterIngress>(&()),
            Kind::ServiceImport => ApiResource::erase::<ServiceImport>(&()),
            kind @ (Kind::VirtualService | Kind::DestinationRule | Kind::Gateway) => {
                bail!("{kind} resources do not carry an admission status")
            }
        };
        if key.kind.is_cluster_scoped() {
            return Ok(k8s::Api::all_with(self.client.clone(), &resource));
        }
        Ok(k8s::Api::namespaced_with(
            self.client.clone(),
            key.namespace(),
            &resource,
        ))
    }
}

#[async_trait::async_trait]
impl StatusSink for KubeStatusSink {
    async fn update_status(&self, key: &ReconcileKey, status: &Status) -> Result<()> {
        let api = self.api(key)?;
        let patch = make_patch(status);
        let params = k8s::PatchParams::apply(FIELD_MANAGER);
        time::timeout(self.timeout, api.patch_status(key.name(), &params, &patch))
            .await
            .with_context(|| format!("timed out patching status of {key}"))?
            .with_context(|| format!("failed to patch status of {key}"))?;
        Ok(())
    }
}

pub(crate) fn make_patch(status: &Status) -> k8s::Patch<serde_json::Value> {
    k8s::Patch::Merge(serde_json::json!({
        "status": {
            "status": status.status,
            "error": status.error,
        }
    }))
}
