use super::{Validate, Validator};
use crate::{
    index::ServiceType,
    k8s::crd::{MultiClusterIngressSpec, ServiceImportSpec},
};
use anyhow::{bail, Result};
use lb_admission_core::ReconcileKey;

#[async_trait::async_trait]
impl Validate<MultiClusterIngressSpec> for Validator {
    async fn validate(&self, _key: &ReconcileKey, spec: &MultiClusterIngressSpec) -> Result<()> {
        if self.cluster.service_type != ServiceType::NodePort {
            bail!("ServiceType must be of type NodePort");
        }
        if !self.cluster.evh_enabled {
            bail!("operator must be in EVH mode");
        }
        if spec.config.is_empty() {
            bail!("config must not be empty");
        }
        Ok(())
    }
}

/// Service imports are produced by the multi-cluster control plane and carry
/// no references of their own.
#[async_trait::async_trait]
impl Validate<ServiceImportSpec> for Validator {
    async fn validate(&self, _key: &ReconcileKey, _spec: &ServiceImportSpec) -> Result<()> {
        Ok(())
    }
}
