use super::{References, Validate, Validator};
use crate::k8s::crd::infra_setting::AviInfraSettingSpec;
use anyhow::{bail, Result};
use ipnet::{Ipv4Net, Ipv6Net};
use lb_admission_core::{CollectionQuery, ObjectRef, ReconcileKey, ReferenceKind, RemoteObject};

#[async_trait::async_trait]
impl Validate<AviInfraSettingSpec> for Validator {
    async fn validate(&self, key: &ReconcileKey, spec: &AviInfraSettingSpec) -> Result<()> {
        if !spec.network.bgp_peer_labels.is_empty() && !spec.network.rhi_enabled() {
            bail!("BGPPeerLabels cannot be set if EnableRhi is false.");
        }

        let mut refs = References::default();
        for vip in &spec.network.vip_networks {
            if !vip.cidr.is_empty() && vip.cidr.parse::<Ipv4Net>().is_err() {
                bail!(
                    "invalid CIDR configuration {} detected for networkName {} in vipNetworkList",
                    vip.cidr,
                    vip.network_name
                );
            }
            if !vip.v6_cidr.is_empty() && vip.v6_cidr.parse::<Ipv6Net>().is_err() {
                bail!(
                    "invalid IPv6 CIDR configuration {} detected for networkName {} in vipNetworkList",
                    vip.v6_cidr,
                    vip.network_name
                );
            }
            refs.push(ReferenceKind::Network, &vip.network_name);
        }
        refs.push(ReferenceKind::ServiceEngineGroup, &spec.se_group.name);

        // A placement group whose labels differ from ours is rejected here,
        // so labels are only ever applied to unlabeled groups below.
        self.check_references(key, &refs).await?;

        if !spec.se_group.name.is_empty() {
            self.apply_se_group_labels(key, &spec.se_group.name).await;
        }
        Ok(())
    }
}

impl Validator {
    /// Labels an unlabeled placement group and records ownership of it.
    ///
    /// Failures are logged and otherwise ignored; the group is re-examined
    /// the next time the setting is admitted.
    async fn apply_se_group_labels(&self, key: &ReconcileKey, group: &str) {
        if self.cluster.disable_static_route_sync {
            tracing::debug!(%key, %group, "Static route sync disabled; skipping placement group labels");
            return;
        }

        let kind = ReferenceKind::ServiceEngineGroup;
        let client = self.resolver.pool().reference_client();
        let query = CollectionQuery {
            object_type: kind.object_type().to_string(),
            name: group.to_string(),
            fields: vec!["name", "labels", "uuid"],
        };
        let object = match client.get_collection(&query).await {
            Ok(collection) => collection
                .results
                .into_iter()
                .next()
                .and_then(|v| serde_json::from_value::<RemoteObject>(v).ok()),
            Err(error) => {
                tracing::warn!(%key, %group, %error, "Failed to fetch placement group");
                return;
            }
        };
        let Some(object) = object else {
            tracing::warn!(%key, %group, "Placement group not found");
            return;
        };

        let unlabeled = object.labels.as_ref().map_or(true, |l| l.is_empty());
        if unlabeled && !self.cluster.seg_labels.is_empty() {
            let target = ObjectRef::new(kind.object_type(), group).with_uuid(object.uuid.clone());
            if let Err(error) = client.update_labels(&target, &self.cluster.seg_labels).await {
                tracing::warn!(%key, %group, %error, "Failed to label placement group");
                return;
            }
            tracing::info!(%key, %group, "Labeled placement group");
        }

        if !self.indexes.se_groups.record(group, key) {
            let owner = self.indexes.se_groups.owner(group);
            tracing::debug!(%key, %group, ?owner, "Placement group labels are owned by another setting");
        }
    }
}
