use crate::{control_plane::ClientPool, index::ClusterInfo};
use lb_admission_core::{
    reference::ALLOWED_APPLICATION_PROFILE, CollectionQuery, ObjectQuery, ReconcileKey,
    ReferenceCheckResult, ReferenceKind, RemoteObject,
};
use std::sync::Arc;

/// Checks named references against the control plane's inventory.
#[derive(Clone, Debug)]
pub struct ReferenceResolver {
    pool: ClientPool,
    cluster: Arc<ClusterInfo>,
}

// === impl ReferenceResolver ===

impl ReferenceResolver {
    pub fn new(pool: ClientPool, cluster: Arc<ClusterInfo>) -> Self {
        Self { pool, cluster }
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }

    /// Resolves a single, non-empty reference.
    ///
    /// Transport and decoding failures are reported as "not found": a caller
    /// cannot tell an outage from a missing object, and the reference is
    /// re-checked on the next admission anyway.
    pub async fn resolve(
        &self,
        key: &ReconcileKey,
        kind: ReferenceKind,
        name: &str,
    ) -> ReferenceCheckResult {
        let client = self.pool.reference_client();

        if kind == ReferenceKind::Network && self.cluster.is_public_cloud() {
            let cloud = self.cluster.cloud_type;
            if cloud.skips_network_check() {
                tracing::debug!(%key, %cloud, network = %name, "Skipping network check");
                return ReferenceCheckResult::valid(kind, name);
            }
            if cloud.uses_network_ref() {
                let query = ObjectQuery::new(kind.object_type(), name)
                    .with_param("cloud_uuid", self.cluster.cloud_uuid.clone());
                let uri = query.uri();
                return match client.get(&query).await {
                    Ok(Some(_)) => {
                        tracing::debug!(%key, %cloud, network = %name, "Found network");
                        ReferenceCheckResult::valid(kind, name)
                    }
                    Ok(None) => {
                        tracing::warn!(%key, %uri, "No objects found");
                        ReferenceCheckResult::not_found(kind, name)
                    }
                    Err(error) => {
                        tracing::warn!(%key, %uri, %error, "Failed to look up network");
                        ReferenceCheckResult::not_found(kind, name)
                    }
                };
            }
        }

        let query = CollectionQuery::by_name(kind.object_type(), name);
        let collection = match client.get_collection(&query).await {
            Ok(collection) => collection,
            Err(error) => {
                tracing::warn!(%key, uri = %query.uri(), %error, "Failed to query collection");
                return ReferenceCheckResult::not_found(kind, name);
            }
        };
        if collection.count == 0 {
            tracing::warn!(%key, %kind, %name, "No objects found");
            return ReferenceCheckResult::not_found(kind, name);
        }
        let Some(first) = collection.results.into_iter().next() else {
            tracing::warn!(%key, %kind, %name, "Collection has no results");
            return ReferenceCheckResult::not_found(kind, name);
        };
        let object = match serde_json::from_value::<RemoteObject>(first) {
            Ok(object) => object,
            Err(error) => {
                tracing::warn!(%key, %kind, %name, %error, "Failed to decode object");
                return ReferenceCheckResult::unparseable(kind, name);
            }
        };

        match kind {
            ReferenceKind::AppProfile => {
                if let Some(ty) = object.object_type.as_deref() {
                    if ty != ALLOWED_APPLICATION_PROFILE {
                        tracing::warn!(%key, profile = %name, profile_type = %ty, "Unsupported application profile type");
                        return ReferenceCheckResult::wrong_type(
                            kind,
                            name,
                            ALLOWED_APPLICATION_PROFILE,
                        );
                    }
                }
            }
            ReferenceKind::ServiceEngineGroup => match object.labels.as_deref() {
                None | Some([]) => {
                    tracing::debug!(%key, group = %name, "Placement group has no labels");
                }
                Some(labels) if labels != self.cluster.seg_labels.as_slice() => {
                    let labels = serde_json::to_string(labels).unwrap_or_default();
                    tracing::warn!(%key, group = %name, %labels, "Mismatched placement group labels");
                    return ReferenceCheckResult::mismatched_labels(kind, name, &labels);
                }
                Some(_) => {}
            },
            _ => {}
        }

        if object.created_by.as_deref() == Some(self.cluster.operator_identity.as_str()) {
            tracing::warn!(%key, %kind, %name, "Referenced object was created by this operator");
            return ReferenceCheckResult::owned_by_self(kind, name);
        }

        tracing::debug!(%key, %kind, %name, "Reference found");
        ReferenceCheckResult::valid(kind, name)
    }
}
