use crate::{
    control_plane::{ClientPool, HttpControlPlane},
    index::{CloudType, ClusterInfo, IndexMetrics, Indexes, NamespaceFilter, NamespaceSelector, ServiceType},
    k8s::{self, watcher},
    metrics::{AdmissionMetrics, QueueMetrics},
    pipeline::{self, Pipeline},
    process::{self, LogProcessor},
    queue::{ShardedQueue, SyncGate},
    resolver::ReferenceResolver,
    secrets::KubeSecrets,
    status::{KubeStatusSink, StatusMetrics, StatusWriter},
    validate::Validator,
};
use anyhow::{bail, Result};
use clap::Parser;
use futures::prelude::*;
use lb_admission_core::{Label, ProcessKey};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::{sync::oneshot, time::Duration};
use tracing::{info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(name = "lb-admission", about = "Admits load-balancer configuration resources")]
pub struct Args {
    #[clap(long, default_value = "lb_admission=info,warn", env = "LB_ADMISSION_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The number of work queue shards.
    #[clap(long, default_value = "8")]
    shards: usize,

    /// Base URL of the load-balancer controller's REST API.
    #[clap(long, env = "LB_ADMISSION_CONTROLLER_URL")]
    controller_url: String,

    #[clap(long, env = "LB_ADMISSION_CONTROLLER_USER")]
    controller_user: Option<String>,

    #[clap(long, env = "LB_ADMISSION_CONTROLLER_PASSWORD", hide_env_values = true)]
    controller_password: Option<String>,

    /// The number of control plane connections. Reference checks use the
    /// last one.
    #[clap(long, default_value = "8")]
    controller_clients: usize,

    #[clap(long, default_value = "10000")]
    controller_timeout_ms: u64,

    /// The name of this cluster, used to label the placement groups it owns.
    #[clap(long, env = "LB_ADMISSION_CLUSTER_NAME")]
    cluster_name: String,

    /// The identity stamped on control plane objects this operator creates.
    #[clap(long, default_value = "ako-default")]
    operator_identity: String,

    #[clap(long, default_value = "vcenter")]
    cloud_type: CloudType,

    #[clap(long, default_value = "")]
    cloud_uuid: String,

    #[clap(long, default_value = "cluster-ip")]
    service_type: ServiceType,

    /// Enables the enhanced virtual hosting architecture.
    #[clap(long)]
    evh_enabled: bool,

    #[clap(long)]
    disable_static_route_sync: bool,

    /// Namespaces whose multi-cluster bindings are never admitted.
    #[clap(long, default_value = "")]
    blocked_namespaces: Namespaces,

    /// A `key=value` label that namespaces must carry to admit multi-cluster
    /// bindings.
    #[clap(long)]
    namespace_selector: Option<NamespaceSelector>,

    /// Comma-separated `key=value` labels expected on placement groups.
    /// Defaults to `clustername=<cluster-name>`.
    #[clap(long, default_value = "")]
    seg_labels: Labels,

    #[clap(long, default_value = "5000")]
    patch_timeout_ms: u64,

    #[clap(long)]
    hostrule_disabled: bool,

    #[clap(long)]
    httprule_disabled: bool,

    #[clap(long)]
    infra_setting_disabled: bool,

    /// Watches mesh-routing resources.
    #[clap(long)]
    istio_enabled: bool,

    /// Watches multi-cluster ingress bindings and service imports.
    #[clap(long)]
    mci_enabled: bool,
}

#[derive(Clone, Debug, Default)]
struct Namespaces(Vec<String>);

#[derive(Clone, Debug, Default)]
struct Labels(Vec<Label>);

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            shards,
            controller_url,
            controller_user,
            controller_password,
            controller_clients,
            controller_timeout_ms,
            cluster_name,
            operator_identity,
            cloud_type,
            cloud_uuid,
            service_type,
            evh_enabled,
            disable_static_route_sync,
            blocked_namespaces: Namespaces(blocked_namespaces),
            namespace_selector,
            seg_labels: Labels(seg_labels),
            patch_timeout_ms,
            hostrule_disabled,
            httprule_disabled,
            infra_setting_disabled,
            istio_enabled,
            mci_enabled,
        } = self;

        if shards == 0 {
            bail!("--shards must be at least 1");
        }

        let cluster = Arc::new(ClusterInfo {
            operator_identity,
            cloud_type,
            cloud_uuid,
            service_type,
            evh_enabled,
            disable_static_route_sync,
            seg_labels: seg_labels_or_default(seg_labels, &cluster_name),
        });

        let credentials = match (controller_user, controller_password) {
            (Some(user), Some(password)) => Some((user, password)),
            (None, None) => None,
            _ => bail!("--controller-user and --controller-password must be set together"),
        };
        let controller_timeout = Duration::from_millis(controller_timeout_ms);
        let clients = (0..controller_clients.max(1))
            .map(|_| {
                HttpControlPlane::new(&controller_url, credentials.clone(), controller_timeout)
                    .map(|c| Arc::new(c) as Arc<dyn lb_admission_core::ControlPlane>)
            })
            .collect::<Result<Vec<_>>>()?;
        let pool = ClientPool::new(clients)?;

        let indexes = Indexes::new(NamespaceFilter::new(blocked_namespaces, namespace_selector));

        let mut prom = <Registry>::default();
        let admission = prom.sub_registry_with_prefix("admission");
        let admission_metrics = AdmissionMetrics::register(admission);
        let queue_metrics = QueueMetrics::register(admission);
        let status_metrics = StatusMetrics::register(admission);
        let index_metrics = IndexMetrics::register(admission);
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let gate = SyncGate::default();
        let queue = Arc::new(ShardedQueue::new(shards, gate.clone(), queue_metrics));

        let writer = StatusWriter::new(
            Arc::new(KubeStatusSink::new(
                runtime.client(),
                Duration::from_millis(patch_timeout_ms),
            )),
            status_metrics,
        );
        let validator = Validator::new(
            ReferenceResolver::new(pool, cluster.clone()),
            Arc::new(KubeSecrets::new(runtime.client())),
            indexes.clone(),
            cluster,
        );
        let pipeline = Arc::new(Pipeline::new(
            validator,
            writer,
            queue.clone(),
            indexes.clone(),
            admission_metrics,
            index_metrics,
        ));

        // Spawn resource watches.

        if !hostrule_disabled {
            let hostrules = runtime.watch_all::<k8s::HostRule>(watcher::Config::default());
            tokio::spawn(
                pipeline::admit_all(pipeline.clone(), hostrules).instrument(info_span!("hostrules")),
            );
        }

        if !httprule_disabled {
            let httprules = runtime.watch_all::<k8s::HttpRule>(watcher::Config::default());
            tokio::spawn(
                pipeline::admit_all(pipeline.clone(), httprules).instrument(info_span!("httprules")),
            );
        }

        if !infra_setting_disabled {
            let settings = runtime.watch_all::<k8s::AviInfraSetting>(watcher::Config::default());
            tokio::spawn(
                pipeline::admit_all(pipeline.clone(), settings)
                    .instrument(info_span!("aviinfrasettings")),
            );
        }

        if mci_enabled {
            // Bindings are filtered by namespace, so they wait for the initial
            // namespace list to be indexed.
            let namespaces_synced = if indexes.namespaces.has_selector() {
                let (tx, rx) = oneshot::channel();
                let namespaces = runtime.watch_all::<k8s::Namespace>(watcher::Config::default());
                tokio::spawn(
                    pipeline::index_namespaces(pipeline.clone(), namespaces, tx)
                        .instrument(info_span!("namespaces")),
                );
                rx.map(|_| ()).boxed().shared()
            } else {
                future::ready(()).boxed().shared()
            };

            let mcis = runtime.watch_all::<k8s::MultiClusterIngress>(watcher::Config::default());
            tokio::spawn(
                namespaces_synced
                    .clone()
                    .then({
                        let pipeline = pipeline.clone();
                        move |()| pipeline::admit_all(pipeline, mcis)
                    })
                    .instrument(info_span!("multiclusteringresses")),
            );

            let imports = runtime.watch_all::<k8s::ServiceImport>(watcher::Config::default());
            tokio::spawn(
                namespaces_synced
                    .then({
                        let pipeline = pipeline.clone();
                        move |()| pipeline::admit_all(pipeline, imports)
                    })
                    .instrument(info_span!("serviceimports")),
            );
        }

        if istio_enabled {
            let virtual_services =
                runtime.watch_all::<k8s::VirtualService>(watcher::Config::default());
            tokio::spawn(
                pipeline::admit_all(pipeline.clone(), virtual_services)
                    .instrument(info_span!("virtualservices")),
            );

            let destination_rules =
                runtime.watch_all::<k8s::DestinationRule>(watcher::Config::default());
            tokio::spawn(
                pipeline::admit_all(pipeline.clone(), destination_rules)
                    .instrument(info_span!("destinationrules")),
            );

            let gateways = runtime.watch_all::<k8s::Gateway>(watcher::Config::default());
            tokio::spawn(
                pipeline::admit_all(pipeline.clone(), gateways).instrument(info_span!("gateways")),
            );
        }

        // Spawn one worker per shard.
        let processor: Arc<dyn ProcessKey> = Arc::new(LogProcessor);
        for shard in queue.shards() {
            tokio::spawn(
                process::process_shard(shard.clone(), processor.clone())
                    .instrument(info_span!("shard", index = shard.index())),
            );
        }

        // Block the main thread on the shutdown signal. Once it fires, stop
        // admitting and drain the queues.
        let res = runtime.run().await;
        gate.suspend();
        queue.shutdown();
        if res.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

fn seg_labels_or_default(labels: Vec<Label>, cluster_name: &str) -> Vec<Label> {
    if labels.is_empty() {
        return vec![Label::new("clustername", cluster_name)];
    }
    labels
}

impl std::str::FromStr for Namespaces {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(
            s.split(',')
                .map(str::trim)
                .filter(|ns| !ns.is_empty())
                .map(ToString::to_string)
                .collect(),
        ))
    }
}

impl std::str::FromStr for Labels {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| match l.split_once('=') {
                Some((k, v)) if !k.is_empty() => Ok(Label::new(k, v)),
                _ => bail!("invalid label {l:?}; expected key=value"),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_lists() {
        let Labels(labels) = "clustername=c1, env=prod".parse().expect("valid labels");
        assert_eq!(
            labels,
            vec![Label::new("clustername", "c1"), Label::new("env", "prod")]
        );
        assert!("clustername".parse::<Labels>().is_err());
        assert!("".parse::<Labels>().expect("empty is valid").0.is_empty());
    }

    #[test]
    fn parses_namespace_lists() {
        let Namespaces(namespaces) = "kube-system,,avi-system".parse().expect("valid list");
        assert_eq!(namespaces, vec!["kube-system", "avi-system"]);
    }

    #[test]
    fn parses_args() {
        let args = Args::try_parse_from([
            "lb-admission",
            "--controller-url=https://controller.example.com",
            "--cluster-name=c1",
            "--cloud-type=aws",
            "--service-type=node-port",
            "--evh-enabled",
            "--namespace-selector=mci=enabled",
        ])
        .expect("args must parse");
        assert_eq!(args.cloud_type, CloudType::Aws);
        assert_eq!(args.service_type, ServiceType::NodePort);
        assert_eq!(args.shards, 8);
        assert_eq!(args.cluster_name, "c1");
        assert!(args.seg_labels.0.is_empty());
        assert!(args.evh_enabled);
        assert_eq!(
            args.namespace_selector,
            Some(NamespaceSelector {
                key: "mci".to_string(),
                value: "enabled".to_string(),
            })
        );
    }

    #[test]
    fn cluster_name_is_required() {
        let err = Args::try_parse_from([
            "lb-admission",
            "--controller-url=https://controller.example.com",
        ])
        .expect_err("cluster name must be required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn seg_labels_default_to_cluster_name() {
        assert_eq!(
            seg_labels_or_default(vec![], "c1"),
            vec![Label::new("clustername", "c1")]
        );
        let explicit = vec![Label::new("env", "prod")];
        assert_eq!(seg_labels_or_default(explicit.clone(), "c1"), explicit);
    }
}
