//! Wires the eight sync loops to one shared `LocationCache` and
//! `MessageLayer`, primes the cache at startup, and owns their lifetime.
//! Listers and the message layer are handed in as trait objects rather than
//! constructed here, so the real informer/transport adapters never need to
//! be known by this crate.

use crate::config::DispatchConfig;
use crate::errors::DispatchError;
use crate::informer::{EventQueue, Lister};
use crate::location_cache::LocationCache;
use crate::message_layer::MessageLayer;
use crate::model::Event;
use crate::resources::EdgeCluster;
use crate::sync_loops::{configmap, edge_cluster, mission, node, pod, rule, rule_endpoint, secret};
use k8s_openapi::api::core::v1::{ConfigMap, Node, Pod, Secret};
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The one-shot listers this core needs to prime `LocationCache` at startup,
/// plus the mission lister the edge-cluster loop consults on every reconcile.
pub struct Listers {
    pub nodes: Arc<dyn Lister<Node>>,
    pub pods: Arc<dyn Lister<Pod>>,
    pub edge_clusters: Arc<dyn Lister<EdgeCluster>>,
    pub missions: Arc<dyn Lister<crate::resources::Mission>>,
}

/// The producer half of each per-kind event queue, handed back to whatever
/// informer adapter feeds this core (see `informer` module docs).
pub struct EventSenders {
    pub pod: tokio::sync::mpsc::Sender<Event<Pod>>,
    pub config_map: tokio::sync::mpsc::Sender<Event<ConfigMap>>,
    pub secret: tokio::sync::mpsc::Sender<Event<Secret>>,
    pub node: tokio::sync::mpsc::Sender<Event<Node>>,
    pub rule: tokio::sync::mpsc::Sender<Event<crate::resources::Rule>>,
    pub rule_endpoint: tokio::sync::mpsc::Sender<Event<crate::resources::RuleEndpoint>>,
    pub mission: tokio::sync::mpsc::Sender<Event<crate::resources::Mission>>,
    pub edge_cluster: tokio::sync::mpsc::Sender<Event<EdgeCluster>>,
}

pub struct Controller {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Controller {
    /// Lists the current world, then spawns the eight sync
    /// loops (step 3). A listing failure is fatal: the controller never
    /// launches with a stale or empty cache.
    pub async fn start(
        config: DispatchConfig,
        listers: Listers,
        message_layer: Arc<dyn MessageLayer>,
    ) -> Result<(Self, EventSenders), DispatchError> {
        let cache = Arc::new(LocationCache::new());
        init_locating(&cache, &config, &listers).await?;

        let cancel = CancellationToken::new();
        let mut handles = Vec::new();

        let (pod_tx, pod_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(pod::run(
            pod_rx,
            cache.clone(),
            message_layer.clone(),
            cancel.clone(),
        )));

        let (config_map_tx, config_map_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(configmap::run(
            config_map_rx,
            cache.clone(),
            message_layer.clone(),
            cancel.clone(),
        )));

        let (secret_tx, secret_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(secret::run(
            secret_rx,
            cache.clone(),
            message_layer.clone(),
            cancel.clone(),
        )));

        let (node_tx, node_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(node::run(
            node_rx,
            cache.clone(),
            message_layer.clone(),
            cancel.clone(),
        )));

        let (rule_tx, rule_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(rule::run(
            rule_rx,
            message_layer.clone(),
            cancel.clone(),
        )));

        let (rule_endpoint_tx, rule_endpoint_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(rule_endpoint::run(
            rule_endpoint_rx,
            message_layer.clone(),
            cancel.clone(),
        )));

        let (mission_tx, mission_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(mission::run(
            mission_rx,
            cache.clone(),
            message_layer.clone(),
            cancel.clone(),
        )));

        let (edge_cluster_tx, edge_cluster_rx) = EventQueue::new(config.queue_capacity);
        handles.push(tokio::spawn(edge_cluster::run(
            edge_cluster_rx,
            cache.clone(),
            listers.missions.clone(),
            message_layer.clone(),
            cancel.clone(),
        )));

        info!("controller started all eight sync loops");

        Ok((
            Controller { cancel, handles },
            EventSenders {
                pod: pod_tx,
                config_map: config_map_tx,
                secret: secret_tx,
                node: node_tx,
                rule: rule_tx,
                rule_endpoint: rule_endpoint_tx,
                mission: mission_tx,
                edge_cluster: edge_cluster_tx,
            },
        ))
    }

    /// Signals every loop's cancellation token and waits for all eight to
    /// exit. Join errors are logged, not surfaced, since shutdown must still
    /// complete.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::warn!("sync loop task did not shut down cleanly: {e}");
            }
        }
        info!("controller shut down");
    }
}

async fn init_locating(
    cache: &LocationCache,
    config: &DispatchConfig,
    listers: &Listers,
) -> Result<(), DispatchError> {
    for n in listers.nodes.list().await? {
        let name = n.metadata.name.clone().unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let labels = n.metadata.labels.clone().unwrap_or_default();
        if config.is_edge_node_label(&labels) {
            let status = node::ready_status(&n);
            cache.update_edge_node(&name, &status);
        }
    }

    for p in listers.pods.list().await? {
        let node_name = p
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default();
        if !cache.is_edge_node(&node_name) {
            continue;
        }
        let namespace = p.metadata.namespace.clone().unwrap_or_default();
        let name = p.metadata.name.clone().unwrap_or_default();
        cache.add_or_update_pod(&namespace, &name, &p);
    }

    for ec in listers.edge_clusters.list().await? {
        let name = ec.metadata.name.clone().unwrap_or_default();
        if !name.is_empty() {
            cache.update_edge_cluster(&name, true);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_layer::ChannelMessageLayer;
    use crate::test_helpers::objects::{config_map, pod_with_refs, secret};
    use async_trait::async_trait;

    struct FixedLister<T>(Vec<T>);

    #[async_trait]
    impl<T: Clone + Send + Sync> Lister<T> for FixedLister<T> {
        async fn list(&self) -> Result<Vec<T>, DispatchError> {
            Ok(self.0.clone())
        }
    }

    fn edge_role_node(name: &str) -> Node {
        let mut labels = std::collections::BTreeMap::new();
        labels.insert("skate.io/role".to_string(), "edge".to_string());
        Node {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            status: Some(k8s_openapi::api::core::v1::NodeStatus {
                conditions: Some(vec![k8s_openapi::api::core::v1::NodeCondition {
                    type_: "Ready".to_string(),
                    status: "True".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_primes_cache_from_listers_and_spawns_all_loops() {
        let listers = Listers {
            nodes: Arc::new(FixedLister(vec![edge_role_node("n1")])),
            pods: Arc::new(FixedLister(vec![pod_with_refs(
                "p1", "app", "n1", &["c1"], &[],
            )])),
            edge_clusters: Arc::new(FixedLister(vec![
                crate::test_helpers::objects::edge_cluster("ec1", &[]),
            ])),
            missions: Arc::new(FixedLister(vec![])),
        };
        let (layer, _rx) = ChannelMessageLayer::new(16);

        let (controller, senders) =
            Controller::start(DispatchConfig::default(), listers, Arc::new(layer))
                .await
                .unwrap();

        senders
            .config_map
            .send(Event::Modified(config_map("c1", "app")))
            .await
            .unwrap();
        senders
            .secret
            .send(Event::Added(secret("s1", "app")))
            .await
            .unwrap();

        controller.shutdown().await;
    }
}
