//! End-to-end scenarios driving the real `Controller` wiring: events go in
//! through `EventSenders`, envelopes come out through a `ChannelMessageLayer`
//! receiver. Exercises the six scenarios the dispatch core is expected to
//! satisfy, using only this crate's public API.

use async_trait::async_trait;
use edgecontroller::config::DispatchConfig;
use edgecontroller::controller::{Controller, Listers};
use edgecontroller::errors::DispatchError;
use edgecontroller::informer::Lister;
use edgecontroller::message_layer::ChannelMessageLayer;
use edgecontroller::model::{Event, Operation};
use edgecontroller::resources::{EdgeCluster, EdgeClusterStatus, Mission, Rule};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Node, NodeCondition, NodeStatus, Pod, PodSpec, Volume,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

struct FixedLister<T>(Vec<T>);

#[async_trait]
impl<T: Clone + Send + Sync> Lister<T> for FixedLister<T> {
    async fn list(&self) -> Result<Vec<T>, DispatchError> {
        Ok(self.0.clone())
    }
}

fn meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        resource_version: Some("1".to_string()),
        ..Default::default()
    }
}

fn edge_role_node(name: &str) -> Node {
    let mut labels = BTreeMap::new();
    labels.insert("skate.io/role".to_string(), "edge".to_string());
    Node {
        metadata: ObjectMeta {
            labels: Some(labels),
            ..meta(name, "")
        },
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn pod_on_node(name: &str, namespace: &str, node_name: &str, config_map: &str) -> Pod {
    Pod {
        metadata: meta(name, namespace),
        spec: Some(PodSpec {
            node_name: Some(node_name.to_string()),
            volumes: Some(vec![Volume {
                name: format!("cm-{config_map}"),
                config_map: Some(ConfigMapVolumeSource {
                    name: Some(config_map.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

async fn start(listers: Listers) -> (Controller, edgecontroller::controller::EventSenders, tokio::sync::mpsc::Receiver<edgecontroller::model::Message>) {
    let (layer, rx) = ChannelMessageLayer::new(32);
    let (controller, senders) = Controller::start(DispatchConfig::default(), listers, Arc::new(layer))
        .await
        .expect("controller should start with valid listers");
    (controller, senders, rx)
}

fn empty_listers() -> Listers {
    Listers {
        nodes: Arc::new(FixedLister(vec![])),
        pods: Arc::new(FixedLister(vec![])),
        edge_clusters: Arc::new(FixedLister(vec![])),
        missions: Arc::new(FixedLister(vec![])),
    }
}

async fn recv(rx: &mut tokio::sync::mpsc::Receiver<edgecontroller::model::Message>) -> edgecontroller::model::Message {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("message should arrive within timeout")
        .expect("channel should not be closed")
}

#[tokio::test]
async fn pod_create_on_edge_node_routes_to_that_node_and_indexes_its_configmap() {
    let listers = Listers {
        nodes: Arc::new(FixedLister(vec![edge_role_node("n1")])),
        ..empty_listers()
    };
    let (controller, senders, mut rx) = start(listers).await;

    senders
        .pod
        .send(Event::Added(pod_on_node("p", "app", "n1", "c1")))
        .await
        .unwrap();

    let message = recv(&mut rx).await;
    assert_eq!(message.router.resource, "n1/app/pod/p");
    assert_eq!(message.router.operation, Operation::Insert);

    // the configmap loop should now see n1 as a destination
    senders
        .config_map
        .send(Event::Modified(ConfigMap {
            metadata: meta("c1", "app"),
            ..Default::default()
        }))
        .await
        .unwrap();
    let cm_message = recv(&mut rx).await;
    assert_eq!(cm_message.router.resource, "n1/app/configmap/c1");
    assert_eq!(cm_message.router.operation, Operation::Update);

    controller.shutdown().await;
}

#[tokio::test]
async fn configmap_update_fans_out_to_every_referencing_node() {
    let listers = Listers {
        nodes: Arc::new(FixedLister(vec![edge_role_node("n1"), edge_role_node("n2")])),
        pods: Arc::new(FixedLister(vec![
            pod_on_node("p1", "app", "n1", "c1"),
            pod_on_node("p2", "app", "n2", "c1"),
        ])),
        ..empty_listers()
    };
    let (controller, senders, mut rx) = start(listers).await;

    senders
        .config_map
        .send(Event::Modified(ConfigMap {
            metadata: meta("c1", "app"),
            ..Default::default()
        }))
        .await
        .unwrap();

    let mut resources = vec![recv(&mut rx).await.router.resource, recv(&mut rx).await.router.resource];
    resources.sort();
    assert_eq!(resources, vec!["n1/app/configmap/c1", "n2/app/configmap/c1"]);

    controller.shutdown().await;
}

#[tokio::test]
async fn edge_node_deletion_prunes_cache_and_emits_one_delete_message() {
    let listers = Listers {
        nodes: Arc::new(FixedLister(vec![edge_role_node("n1")])),
        pods: Arc::new(FixedLister(vec![pod_on_node("p", "app", "n1", "c1")])),
        ..empty_listers()
    };
    let (controller, senders, mut rx) = start(listers).await;

    senders
        .node
        .send(Event::Deleted(edge_role_node("n1")))
        .await
        .unwrap();

    let message = recv(&mut rx).await;
    assert_eq!(message.router.resource, "n1/namespace/node/n1");
    assert_eq!(message.router.operation, Operation::Delete);

    // the configmap that used to be referenced by n1 now has no destinations
    senders
        .config_map
        .send(Event::Modified(ConfigMap {
            metadata: meta("c1", "app"),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());

    controller.shutdown().await;
}

#[tokio::test]
async fn mission_fan_out_emits_one_message_per_registered_edge_cluster() {
    let listers = Listers {
        edge_clusters: Arc::new(FixedLister(vec![
            EdgeCluster {
                metadata: meta("ec1", ""),
                status: EdgeClusterStatus::default(),
            },
            EdgeCluster {
                metadata: meta("ec2", ""),
                status: EdgeClusterStatus::default(),
            },
        ])),
        ..empty_listers()
    };
    let (controller, senders, mut rx) = start(listers).await;

    senders
        .mission
        .send(Event::Added(Mission {
            metadata: meta("m1", "jobs"),
            spec: serde_json::Value::Null,
        }))
        .await
        .unwrap();

    let mut resources = vec![recv(&mut rx).await.router.resource, recv(&mut rx).await.router.resource];
    resources.sort();
    assert_eq!(resources, vec!["ec1/default/mission/m1", "ec2/default/mission/m1"]);

    controller.shutdown().await;
}

#[tokio::test]
async fn edge_cluster_reconcile_emits_update_only_on_membership_mismatch() {
    let listers = Listers {
        missions: Arc::new(FixedLister(vec![
            Mission { metadata: meta("m1", "jobs"), spec: serde_json::Value::Null },
            Mission { metadata: meta("m2", "jobs"), spec: serde_json::Value::Null },
            Mission { metadata: meta("m3", "jobs"), spec: serde_json::Value::Null },
        ])),
        ..empty_listers()
    };
    let (controller, senders, mut rx) = start(listers).await;

    senders
        .edge_cluster
        .send(Event::Added(EdgeCluster {
            metadata: meta("ec1", ""),
            status: EdgeClusterStatus {
                missions_in_edge: vec!["m1".to_string(), "m2".to_string()],
            },
        }))
        .await
        .unwrap();

    let message = recv(&mut rx).await;
    assert_eq!(message.router.resource, "ec1/default/missionlist/");
    assert_eq!(message.router.operation, Operation::Update);

    senders
        .edge_cluster
        .send(Event::Modified(EdgeCluster {
            metadata: meta("ec1", ""),
            status: EdgeClusterStatus {
                missions_in_edge: vec!["m1".to_string(), "m2".to_string(), "m3".to_string()],
            },
        }))
        .await
        .unwrap();
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());

    controller.shutdown().await;
}

#[tokio::test]
async fn rule_modify_is_skipped_but_add_and_delete_are_routed() {
    let (controller, senders, mut rx) = start(empty_listers()).await;

    senders
        .rule
        .send(Event::Modified(Rule { metadata: meta("r1", ""), spec: serde_json::Value::Null }))
        .await
        .unwrap();
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());

    senders
        .rule
        .send(Event::Added(Rule { metadata: meta("r1", ""), spec: serde_json::Value::Null }))
        .await
        .unwrap();
    let message = recv(&mut rx).await;
    assert_eq!(message.router.resource, "rule/r1");
    assert_eq!(message.router.operation, Operation::Insert);

    controller.shutdown().await;
}
