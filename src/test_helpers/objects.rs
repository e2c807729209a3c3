//! Object builders shared by sync-loop and cache unit tests. Kept minimal,
//! just enough fields on each object for the behavior under test to see.

use crate::resources::{EdgeCluster, EdgeClusterStatus, Mission, Rule, RuleEndpoint};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Node, NodeCondition, NodeStatus, Pod, PodSpec, Secret,
    SecretVolumeSource, Volume,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

fn meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        resource_version: Some("1".to_string()),
        ..Default::default()
    }
}

pub fn pod_with_refs(
    name: &str,
    namespace: &str,
    node_name: &str,
    config_maps: &[&str],
    secrets: &[&str],
) -> Pod {
    let mut volumes = Vec::new();
    for cm in config_maps {
        volumes.push(Volume {
            name: format!("cm-{cm}"),
            config_map: Some(ConfigMapVolumeSource {
                name: Some(cm.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
    }
    for secret in secrets {
        volumes.push(Volume {
            name: format!("secret-{secret}"),
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    Pod {
        metadata: meta(name, namespace),
        spec: Some(PodSpec {
            node_name: if node_name.is_empty() {
                None
            } else {
                Some(node_name.to_string())
            },
            volumes: if volumes.is_empty() { None } else { Some(volumes) },
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn config_map(name: &str, namespace: &str) -> ConfigMap {
    ConfigMap {
        metadata: meta(name, namespace),
        ..Default::default()
    }
}

pub fn secret(name: &str, namespace: &str) -> Secret {
    Secret {
        metadata: meta(name, namespace),
        ..Default::default()
    }
}

pub fn node(name: &str, ready_status: &str) -> Node {
    Node {
        metadata: meta(name, ""),
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: ready_status.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn rule(name: &str) -> Rule {
    Rule {
        metadata: meta(name, ""),
        spec: serde_json::Value::Null,
    }
}

pub fn rule_endpoint(name: &str) -> RuleEndpoint {
    RuleEndpoint {
        metadata: meta(name, ""),
        spec: serde_json::Value::Null,
    }
}

pub fn mission(name: &str, namespace: &str) -> Mission {
    Mission {
        metadata: meta(name, namespace),
        spec: serde_json::Value::Null,
    }
}

pub fn edge_cluster(name: &str, missions_in_edge: &[&str]) -> EdgeCluster {
    EdgeCluster {
        metadata: meta(name, ""),
        status: EdgeClusterStatus {
            missions_in_edge: missions_in_edge.iter().map(|s| s.to_string()).collect(),
        },
    }
}
