//! The multi-index answering "which edges need to see object X?".
//!
//! One `parking_lot::RwLock` per index, EdgeNodes, ConfigMapNodes,
//! SecretNodes, PodIndex, EdgeClusters.

use k8s_openapi::api::core::v1::Pod;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

pub type NamespaceName = (String, String);

/// The configmap/secret references a single pod carries, cached so a later
/// update or delete can diff against what was previously indexed without
/// re-reading the pod spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodRefs {
    pub node_name: String,
    pub config_maps: HashSet<String>,
    pub secrets: HashSet<String>,
}

fn pod_refs(pod: &Pod) -> PodRefs {
    let node_name = pod
        .spec
        .as_ref()
        .and_then(|s| s.node_name.clone())
        .unwrap_or_default();

    let mut config_maps = HashSet::new();
    let mut secrets = HashSet::new();

    if let Some(spec) = pod.spec.as_ref() {
        if let Some(volumes) = spec.volumes.as_ref() {
            for v in volumes {
                if let Some(cm) = v.config_map.as_ref().and_then(|c| c.name.clone()) {
                    config_maps.insert(cm);
                }
                if let Some(s) = v.secret.as_ref().and_then(|s| s.secret_name.clone()) {
                    secrets.insert(s);
                }
            }
        }

        let all_containers = spec
            .containers
            .iter()
            .chain(spec.init_containers.iter().flatten());

        for container in all_containers {
            if let Some(env_from) = container.env_from.as_ref() {
                for src in env_from {
                    if let Some(cm) = src.config_map_ref.as_ref().and_then(|r| r.name.clone()) {
                        config_maps.insert(cm);
                    }
                    if let Some(s) = src.secret_ref.as_ref().and_then(|r| r.name.clone()) {
                        secrets.insert(s);
                    }
                }
            }
        }
    }

    PodRefs {
        node_name,
        config_maps,
        secrets,
    }
}

#[derive(Default)]
pub struct LocationCache {
    edge_nodes: RwLock<HashMap<String, String>>,
    config_map_nodes: RwLock<HashMap<NamespaceName, HashSet<String>>>,
    secret_nodes: RwLock<HashMap<NamespaceName, HashSet<String>>>,
    pod_index: RwLock<HashMap<NamespaceName, PodRefs>>,
    edge_clusters: RwLock<HashMap<String, bool>>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    // --- edge nodes ---

    pub fn is_edge_node(&self, name: &str) -> bool {
        !name.is_empty() && self.edge_nodes.read().contains_key(name)
    }

    pub fn update_edge_node(&self, name: &str, status: &str) {
        self.edge_nodes
            .write()
            .insert(name.to_string(), status.to_string());
    }

    pub fn get_node_status(&self, name: &str) -> Option<String> {
        self.edge_nodes.read().get(name).cloned()
    }

    pub fn delete_node(&self, name: &str) {
        self.edge_nodes.write().remove(name);

        for index in [&self.config_map_nodes, &self.secret_nodes] {
            let mut index = index.write();
            index.retain(|_, nodes| {
                nodes.remove(name);
                !nodes.is_empty()
            });
        }
    }

    // --- configmaps / secrets ---

    pub fn config_map_nodes(&self, namespace: &str, name: &str) -> Vec<String> {
        self.config_map_nodes
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn secret_nodes(&self, namespace: &str, name: &str) -> Vec<String> {
        self.secret_nodes
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn delete_config_map(&self, namespace: &str, name: &str) {
        self.config_map_nodes
            .write()
            .remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn delete_secret(&self, namespace: &str, name: &str) {
        self.secret_nodes
            .write()
            .remove(&(namespace.to_string(), name.to_string()));
    }

    // --- pods ---

    /// Refreshes the configmap/secret indices for a pod's current reference
    /// set, removing stale memberships left over from a prior version of the
    /// same pod.
    pub fn add_or_update_pod(&self, namespace: &str, name: &str, pod: &Pod) {
        let refs = pod_refs(pod);
        if refs.node_name.is_empty() {
            return;
        }

        let key = (namespace.to_string(), name.to_string());
        let previous = self.pod_index.write().insert(key, refs.clone());

        if let Some(previous) = previous {
            for stale_cm in previous.config_maps.difference(&refs.config_maps) {
                self.remove_node_reference(&self.config_map_nodes, namespace, stale_cm, &refs.node_name);
            }
            for stale_secret in previous.secrets.difference(&refs.secrets) {
                self.remove_node_reference(&self.secret_nodes, namespace, stale_secret, &refs.node_name);
            }
        }

        for cm in &refs.config_maps {
            self.add_node_reference(&self.config_map_nodes, namespace, cm, &refs.node_name);
        }
        for secret in &refs.secrets {
            self.add_node_reference(&self.secret_nodes, namespace, secret, &refs.node_name);
        }
    }

    /// Removes the pod's memberships from every index using the cached
    /// reference set recorded for it, then forgets the pod.
    pub fn delete_pod(&self, namespace: &str, name: &str) {
        let key = (namespace.to_string(), name.to_string());
        let removed = self.pod_index.write().remove(&key);

        if let Some(refs) = removed {
            for cm in &refs.config_maps {
                self.remove_node_reference(&self.config_map_nodes, namespace, cm, &refs.node_name);
            }
            for secret in &refs.secrets {
                self.remove_node_reference(&self.secret_nodes, namespace, secret, &refs.node_name);
            }
        }
    }

    fn add_node_reference(
        &self,
        index: &RwLock<HashMap<NamespaceName, HashSet<String>>>,
        namespace: &str,
        name: &str,
        node: &str,
    ) {
        index
            .write()
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(node.to_string());
    }

    fn remove_node_reference(
        &self,
        index: &RwLock<HashMap<NamespaceName, HashSet<String>>>,
        namespace: &str,
        name: &str,
        node: &str,
    ) {
        let key = (namespace.to_string(), name.to_string());
        let mut index = index.write();
        if let Some(nodes) = index.get_mut(&key) {
            nodes.remove(node);
            if nodes.is_empty() {
                index.remove(&key);
            }
        }
    }

    // --- edge clusters ---

    pub fn update_edge_cluster(&self, name: &str, present: bool) {
        self.edge_clusters
            .write()
            .insert(name.to_string(), present);
    }

    pub fn delete_edge_cluster(&self, name: &str) {
        self.edge_clusters.write().remove(name);
    }

    /// A snapshot of every registered edge cluster name, tolerant of
    /// concurrent inserts/deletes racing this read (the mission loop is the
    /// only caller that needs this).
    pub fn edge_cluster_names(&self) -> Vec<String> {
        self.edge_clusters.read().keys().cloned().collect()
    }
}
