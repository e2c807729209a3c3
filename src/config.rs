//! Configuration for the dispatch core itself. Loading *this* crate's own
//! knobs is in scope; loading the upstream (edge→cloud) controller's config,
//! or serving it over HTTP, is not.

use serde::{Deserialize, Serialize};

/// Default capacity of each per-kind event queue. Chosen generously enough that a burst of events from a resync
/// doesn't immediately apply backpressure to the informer adapter.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// The label key identifying an edge-role node.
    pub edge_role_label_key: String,
    /// The label value that marks a node as edge-role.
    pub edge_role_label_value: String,
    /// Capacity of each of the eight per-kind event queues.
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            edge_role_label_key: "skate.io/role".to_string(),
            edge_role_label_value: "edge".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl DispatchConfig {
    pub fn is_edge_node_label(&self, labels: &std::collections::BTreeMap<String, String>) -> bool {
        labels
            .get(&self.edge_role_label_key)
            .is_some_and(|v| v == &self.edge_role_label_value)
    }
}
