use crate::informer::EventQueue;
use crate::location_cache::LocationCache;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{node_delete_path, Event, Message, Operation};
use crate::resources::ResourceKind;
use crate::sync_loops::{next_step, LoopStep};
use k8s_openapi::api::core::v1::Node;
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const READY_CONDITION: &str = "Ready";

/// Not a fan-out loop: it drives `LocationCache` state. `Added`/`Modified`
/// record the node's `Ready` condition with no message emitted; downstream
/// effects propagate through the other loops that consult `IsEdgeNode`.
/// `Deleted` removes the node from the cache, then emits a single delete
/// message routed to the node itself.
///
/// Whether a `NotReady -> Ready` transition should itself trigger a
/// synthetic resync is left open as an explicit open question. This loop does
/// not emit one; if downstream components turn out to depend on a node
/// becoming ready to re-deliver missed state, that decision belongs here and
/// should be made deliberately, not inferred from this code.
pub async fn run(
    mut queue: EventQueue<Node>,
    cache: Arc<LocationCache>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("node sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => handle_event(event, &cache, message_layer.as_ref()).await,
        }
    }
    info!("node sync loop stopped");
}

pub(crate) fn ready_status(node: &Node) -> String {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == READY_CONDITION))
        .map(|c| c.status.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

async fn handle_event(event: Event<Node>, cache: &LocationCache, message_layer: &dyn MessageLayer) {
    match event {
        Event::Added(node) | Event::Modified(node) => {
            let name = node.metadata.name.clone().unwrap_or_default();
            if name.is_empty() {
                warn!("skipping node event: empty metadata.name");
                return;
            }
            let status = ready_status(&node);
            cache.update_edge_node(&name, &status);
        }
        Event::Deleted(node) => {
            let name = node.metadata.name.clone().unwrap_or_default();
            if name.is_empty() {
                warn!("skipping node delete event: empty metadata.name");
                return;
            }
            cache.delete_node(&name);

            let path = match node_delete_path(&name) {
                Ok(p) => p,
                Err(e) => {
                    warn!("{e}");
                    return;
                }
            };
            let resource_version = node.metadata.resource_version.clone().unwrap_or_default();
            let message = Message::new(
                path,
                Operation::Delete,
                resource_version,
                None,
                ResourceKind::Node(node),
            );
            send_best_effort(message_layer, message).await;
        }
    }
}
