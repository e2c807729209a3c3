use crate::informer::EventQueue;
use crate::location_cache::LocationCache;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{resource_path, Event, Message, Operation};
use crate::resources::ResourceKind;
use crate::sync_loops::{next_step, LoopStep};
use k8s_openapi::api::core::v1::Secret;
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Identical shape to the configmap loop, with one deliberate quirk: `Added`
/// maps to `update`, not `insert`. Backward-compatibility concession for
/// older edges that only understood `update`.
pub async fn run(
    mut queue: EventQueue<Secret>,
    cache: Arc<LocationCache>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("secret sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => handle_event(event, &cache, message_layer.as_ref()).await,
        }
    }
    info!("secret sync loop stopped");
}

async fn handle_event(event: Event<Secret>, cache: &LocationCache, message_layer: &dyn MessageLayer) {
    let secret = event.object();
    let namespace = secret.metadata.namespace.clone().unwrap_or_default();
    let name = secret.metadata.name.clone().unwrap_or_default();

    let destinations = cache.secret_nodes(&namespace, &name);

    // Added -> update is intentional; see module docs.
    let operation = match event {
        Event::Added(_) => Operation::Update,
        Event::Modified(_) => Operation::Update,
        Event::Deleted(_) => Operation::Delete,
    };

    if matches!(event, Event::Deleted(_)) {
        cache.delete_secret(&namespace, &name);
    }

    if destinations.is_empty() {
        return;
    }

    let resource_version = secret.metadata.resource_version.clone().unwrap_or_default();
    let parent_id = uuid::Uuid::new_v4().to_string();

    for node in destinations {
        let path = match resource_path(&node, &namespace, "secret", &name) {
            Ok(p) => p,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        let message = Message::new(
            path,
            operation,
            resource_version.clone(),
            Some(parent_id.clone()),
            ResourceKind::Secret(secret.clone()),
        );
        send_best_effort(message_layer, message).await;
    }
}
