use crate::informer::EventQueue;
use crate::location_cache::LocationCache;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{resource_path, Event, Message, Operation};
use crate::resources::ResourceKind;
use crate::sync_loops::{next_step, LoopStep};
use k8s_openapi::api::core::v1::ConfigMap;
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fan-out target is every edge node currently referencing this configmap
/// On `Deleted` the index entry is removed only *after* the
/// destination set has been snapshotted, so the delete message still reaches
/// everyone who had it mounted.
pub async fn run(
    mut queue: EventQueue<ConfigMap>,
    cache: Arc<LocationCache>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("configmap sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => handle_event(event, &cache, message_layer.as_ref()).await,
        }
    }
    info!("configmap sync loop stopped");
}

async fn handle_event(
    event: Event<ConfigMap>,
    cache: &LocationCache,
    message_layer: &dyn MessageLayer,
) {
    let config_map = event.object();
    let namespace = config_map.metadata.namespace.clone().unwrap_or_default();
    let name = config_map.metadata.name.clone().unwrap_or_default();

    let destinations = cache.config_map_nodes(&namespace, &name);

    let operation = match event {
        Event::Added(_) => Operation::Insert,
        Event::Modified(_) => Operation::Update,
        Event::Deleted(_) => Operation::Delete,
    };

    if matches!(event, Event::Deleted(_)) {
        cache.delete_config_map(&namespace, &name);
    }

    if destinations.is_empty() {
        return;
    }

    let resource_version = config_map
        .metadata
        .resource_version
        .clone()
        .unwrap_or_default();
    let parent_id = uuid::Uuid::new_v4().to_string();

    for node in destinations {
        let path = match resource_path(&node, &namespace, "configmap", &name) {
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
            ResourceKind::ConfigMap(config_map.clone()),
        );
        send_best_effort(message_layer, message).await;
    }
}
