use crate::informer::EventQueue;
use crate::location_cache::LocationCache;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{resource_path, Event, Message, Operation};
use crate::resources::{Mission, ResourceKind};
use crate::sync_loops::{next_step, LoopStep};
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MISSION_NAMESPACE: &str = "default";

/// Fan-out target is every registered edge cluster. A mission has
/// no node affinity of its own; it's the clusters that decide where to run
/// it. Destination namespace is fixed to `"default"`, independent of the
/// mission's own namespace.
pub async fn run(
    mut queue: EventQueue<Mission>,
    cache: Arc<LocationCache>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("mission sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => handle_event(event, &cache, message_layer.as_ref()).await,
        }
    }
    info!("mission sync loop stopped");
}

async fn handle_event(event: Event<Mission>, cache: &LocationCache, message_layer: &dyn MessageLayer) {
    let mission = event.object();
    let name = mission.metadata.name.clone().unwrap_or_default();

    let operation = match event {
        Event::Added(_) => Operation::Insert,
        Event::Modified(_) => Operation::Update,
        Event::Deleted(_) => Operation::Delete,
    };

    let destinations = cache.edge_cluster_names();
    if destinations.is_empty() {
        return;
    }

    let resource_version = mission
        .metadata
        .resource_version
        .clone()
        .unwrap_or_default();
    let parent_id = uuid::Uuid::new_v4().to_string();

    for cluster in destinations {
        let path = match resource_path(&cluster, MISSION_NAMESPACE, "mission", &name) {
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
            ResourceKind::Mission(mission.clone()),
        );
        send_best_effort(message_layer, message).await;
    }
}
