use crate::informer::{EventQueue, Lister};
use crate::location_cache::LocationCache;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{mission_list_path, Event, Message, Operation};
use crate::resources::{EdgeCluster, Mission, MissionList, ResourceKind};
use crate::sync_loops::{next_step, LoopStep};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Not fanned out by event count: one reconcile message at most per event,
/// and only when cloud and edge disagree on mission membership.
/// `Deleted` only updates `LocationCache`; `Modified`/`Added` are the only
/// event types that trigger the mission-list comparison. Any other event
/// shape is logged and skipped.
pub async fn run(
    mut queue: EventQueue<EdgeCluster>,
    cache: Arc<LocationCache>,
    mission_lister: Arc<dyn Lister<Mission>>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("edge cluster sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => {
                handle_event(event, &cache, mission_lister.as_ref(), message_layer.as_ref()).await
            }
        }
    }
    info!("edge cluster sync loop stopped");
}

async fn handle_event(
    event: Event<EdgeCluster>,
    cache: &LocationCache,
    mission_lister: &dyn Lister<Mission>,
    message_layer: &dyn MessageLayer,
) {
    let edge_cluster = event.object();
    let name = edge_cluster.metadata.name.clone().unwrap_or_default();
    if name.is_empty() {
        warn!("skipping edge cluster event: empty metadata.name");
        return;
    }

    match &event {
        Event::Added(_) | Event::Modified(_) => {
            cache.update_edge_cluster(&name, true);
            reconcile_missions(edge_cluster, mission_lister, message_layer).await;
        }
        Event::Deleted(_) => {
            cache.delete_edge_cluster(&name);
        }
    }
}

async fn reconcile_missions(
    edge_cluster: &EdgeCluster,
    mission_lister: &dyn Lister<Mission>,
    message_layer: &dyn MessageLayer,
) {
    let name = edge_cluster.metadata.name.clone().unwrap_or_default();

    let missions_in_cloud = match mission_lister.list().await {
        Ok(missions) => missions,
        Err(e) => {
            warn!("edge cluster {name}: failed to list missions: {e}");
            return;
        }
    };

    let cloud_names: HashSet<&str> = missions_in_cloud
        .iter()
        .filter_map(|m| m.metadata.name.as_deref())
        .collect();
    let edge_names: HashSet<&str> = edge_cluster
        .status
        .missions_in_edge
        .iter()
        .map(|s| s.as_str())
        .collect();

    if cloud_names == edge_names {
        return;
    }

    let path = match mission_list_path(&name) {
        Ok(p) => p,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    let message = Message::new(
        path,
        Operation::Update,
        String::new(),
        None,
        ResourceKind::MissionList(MissionList {
            items: missions_in_cloud,
        }),
    );
    send_best_effort(message_layer, message).await;
}
