use crate::informer::EventQueue;
use crate::location_cache::LocationCache;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{resource_path, Event, Message, Operation};
use crate::resources::ResourceKind;
use crate::sync_loops::{next_step, LoopStep};
use k8s_openapi::api::core::v1::Pod;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fan-out target is the single node the pod is scheduled on.
/// `Deleted` does not refresh `PodIndex` before emitting; the pod's cached
/// reference set stays around for a window after delete (see open question
/// in DESIGN.md).
pub async fn run(
    mut queue: EventQueue<Pod>,
    cache: Arc<LocationCache>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("pod sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => handle_event(event, &cache, message_layer.as_ref()).await,
        }
    }
    info!("pod sync loop stopped");
}

async fn handle_event(event: Event<Pod>, cache: &LocationCache, message_layer: &dyn MessageLayer) {
    let pod = event.object();
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();
    let name = pod.metadata.name.clone().unwrap_or_default();
    let node_name = pod
        .spec
        .as_ref()
        .and_then(|s| s.node_name.clone())
        .unwrap_or_default();

    if !cache.is_edge_node(&node_name) {
        debug!("skipping pod {namespace}/{name}: node {node_name:?} is not an edge node");
        return;
    }

    let operation = match event {
        Event::Added(_) => Operation::Insert,
        Event::Modified(_) => Operation::Update,
        Event::Deleted(_) => Operation::Delete,
    };

    let path = match resource_path(&node_name, &namespace, "pod", &name) {
        Ok(p) => p,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    let resource_version = pod.metadata.resource_version.clone().unwrap_or_default();
    let message = Message::new(
        path,
        operation,
        resource_version,
        None,
        ResourceKind::Pod(pod.clone()),
    );

    match &event {
        Event::Added(_) | Event::Modified(_) => cache.add_or_update_pod(&namespace, &name, pod),
        Event::Deleted(_) => {}
    }

    send_best_effort(message_layer, message).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_layer::ChannelMessageLayer;
    use crate::test_helpers::objects::pod_with_refs;

    #[tokio::test]
    async fn pod_create_on_edge_node_emits_insert_and_indexes_configmap() {
        let cache = LocationCache::new();
        cache.update_edge_node("n1", "True");
        let (layer, mut rx) = ChannelMessageLayer::new(4);

        let pod = pod_with_refs("p", "app", "n1", &["c1"], &[]);
        handle_event(Event::Added(pod), &cache, &layer).await;

        let message = rx.recv().await.expect("expected a message");
        assert_eq!(message.router.resource, "n1/app/pod/p");
        assert_eq!(message.router.operation, Operation::Insert);
        assert_eq!(cache.config_map_nodes("app", "c1"), vec!["n1".to_string()]);
    }

    #[tokio::test]
    async fn pod_on_non_edge_node_is_skipped() {
        let cache = LocationCache::new();
        let (layer, mut rx) = ChannelMessageLayer::new(4);

        let pod = pod_with_refs("p", "app", "n1", &[], &[]);
        handle_event(Event::Added(pod), &cache, &layer).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn pod_with_empty_node_name_is_skipped() {
        let cache = LocationCache::new();
        cache.update_edge_node("", "True"); // should be unreachable but guards the invariant directly
        let (layer, mut rx) = ChannelMessageLayer::new(4);

        let pod = pod_with_refs("p", "app", "", &[], &[]);
        handle_event(Event::Added(pod), &cache, &layer).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn pod_delete_does_not_refresh_index_before_emitting() {
        let cache = LocationCache::new();
        cache.update_edge_node("n1", "True");
        let (layer, mut rx) = ChannelMessageLayer::new(4);

        let pod = pod_with_refs("p", "app", "n1", &["c1"], &[]);
        handle_event(Event::Added(pod.clone()), &cache, &layer).await;
        rx.try_recv().unwrap();

        handle_event(Event::Deleted(pod), &cache, &layer).await;
        let message = rx.recv().await.unwrap();
        assert_eq!(message.router.operation, Operation::Delete);
        // preserved open-question behavior: still indexed after the delete event
        assert_eq!(cache.config_map_nodes("app", "c1"), vec!["n1".to_string()]);
    }
}
