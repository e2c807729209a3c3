use crate::informer::EventQueue;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{router_scoped_path, Event, Message, Operation};
use crate::resources::{ResourceKind, RuleEndpoint};
use crate::sync_loops::{next_step, LoopStep};
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Identical shape to the rule loop.
pub async fn run(
    mut queue: EventQueue<RuleEndpoint>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("rule endpoint sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => handle_event(event, message_layer.as_ref()).await,
        }
    }
    info!("rule endpoint sync loop stopped");
}

async fn handle_event(event: Event<RuleEndpoint>, message_layer: &dyn MessageLayer) {
    let rule_endpoint = event.object();
    let name = rule_endpoint.metadata.name.clone().unwrap_or_default();

    let operation = match event {
        Event::Added(_) => Operation::Insert,
        Event::Deleted(_) => Operation::Delete,
        Event::Modified(_) => {
            warn!("rule endpoint {name}: modify is unsupported, skipping");
            return;
        }
    };

    let path = match router_scoped_path("ruleendpoint", &name) {
        Ok(p) => p,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    let resource_version = rule_endpoint
        .metadata
        .resource_version
        .clone()
        .unwrap_or_default();
    let message = Message::new(
        path,
        operation,
        resource_version,
        None,
        ResourceKind::RuleEndpoint(rule_endpoint.clone()),
    );
    send_best_effort(message_layer, message).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_layer::ChannelMessageLayer;
    use crate::test_helpers::objects::rule_endpoint;

    #[tokio::test]
    async fn deleted_rule_endpoint_emits_delete() {
        let (layer, mut rx) = ChannelMessageLayer::new(4);

        handle_event(Event::Deleted(rule_endpoint("re1")), &layer).await;

        let message = rx.recv().await.unwrap();
        assert_eq!(message.router.resource, "ruleendpoint/re1");
        assert_eq!(message.router.operation, Operation::Delete);
    }
}
