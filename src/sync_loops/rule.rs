use crate::informer::EventQueue;
use crate::message_layer::{send_best_effort, MessageLayer};
use crate::model::{router_scoped_path, Event, Message, Operation};
use crate::resources::{ResourceKind, Rule};
use crate::sync_loops::{next_step, LoopStep};
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Router-scoped, not fanned out through the `LocationCache`. A rule has no
/// node affinity, so there is exactly one destination: the router itself.
/// `Modified` has no supported semantics for this kind and is
/// logged and skipped rather than guessed at.
pub async fn run(
    mut queue: EventQueue<Rule>,
    message_layer: Arc<dyn MessageLayer>,
    cancel: CancellationToken,
) {
    info!("rule sync loop started");
    loop {
        match next_step(&mut queue, &cancel).await {
            LoopStep::Cancelled => break,
            LoopStep::Event(event) => handle_event(event, message_layer.as_ref()).await,
        }
    }
    info!("rule sync loop stopped");
}

async fn handle_event(event: Event<Rule>, message_layer: &dyn MessageLayer) {
    let rule = event.object();
    let name = rule.metadata.name.clone().unwrap_or_default();

    let operation = match event {
        Event::Added(_) => Operation::Insert,
        Event::Deleted(_) => Operation::Delete,
        Event::Modified(_) => {
            warn!("rule {name}: modify is unsupported, skipping");
            return;
        }
    };

    let path = match router_scoped_path("rule", &name) {
        Ok(p) => p,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    let resource_version = rule.metadata.resource_version.clone().unwrap_or_default();
    let message = Message::new(
        path,
        operation,
        resource_version,
        None,
        ResourceKind::Rule(rule.clone()),
    );
    send_best_effort(message_layer, message).await;
}
