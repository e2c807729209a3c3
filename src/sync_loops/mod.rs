//! The eight per-kind sync loops. Every loop follows the same skeleton:
//! consume one event, filter, map the event type
//! to an operation, build a resource identifier, assemble an envelope, fan
//! it out through the `LocationCache` if the kind requires it, and hand each
//! envelope to the `MessageLayer`. All eight run concurrently, sharing one
//! `LocationCache` and one `MessageLayer`, and all exit cleanly when the
//! shared cancellation token fires.
//!
//! Errors encountered while handling a single event (malformed identifier,
//! unsupported event type for the kind, transport failure) are logged and
//! the event is skipped. Nothing here ever propagates an error out of a
//! loop or kills it.

pub mod configmap;
pub mod edge_cluster;
pub mod mission;
pub mod node;
pub mod pod;
pub mod rule;
pub mod rule_endpoint;
pub mod secret;

use crate::informer::EventQueue;
use crate::model::Event;
use tokio_util::sync::CancellationToken;

pub(crate) enum LoopStep<T> {
    Event(Event<T>),
    Cancelled,
}

/// Waits on the queue and the cancellation token with no implicit priority
/// skew. `tokio::select!`'s default pseudo-random branch polling matches
/// a fair multi-wait.
pub(crate) async fn next_step<T>(
    queue: &mut EventQueue<T>,
    cancel: &CancellationToken,
) -> LoopStep<T> {
    tokio::select! {
        _ = cancel.cancelled() => LoopStep::Cancelled,
        event = queue.recv() => match event {
            Some(event) => LoopStep::Event(event),
            None => LoopStep::Cancelled,
        },
    }
}
