//! The opaque outbound sink. Isolates the core from the transport's failure
//! modes, the same role `deps::SshManager` plays for remote host
//! connections elsewhere in this codebase.

use crate::errors::DispatchError;
use crate::model::Message;
use async_trait::async_trait;
use log::error;
use tokio::sync::mpsc;

#[async_trait]
pub trait MessageLayer: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), DispatchError>;
}

/// Sends a message and swallows a transport failure after logging it with
/// operation and resource.
pub async fn send_best_effort(layer: &dyn MessageLayer, message: Message) {
    let resource = message.router.resource.clone();
    let operation = message.router.operation;
    if let Err(e) = layer.send(message).await {
        error!("failed to send {operation} message for {resource}: {e}");
    }
}

/// A message layer backed by a bounded channel. Tests read the receiving
/// half to assert on exactly what was emitted.
pub struct ChannelMessageLayer {
    sender: mpsc::Sender<Message>,
}

impl ChannelMessageLayer {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (ChannelMessageLayer { sender }, receiver)
    }
}

#[async_trait]
impl MessageLayer for ChannelMessageLayer {
    async fn send(&self, message: Message) -> Result<(), DispatchError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| DispatchError::String(format!("message channel closed: {e}")))
    }
}

/// A message layer that just logs every envelope at info level and never
/// fails. What the standalone binary wires up in the absence of a real
/// transport adapter.
pub struct LoggingMessageLayer;

#[async_trait]
impl MessageLayer for LoggingMessageLayer {
    async fn send(&self, message: Message) -> Result<(), DispatchError> {
        log::info!(
            "{} {} -> {:?}",
            message.router.operation,
            message.router.resource,
            message.content
        );
        Ok(())
    }
}
