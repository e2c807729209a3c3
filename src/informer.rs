//! The informer/lister abstraction this core consumes. The watch source
//! itself (whatever actually talks to the authoritative store and decides
//! when to emit a delta) is out of scope; what lives here is the
//! bridge a sync loop consumes: a bounded, typed, single-producer/single-
//! consumer queue of `Event<T>`, plus a one-shot `Lister<T>` for the initial
//! list this core needs at startup (and, for missions, on every edge-cluster
//! reconcile).

use crate::errors::DispatchError;
use crate::model::Event;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One end of a per-kind event queue, owned by a sync loop. The other half
/// (the `mpsc::Sender<Event<T>>`) is handed to the informer adapter that
/// produces events for that kind.
pub struct EventQueue<T> {
    receiver: mpsc::Receiver<Event<T>>,
}

impl<T> EventQueue<T> {
    pub fn new(capacity: usize) -> (mpsc::Sender<Event<T>>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, EventQueue { receiver })
    }

    pub async fn recv(&mut self) -> Option<Event<T>> {
        self.receiver.recv().await
    }
}

/// A one-shot, full-listing view of a resource kind. Used once at startup to
/// prime the `LocationCache` for nodes/pods/edge clusters, and on the hot
/// path by the edge-cluster sync loop to compare cloud-side mission
/// membership against what an edge cluster reports it has received.
#[async_trait]
pub trait Lister<T>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, DispatchError>;
}

/// A `Lister` that always returns an empty listing. Placeholder for when a
/// real informer adapter isn't wired up yet; the standalone binary uses it
/// for every kind until a real transport/watch source is plugged in.
pub struct EmptyLister<T>(std::marker::PhantomData<T>);

impl<T> EmptyLister<T> {
    pub fn new() -> Self {
        EmptyLister(std::marker::PhantomData)
    }
}

impl<T> Default for EmptyLister<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync> Lister<T> for EmptyLister<T> {
    async fn list(&self) -> Result<Vec<T>, DispatchError> {
        Ok(Vec::new())
    }
}
