//! Resource identifiers and the message envelope handed to the message layer.
//!
//! Grounded on the same shape `resource::SupportedResources` and
//! `filestore::ObjectListItem` use elsewhere in this codebase for addressing
//! a k8s-shaped object by `(namespace, name)`, extended here with the
//! destination segment the wire contract requires.

use crate::resources::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const MESSAGE_SOURCE: &str = "edgecontroller";
pub const MESSAGE_GROUP: &str = "resource";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// The event type an informer delivers, generic over the kind's own typed
/// payload. A tagged sum rather than a runtime-typed object: a type
/// assertion failure on the event's object becomes a compile-time
/// impossibility everywhere past the informer boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<T> {
    Added(T),
    Modified(T),
    Deleted(T),
}

impl<T> Event<T> {
    pub fn as_ref(&self) -> Event<&T> {
        match self {
            Event::Added(t) => Event::Added(t),
            Event::Modified(t) => Event::Modified(t),
            Event::Deleted(t) => Event::Deleted(t),
        }
    }

    pub fn object(&self) -> &T {
        match self {
            Event::Added(t) | Event::Modified(t) | Event::Deleted(t) => t,
        }
    }
}

/// Builds the resource path addressing scheme:
/// `<destination>/<namespace>/<kind>/<name>`, with the namespace segment
/// omitted for router-scoped kinds.
pub fn resource_path(destination: &str, namespace: &str, kind: &str, name: &str) -> Result<String, String> {
    if destination.is_empty() {
        return Err(format!("cannot build resource path for {kind}/{name}: empty destination"));
    }
    if name.is_empty() {
        return Err(format!("cannot build resource path for {kind}: empty name"));
    }
    Ok(format!("{destination}/{namespace}/{kind}/{name}"))
}

/// Router-scoped resources (Rule, RuleEndpoint) carry no destination or
/// namespace in their identifier.
pub fn router_scoped_path(kind: &str, name: &str) -> Result<String, String> {
    if name.is_empty() {
        return Err(format!("cannot build resource path for {kind}: empty name"));
    }
    Ok(format!("{kind}/{name}"))
}

/// The mission-list resync path has no name segment, only a trailing slash
/// `<clusterName>/default/missionlist/`.
pub fn mission_list_path(cluster_name: &str) -> Result<String, String> {
    if cluster_name.is_empty() {
        return Err("cannot build missionlist path: empty cluster name".to_string());
    }
    Ok(format!("{cluster_name}/default/missionlist/"))
}

/// The node-delete resource path preserves a literal `namespace` path
/// segment rather than substituting the node's actual namespace.
pub fn node_delete_path(node_name: &str) -> Result<String, String> {
    if node_name.is_empty() {
        return Err("cannot build resource path for node: empty name".to_string());
    }
    Ok(format!("{node_name}/namespace/node/{node_name}"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Router {
    pub source: String,
    pub group: String,
    pub resource: String,
    pub operation: Operation,
}

impl Router {
    pub fn new(resource: String, operation: Operation) -> Self {
        Router {
            source: MESSAGE_SOURCE.to_string(),
            group: MESSAGE_GROUP.to_string(),
            resource,
            operation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub id: String,
    pub parent_id: Option<String>,
    pub resource_version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// An ephemeral, per-event routed envelope. Constructed fresh for every
/// destination a sync loop fans an event out to and handed off by value to
/// the `MessageLayer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub header: Header,
    pub router: Router,
    pub content: ResourceKind,
}

impl Message {
    /// `parent_id` correlates the N envelopes a single fan-out event
    /// produces (one per destination) back to that one logical event; each
    /// envelope still gets its own unique `id`.
    pub fn new(
        resource_path: String,
        operation: Operation,
        resource_version: String,
        parent_id: Option<String>,
        content: ResourceKind,
    ) -> Self {
        Message {
            header: Header {
                id: uuid::Uuid::new_v4().to_string(),
                parent_id,
                resource_version,
                timestamp: chrono::Utc::now(),
            },
            router: Router::new(resource_path, operation),
            content,
        }
    }
}
