//! Thin `clap` entrypoint wrapping `Controller::start`/`shutdown`, in the
//! same `Args`-struct-plus-`Deps`-trait shape `refresh::RefreshArgs`/
//! `logs::LogArgs` use elsewhere in this codebase.
//! Wiring real listers and a real message transport is the excluded
//! informer-adapter/transport subsystem; `RunDeps` is where that
//! wiring plugs in.

use crate::config::DispatchConfig;
use crate::controller::{Controller, EventSenders, Listers};
use crate::errors::DispatchError;
use crate::message_layer::MessageLayer;
use clap::Args;
use log::info;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(
        long,
        long_help = "Label key that marks a node as edge-role.",
        default_value = "skate.io/role"
    )]
    pub edge_role_label_key: String,
    #[arg(
        long,
        long_help = "Label value that marks a node as edge-role.",
        default_value = "edge"
    )]
    pub edge_role_label_value: String,
    #[arg(
        long,
        long_help = "Capacity of each per-kind event queue.",
        default_value_t = crate::config::DEFAULT_QUEUE_CAPACITY
    )]
    pub queue_capacity: usize,
}

impl From<RunArgs> for DispatchConfig {
    fn from(args: RunArgs) -> Self {
        DispatchConfig {
            edge_role_label_key: args.edge_role_label_key,
            edge_role_label_value: args.edge_role_label_value,
            queue_capacity: args.queue_capacity,
        }
    }
}

/// Supplies the collaborators this crate never constructs itself: the
/// startup listers and the outbound message transport.
pub trait RunDeps: Send + Sync {
    fn listers(&self) -> Listers;
    fn message_layer(&self) -> Arc<dyn MessageLayer>;
}

/// Starts the controller, waits for a shutdown signal, then drains every
/// sync loop cleanly. What feeds events into the returned `EventSenders` is
/// the informer adapter's job, not this function's.
pub async fn run<D: RunDeps>(args: RunArgs, deps: D) -> Result<(), DispatchError> {
    let config: DispatchConfig = args.into();
    let (controller, senders) =
        Controller::start(config, deps.listers(), deps.message_layer()).await?;

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");

    drop_senders(senders);
    controller.shutdown().await;
    Ok(())
}

fn drop_senders(senders: EventSenders) {
    drop(senders);
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = term.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
