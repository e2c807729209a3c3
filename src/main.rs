use clap::{Parser, Subcommand};
use edgecontroller::cli::{self, RunArgs, RunDeps};
use edgecontroller::controller::Listers;
use edgecontroller::errors::DispatchError;
use edgecontroller::informer::EmptyLister;
use edgecontroller::message_layer::{LoggingMessageLayer, MessageLayer};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "edgecontroller")]
#[command(about = "Downstream dispatch core for the edge-cluster control plane", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        long_help = "Increase verbosity. Use multiple times, up to -vvv. Levels are 'info', 'debug', and 'trace'. Default is 'off'.",
    )]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(long_about = "Start the dispatch core: prime the location cache and run all sync loops")]
    Run(RunArgs),
}

/// Wires the dispatch core up with no real informer adapter or transport:
/// every lister reports an empty world and outbound messages are just
/// logged. A real deployment swaps this struct out for one backed by actual
/// watch sources and a message bus client.
struct StandaloneDeps;

impl RunDeps for StandaloneDeps {
    fn listers(&self) -> Listers {
        Listers {
            nodes: Arc::new(EmptyLister::new()),
            pods: Arc::new(EmptyLister::new()),
            edge_clusters: Arc::new(EmptyLister::new()),
            missions: Arc::new(EmptyLister::new()),
        }
    }

    fn message_layer(&self) -> Arc<dyn MessageLayer> {
        Arc::new(LoggingMessageLayer)
    }
}

fn count_to_log_level(count: u8) -> log::LevelFilter {
    match count {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<(), DispatchError> {
    let args = Cli::parse();

    env_logger::builder()
        .filter_module("edgecontroller", count_to_log_level(args.verbose))
        .format_target(false)
        .format_timestamp(None)
        .init();

    match args.command {
        Commands::Run(run_args) => cli::run(run_args, StandaloneDeps).await,
    }
}
