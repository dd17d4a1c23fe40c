//! Node entry point: CLI arguments, logging and the run-until-shutdown loop.

use argh::FromArgs;
use std::sync::Arc;
use tokio::sync::watch;

use crate::api::MetLightningClient;
use crate::config::Config;
use crate::error::NodeError;
use crate::manager::async_setup;
use crate::registry::EventRegistry;

/// Met.no lightning strike events near a location
#[derive(FromArgs, Debug)]
pub struct NodeArgs {
    /// path to the YAML configuration file (optional, uses defaults)
    #[argh(option, short = 'c')]
    pub config: Option<String>,
}

/// Initialize logging with env_logger.
///
/// Respects RUST_LOG environment variable. Defaults to "info" level.
pub fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Track lightning for `config` until `shutdown` fires.
///
/// Returns the registry holding whatever events were live at shutdown.
/// When the radius disables the feature this returns immediately.
pub async fn run(
    config: Config,
    mut shutdown: watch::Receiver<()>,
) -> Result<Arc<EventRegistry>, NodeError> {
    let registry = Arc::new(EventRegistry::new());

    if !config.is_enabled() {
        log::info!("Radius is {}, nothing to track", config.radius);
        return Ok(registry);
    }

    let client = MetLightningClient::new(&config.fetch)?;
    let Some(handle) = async_setup(&config, client, Arc::clone(&registry)).await else {
        return Ok(registry);
    };

    let _ = shutdown.changed().await;
    log::info!("Stopping, {} event(s) live", registry.len());
    handle.shutdown().await;

    Ok(registry)
}

/// Run the node with CLI handling and Ctrl+C shutdown.
pub async fn run_node() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let args: NodeArgs = argh::from_env();
    log::info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load_or_default(args.config.as_deref()).map_err(NodeError::from)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    })
    .map_err(NodeError::from)?;

    log::info!("Node running. Press Ctrl+C to stop.");
    run(config, shutdown_rx).await?;

    log::info!("Node stopped");
    Ok(())
}
