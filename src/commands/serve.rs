//! Startup sequence for `dictfleet`
//!
//! validate config → discover bundles → bind front door → launch fleet →
//! start front door → wait for signal → coordinated shutdown.
//! Any startup failure aborts before a single listener serves traffic.

use std::future::Future;
use std::sync::Arc;

use crate::autocomplete::AutocompleteIndex;
use crate::config::Config;
use crate::discovery::{Bundle, BundleRegistry};
use crate::engine::{LookupEngine, ResourceEngine};
use crate::error::Result;
use crate::fleet;
use crate::frontdoor::FrontDoor;
use crate::http;
use crate::lifecycle::{shutdown_signal, LifecycleCoordinator, ShutdownReport};

/// Run until Ctrl+C / SIGTERM
pub async fn serve(config: Config) -> Result<ShutdownReport> {
    serve_until(config, shutdown_signal()).await
}

/// Run until `signal` resolves
pub async fn serve_until<F>(config: Config, signal: F) -> Result<ShutdownReport>
where
    F: Future<Output = ()>,
{
    let coordinator = start(&config).await?;
    Ok(coordinator.run_until(signal).await)
}

/// Bring every listener up and hand them to a coordinator
pub async fn start(config: &Config) -> Result<LifecycleCoordinator> {
    config.validate()?;

    let registry = BundleRegistry::discover(config.dir()?)?;
    config.check_fleet_range(registry.len())?;

    let front_listener = http::bind(config.front_door_addr()).await?;

    let index_path = config.index_path()?;
    let factory = |bundle: Arc<Bundle>, port: u16| -> Result<Arc<dyn LookupEngine>> {
        Ok(Arc::new(
            ResourceEngine::open(bundle, port).hiding(index_path.clone()),
        ))
    };
    let fleet = fleet::launch(&registry, config, &factory).await?;

    let autocomplete = Arc::new(AutocompleteIndex::from_config(config)?);
    let front_door = FrontDoor::new(config, fleet.descriptors(), autocomplete.clone());
    let front_server = front_door.start(front_listener)?;

    tracing::info!(
        dictionaries = fleet.len(),
        ports = ?fleet.ports(),
        "Server is running. Please open: http://{}/",
        front_server.local_addr()
    );

    Ok(LifecycleCoordinator::new(
        fleet,
        front_server,
        autocomplete,
        config.shutdown_timeout(),
    ))
}
