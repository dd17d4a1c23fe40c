//! Polling and reconciliation of lightning events.
//!
//! On every cycle the manager fetches the strikes around its origin, diffs
//! their identifiers against the set it already manages, asks the registrar
//! to remove events that dropped out of the feed and registers new events in
//! one batch. The managed set is replaced only after a successful fetch.

use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::{ApiError, StrikeProvider, RADIUS_SCALE};
use crate::config::Config;
use crate::event::LightningEvent;
use crate::registry::EntityRegistrar;
use crate::strike::Strike;

/// Time between two reconciliation cycles.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Identifiers to remove and to create for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub to_remove: HashSet<String>,
    pub to_create: HashSet<String>,
}

/// Compare the managed identifiers against a freshly fetched set.
pub fn diff(known: &HashSet<String>, fetched: &HashSet<String>) -> Diff {
    Diff {
        to_remove: known.difference(fetched).cloned().collect(),
        to_create: fetched.difference(known).cloned().collect(),
    }
}

/// Outcome of a successful cycle. Identifiers are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub created: Vec<String>,
    pub removed: Vec<String>,
}

impl CycleReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

fn sorted(ids: HashSet<String>) -> Vec<String> {
    let mut ids: Vec<String> = ids.into_iter().collect();
    ids.sort();
    ids
}

/// Keeps the registrar's events in line with the provider's feed.
pub struct LightningEventManager<P, R> {
    provider: P,
    registrar: R,
    latitude: f64,
    longitude: f64,
    radius: f64,
    managed_strike_ids: HashSet<String>,
    strikes: HashMap<String, Strike>,
}

impl<P: StrikeProvider, R: EntityRegistrar> LightningEventManager<P, R> {
    /// Create a manager with nothing fetched and nothing managed yet.
    pub fn new(provider: P, registrar: R, latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            provider,
            registrar,
            latitude,
            longitude,
            radius,
            managed_strike_ids: HashSet::new(),
            strikes: HashMap::new(),
        }
    }

    pub fn managed_strike_ids(&self) -> &HashSet<String> {
        &self.managed_strike_ids
    }

    /// Strikes from the last successful fetch.
    pub fn strikes(&self) -> &HashMap<String, Strike> {
        &self.strikes
    }

    /// Run one fetch-and-reconcile cycle.
    ///
    /// A failed fetch returns before anything is removed, created or
    /// replaced.
    pub async fn update(&mut self) -> Result<CycleReport, ApiError> {
        log::debug!("Refreshing Met lightning data");
        let strikes = self
            .provider
            .within_radius(self.latitude, self.longitude, self.radius * RADIUS_SCALE)
            .await?;

        let new_strike_ids: HashSet<String> = strikes.keys().cloned().collect();
        let Diff {
            to_remove,
            to_create,
        } = diff(&self.managed_strike_ids, &new_strike_ids);
        self.strikes = strikes;

        // Removal signals go out before the managed set is replaced.
        self.remove_events(&to_remove);
        self.create_events(&to_create);

        self.managed_strike_ids = new_strike_ids;

        Ok(CycleReport {
            created: sorted(to_create),
            removed: sorted(to_remove),
        })
    }

    fn remove_events(&self, ids_to_remove: &HashSet<String>) {
        log::debug!("Going to remove {:?}", ids_to_remove);
        for strike_id in ids_to_remove {
            self.registrar.request_removal(strike_id);
        }
    }

    fn create_events(&self, ids_to_create: &HashSet<String>) {
        log::debug!("Going to create {:?}", ids_to_create);
        let events: Vec<LightningEvent> = ids_to_create
            .iter()
            .filter_map(|id| {
                self.strikes
                    .get(id)
                    .map(|strike| LightningEvent::from_strike(id, strike))
            })
            .collect();

        self.registrar.register_batch(events);
    }

    fn log_cycle(&self, result: Result<CycleReport, ApiError>) {
        match result {
            Ok(report) if report.is_noop() => {
                log::debug!("No change, {} strike(s) tracked", self.managed_strike_ids.len())
            }
            Ok(report) => log::info!(
                "Lightning update: {} new, {} removed, {} tracked",
                report.created.len(),
                report.removed.len(),
                self.managed_strike_ids.len()
            ),
            Err(e) => log::error!("Failed to refresh lightning data: {}", e),
        }
    }
}

impl<P, R> LightningEventManager<P, R>
where
    P: StrikeProvider + 'static,
    R: EntityRegistrar + 'static,
{
    /// Run one cycle now, then keep reconciling every `interval`.
    ///
    /// The returned handle owns the polling task. Cycles never overlap:
    /// ticks that fall due while a cycle is still running are skipped.
    pub async fn start(mut self, interval: Duration) -> ManagerHandle {
        let first = self.update().await;
        self.log_cycle(first);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                // An in-flight fetch is dropped on shutdown, before it can
                // touch any state.
                let result = tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    result = self.update() => result,
                };
                self.log_cycle(result);
            }

            log::info!("Lightning event manager stopped");
        });

        ManagerHandle { shutdown_tx, task }
    }
}

/// Handle to a running manager. Dropping it also stops the polling task.
#[derive(Debug)]
pub struct ManagerHandle {
    shutdown_tx: watch::Sender<()>,
    task: JoinHandle<()>,
}

impl ManagerHandle {
    /// Stop polling and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            log::error!("Lightning event manager task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Set up lightning events for a configuration.
///
/// Returns `None`, without constructing a manager or fetching anything, when
/// the configured radius disables the feature.
pub async fn async_setup<P, R>(config: &Config, provider: P, registrar: R) -> Option<ManagerHandle>
where
    P: StrikeProvider + 'static,
    R: EntityRegistrar + 'static,
{
    if !config.is_enabled() {
        log::debug!("Radius is {}, lightning events disabled", config.radius);
        return None;
    }

    let origin = config.origin();
    log::info!(
        "Tracking lightning within {} km of ({:.4}, {:.4})",
        config.radius,
        origin.latitude,
        origin.longitude
    );

    let manager = LightningEventManager::new(
        provider,
        registrar,
        origin.latitude,
        origin.longitude,
        config.radius,
    );
    Some(manager.start(DEFAULT_UPDATE_INTERVAL).await)
}
