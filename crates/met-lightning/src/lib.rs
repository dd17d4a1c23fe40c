//! Met.no lightning strike events.
//!
//! Polls the met.no lightning feed for strikes near a location and keeps a
//! set of geolocated events in step with it:
//! - a strike that appears in the feed becomes a [`LightningEvent`]
//! - a strike that drops out of the feed has its event removed
//!
//! The feed is refreshed every five minutes. A radius of zero or less
//! disables tracking entirely.

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod manager;
pub mod registry;
pub mod runner;
pub mod strike;

pub use api::{radius_to_meters, ApiError, MetLightningClient, StrikeProvider, RADIUS_SCALE};
pub use config::{Config, ConfigError, Coordinates, FetchConfig, LocationConfig};
pub use error::NodeError;
pub use event::{GeolocationEvent, LightningEvent};
pub use manager::{
    async_setup, diff, CycleReport, Diff, LightningEventManager, ManagerHandle,
    DEFAULT_UPDATE_INTERVAL,
};
pub use registry::{EntityRegistrar, EventRegistry};
pub use runner::{run, run_node, setup_logging, NodeArgs};
pub use strike::Strike;
