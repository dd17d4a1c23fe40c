//! Upstream data provider for lightning strikes.
//!
//! [`StrikeProvider`] is the seam the reconciler fetches through, so it can
//! be driven by a fake in tests. [`MetLightningClient`] is the real provider
//! backed by the met.no lightning API.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::strike::{parse_ualf_line, Strike};

// ── Errors ──────────────────────────────────────────────────────────

/// Errors from fetching strike data.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Provider radius units per kilometre.
pub const RADIUS_SCALE: f64 = 100_000_000_000_000.0;

/// Metres per kilometre.
const METERS_PER_KILOMETER: f64 = 1000.0;

/// Convert a radius in provider units (`km * RADIUS_SCALE`) to metres.
pub fn radius_to_meters(radius: f64) -> f64 {
    radius * METERS_PER_KILOMETER / RADIUS_SCALE
}

// ── Provider trait ──────────────────────────────────────────────────

/// Source of strikes around a point.
///
/// `radius` is in provider units: kilometres multiplied by [`RADIUS_SCALE`].
/// Callers scale their local value before calling. Returned distances are
/// in metres.
#[async_trait]
pub trait StrikeProvider: Send + Sync {
    /// Fetch all strikes within `radius` of `(latitude, longitude)`,
    /// keyed by strike identifier.
    async fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> Result<HashMap<String, Strike>>;
}

#[async_trait]
impl<P: StrikeProvider + ?Sized> StrikeProvider for Arc<P> {
    async fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> Result<HashMap<String, Strike>> {
        (**self).within_radius(latitude, longitude, radius).await
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// HTTP client for the met.no lightning feed.
///
/// The feed returns every recent strike in the covered region as UALF text;
/// the radius filter is applied locally.
#[derive(Debug, Clone)]
pub struct MetLightningClient {
    client: reqwest::Client,
    api_url: String,
}

impl MetLightningClient {
    /// Build a client from the fetch settings.
    ///
    /// met.no rejects requests without an identifying `User-Agent`, so one is
    /// always set.
    pub fn new(fetch: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(fetch.user_agent.as_str())
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: fetch.api_url.clone(),
        })
    }

    /// Download the raw UALF body.
    pub async fn fetch_ualf(&self) -> Result<String> {
        let response = self.client.get(&self.api_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl StrikeProvider for MetLightningClient {
    async fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> Result<HashMap<String, Strike>> {
        let body = self.fetch_ualf().await?;
        let radius_m = radius_to_meters(radius);
        let strikes = strikes_within(&body, (latitude, longitude), radius_m);
        log::debug!(
            "met.no returned {} strike(s) within {} m",
            strikes.len(),
            radius_m
        );
        Ok(strikes)
    }
}

/// Parse a UALF body and keep the strikes within `radius_m` metres of `origin`.
///
/// Malformed lines are logged and skipped rather than failing the whole body.
pub fn strikes_within(body: &str, origin: (f64, f64), radius_m: f64) -> HashMap<String, Strike> {
    let mut strikes = HashMap::new();

    for (lineno, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let observation = match parse_ualf_line(line) {
            Ok(obs) => obs,
            Err(e) => {
                log::warn!("Skipping UALF line {}: {}", lineno + 1, e);
                continue;
            }
        };

        let strike_id = observation.strike_id();
        let strike = observation.into_strike(origin);
        if strike.distance <= radius_m {
            strikes.insert(strike_id, strike);
        }
    }

    strikes
}

// ── Tests ───────────────────────────────────────────────────────────
