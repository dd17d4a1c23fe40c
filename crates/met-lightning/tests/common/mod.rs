//! Test doubles for the provider and the host registrar

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use met_lightning::api;
use met_lightning::{ApiError, EntityRegistrar, EventRegistry, LightningEvent, Strike, StrikeProvider};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn publication_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, 17, 14, 3, 21).unwrap()
}

/// Build a provider response from `(id, distance in metres)` pairs.
pub fn strikes(items: &[(&str, f64)]) -> HashMap<String, Strike> {
    items
        .iter()
        .map(|(id, distance)| {
            (
                id.to_string(),
                Strike {
                    lat: 59.9,
                    long: 10.7,
                    distance: *distance,
                    date: publication_date(),
                },
            )
        })
        .collect()
}

pub fn fetch_error() -> api::Result<HashMap<String, Strike>> {
    Err(ApiError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    })
}

/// Provider that replays scripted responses.
///
/// Once the script is exhausted it keeps returning the last successful
/// response, like a feed that stopped changing.
pub struct FakeProvider {
    script: Mutex<VecDeque<api::Result<HashMap<String, Strike>>>>,
    last_ok: Mutex<HashMap<String, Strike>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<(f64, f64, f64)>>,
}

impl FakeProvider {
    pub fn new(script: Vec<api::Result<HashMap<String, Strike>>>) -> Self {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Vec<api::Result<HashMap<String, Strike>>>, delay: Duration) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last_ok: Mutex::new(HashMap::new()),
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// `(latitude, longitude, radius)` of every request so far.
    pub fn requests(&self) -> Vec<(f64, f64, f64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StrikeProvider for FakeProvider {
    async fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> api::Result<HashMap<String, Strike>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((latitude, longitude, radius));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(strikes)) => {
                *self.last_ok.lock().unwrap() = strikes.clone();
                Ok(strikes)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last_ok.lock().unwrap().clone()),
        }
    }
}

/// Registrar that records every call and forwards to a real registry.
#[derive(Default)]
pub struct RecordingRegistrar {
    pub registry: EventRegistry,
    batches: Mutex<Vec<Vec<String>>>,
    removals: Mutex<Vec<String>>,
}

impl RecordingRegistrar {
    /// Identifiers of each registered batch, sorted within the batch.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<String> {
        self.removals.lock().unwrap().clone()
    }
}

impl EntityRegistrar for RecordingRegistrar {
    fn register_batch(&self, events: Vec<LightningEvent>) {
        let mut ids: Vec<String> = events.iter().map(|e| e.strike_id().to_string()).collect();
        ids.sort();
        self.batches.lock().unwrap().push(ids);
        self.registry.register_batch(events);
    }

    fn request_removal(&self, strike_id: &str) {
        self.removals.lock().unwrap().push(strike_id.to_string());
        self.registry.request_removal(strike_id);
    }
}
