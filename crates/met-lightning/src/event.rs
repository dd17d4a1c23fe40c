//! Geolocated lightning strike events.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::strike::Strike;

pub const ATTR_EXTERNAL_ID: &str = "external_id";
pub const ATTR_ATTRIBUTION: &str = "attribution";
pub const ATTR_PUBLICATION_DATE: &str = "publication_date";

pub const ATTRIBUTION: &str = "Data provided by Met.no";
pub const DEFAULT_ICON: &str = "mdi:flash";
pub const LENGTH_KILOMETERS: &str = "km";
pub const SOURCE: &str = "met";

/// Provider distance unit (metres) per kilometre.
const METERS_PER_KILOMETER: f64 = 1000.0;

/// What a host presentation layer reads from a geolocated event.
pub trait GeolocationEvent {
    fn name(&self) -> String;
    fn icon(&self) -> &'static str;
    fn source(&self) -> &'static str;
    fn distance(&self) -> f64;
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
    fn unit_of_measurement(&self) -> &'static str;
    fn attributes(&self) -> Map<String, Value>;

    /// Events are pushed by their manager, never polled by the host.
    fn should_poll(&self) -> bool {
        false
    }

    /// Full state as the host would render it.
    fn state(&self) -> Value {
        json!({
            "name": self.name(),
            "icon": self.icon(),
            "source": self.source(),
            "distance": self.distance(),
            "latitude": self.latitude(),
            "longitude": self.longitude(),
            "unit_of_measurement": self.unit_of_measurement(),
            "attributes": self.attributes(),
        })
    }
}

/// Whether the event is currently attached to a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Detached,
    Attached,
}

/// A single lightning strike surfaced as a geolocation event.
///
/// Attributes are fixed at construction; only the host attachment changes.
#[derive(Debug, Clone)]
pub struct LightningEvent {
    distance: f64,
    latitude: f64,
    longitude: f64,
    strike_id: String,
    publication_date: DateTime<Utc>,
    attachment: Attachment,
}

impl LightningEvent {
    pub fn new(
        distance: f64,
        latitude: f64,
        longitude: f64,
        strike_id: impl Into<String>,
        publication_date: DateTime<Utc>,
    ) -> Self {
        Self {
            distance,
            latitude,
            longitude,
            strike_id: strike_id.into(),
            publication_date,
            attachment: Attachment::Detached,
        }
    }

    /// Build an event from a fetched strike, converting its distance to km.
    pub fn from_strike(strike_id: &str, strike: &Strike) -> Self {
        Self::new(
            strike.distance / METERS_PER_KILOMETER,
            strike.lat,
            strike.long,
            strike_id,
            strike.date,
        )
    }

    pub fn strike_id(&self) -> &str {
        &self.strike_id
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    /// Host hook: the event has been added and now listens for its removal.
    pub fn added_to_host(&mut self) {
        self.attachment = Attachment::Attached;
    }

    /// Host hook: removal was requested for this strike.
    ///
    /// Releases the attachment and reports whether the event was attached,
    /// so a repeated removal is a no-op.
    pub fn handle_removal(&mut self) -> bool {
        let was_attached = self.attachment == Attachment::Attached;
        self.attachment = Attachment::Detached;
        was_attached
    }
}

impl GeolocationEvent for LightningEvent {
    fn name(&self) -> String {
        format!("Lightning Strike: {}", self.strike_id)
    }

    fn icon(&self) -> &'static str {
        DEFAULT_ICON
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn distance(&self) -> f64 {
        self.distance
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn unit_of_measurement(&self) -> &'static str {
        LENGTH_KILOMETERS
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert(ATTR_EXTERNAL_ID.to_string(), json!(self.strike_id));
        attributes.insert(ATTR_ATTRIBUTION.to_string(), json!(ATTRIBUTION));
        attributes.insert(
            ATTR_PUBLICATION_DATE.to_string(),
            json!(self
                .publication_date
                .to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        attributes
    }
}
