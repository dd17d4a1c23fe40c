//! Strike records and the UALF line format served by the met.no lightning API.
//!
//! Each line of a UALF (Universal ASCII Lightning Format) body describes one
//! located discharge as 25 whitespace-separated fields:
//!
//! ```text
//! version year month day hour minute second nanosecond latitude longitude
//! peak_current multiplicity sensors dof ellipse_angle semi_major semi_minor
//! chi_square rise_time peak_to_zero max_rate_of_rise cloud angle signal timing
//! ```

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;

/// Number of fields on a well-formed UALF line.
const UALF_FIELD_COUNT: usize = 25;

/// Mean earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// One strike as reported by the provider for a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Strike {
    pub lat: f64,
    pub long: f64,
    /// Distance from the search origin, in provider units (metres).
    pub distance: f64,
    pub date: DateTime<Utc>,
}

/// A parsed UALF line, before it has been placed relative to an origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    /// Stable identifier for this observation.
    ///
    /// Two lines describing the same discharge always map to the same id.
    pub fn strike_id(&self) -> String {
        format!(
            "{}_{:.4}_{:.4}",
            self.timestamp.timestamp_millis(),
            self.latitude,
            self.longitude
        )
    }

    /// Turn the observation into a [`Strike`] measured from `origin`.
    pub fn into_strike(self, origin: (f64, f64)) -> Strike {
        let distance = haversine_m(origin, (self.latitude, self.longitude));
        Strike {
            lat: self.latitude,
            long: self.longitude,
            distance,
            date: self.timestamp,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected 25 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid value '{value}' in field {index}")]
    InvalidField { index: usize, value: String },

    #[error("invalid timestamp")]
    InvalidTimestamp,

    #[error("coordinates out of range: ({0}, {1})")]
    OutOfRange(f64, f64),
}

fn field<T: std::str::FromStr>(fields: &[&str], index: usize) -> Result<T, ParseError> {
    fields[index]
        .parse()
        .map_err(|_| ParseError::InvalidField {
            index,
            value: fields[index].to_string(),
        })
}

/// Parse a single UALF line.
pub fn parse_ualf_line(line: &str) -> Result<Observation, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != UALF_FIELD_COUNT {
        return Err(ParseError::FieldCount(fields.len()));
    }

    let year: i32 = field(&fields, 1)?;
    let month: u32 = field(&fields, 2)?;
    let day: u32 = field(&fields, 3)?;
    let hour: u32 = field(&fields, 4)?;
    let minute: u32 = field(&fields, 5)?;
    let second: u32 = field(&fields, 6)?;
    let nanos: u32 = field(&fields, 7)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or(ParseError::InvalidTimestamp)?;

    let latitude: f64 = field(&fields, 8)?;
    let longitude: f64 = field(&fields, 9)?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(ParseError::OutOfRange(latitude, longitude));
    }

    Ok(Observation {
        latitude,
        longitude,
        timestamp: Utc.from_utc_datetime(&naive),
    })
}

/// Great-circle distance between two `(lat, lon)` points, in metres.
pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
