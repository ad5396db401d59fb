use serde::{Deserialize, Serialize};

use super::time::round_up_to_step;
use super::travel_mode::TravelMode;

/// Geographic coordinates (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create new coordinates with validation
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Create coordinates without validation (use when data is trusted)
    pub fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Calculate the Haversine distance to another point in kilometers
    /// This is a great-circle distance approximation
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Estimate travel time in minutes for the given mode, great-circle
    /// distance over the mode's average speed, rounded up to the slot
    /// granularity. Identical points always yield 0.
    pub fn estimate_travel_minutes(&self, other: &Coordinates, mode: TravelMode) -> i32 {
        if self == other {
            return 0;
        }
        let Some(speed_kmh) = mode.fallback_speed_kmh() else {
            return 0;
        };

        let distance_km = self.distance_km(other);
        if distance_km <= 0.0 {
            return 0;
        }

        let minutes = (distance_km / speed_kmh * 60.0).ceil() as i32;
        round_up_to_step(minutes, super::time::SLOT_GRANULARITY_MINUTES)
    }

    /// Format as "lat,lng" string (useful for API calls)
    pub fn to_lat_lng_string(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Coordinates rounded to 4 decimal places, as integers. Cache key
    /// component: points within ~11 m share an entry.
    pub fn rounded4(&self) -> (i64, i64) {
        (
            (self.latitude * 10_000.0).round() as i64,
            (self.longitude * 10_000.0).round() as i64,
        )
    }
}

/// Error for invalid coordinates
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoordinatesError {
    #[error("Invalid latitude: {0}. Must be between -90 and 90")]
    InvalidLatitude(f64),
    #[error("Invalid longitude: {0}. Must be between -180 and 180")]
    InvalidLongitude(f64),
}
