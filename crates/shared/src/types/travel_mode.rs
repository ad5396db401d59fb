use serde::{Deserialize, Serialize};
use std::fmt;

/// Travel mode for inter-slot buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    None,
    Driving,
    Transit,
    Walking,
    Bicycling,
}

impl TravelMode {
    /// Average speed used by the Haversine fallback, km/h.
    pub fn fallback_speed_kmh(&self) -> Option<f64> {
        match self {
            TravelMode::None => None,
            TravelMode::Driving => Some(40.0),
            TravelMode::Transit => Some(30.0),
            TravelMode::Walking => Some(5.0),
            TravelMode::Bicycling => Some(15.0),
        }
    }

    /// Mode string understood by the Distance Matrix API.
    pub fn provider_mode(&self) -> Option<&'static str> {
        match self {
            TravelMode::None => None,
            TravelMode::Driving => Some("driving"),
            TravelMode::Transit => Some("transit"),
            TravelMode::Walking => Some("walking"),
            TravelMode::Bicycling => Some("bicycling"),
        }
    }

    /// Korean label used in travel-slot info and messages.
    pub fn korean(&self) -> &'static str {
        match self {
            TravelMode::None => "없음",
            TravelMode::Driving => "자동차",
            TravelMode::Transit => "대중교통",
            TravelMode::Walking => "도보",
            TravelMode::Bicycling => "자전거",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TravelMode::None => "none",
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TravelMode::Driving).unwrap(), "\"driving\"");
        let mode: TravelMode = serde_json::from_str("\"transit\"").unwrap();
        assert_eq!(mode, TravelMode::Transit);
    }

    #[test]
    fn test_none_has_no_speed_or_provider_mode() {
        assert!(TravelMode::None.fallback_speed_kmh().is_none());
        assert!(TravelMode::None.provider_mode().is_none());
    }
}
