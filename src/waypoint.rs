//! Waypoints and viewport snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FragmentError;

/// A user-placed point. Latitude is always within [-90, 90].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waypoint {
    lng: f64,
    lat: f64,
}

impl Waypoint {
    pub fn new(lng: f64, lat: f64) -> Result<Self, FragmentError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(FragmentError::InvalidWaypointLatitude(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Parses the textual `lng`/`lat` pair of an encoded waypoint token.
    pub fn parse(lng: &str, lat: &str) -> Result<Self, FragmentError> {
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| FragmentError::MalformedWaypointToken(format!("{lng},{lat}")))
        };
        Self::new(parse(lng)?, parse(lat)?)
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// (lng, lat) pair as sent to the routing provider.
    pub fn to_array(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl<'de> Deserialize<'de> for Waypoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            lng: f64,
            lat: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Waypoint::new(raw.lng, raw.lat).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LngLat({}, {})", self.lng, self.lat)
    }
}

/// Snapshot of the map camera at the end of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub zoom: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub pitch: f64,
}

impl Default for ViewportState {
    /// Downtown Vancouver at city zoom.
    fn default() -> Self {
        Self {
            zoom: 11.0,
            latitude: 49.2819,
            longitude: -123.1187,
            bearing: 0.0,
            pitch: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_bounds_inclusive() {
        assert!(Waypoint::new(10.0, 90.0).is_ok());
        assert!(Waypoint::new(10.0, -90.0).is_ok());
    }

    #[test]
    fn test_latitude_out_of_range() {
        assert_eq!(
            Waypoint::new(10.0, 91.0),
            Err(FragmentError::InvalidWaypointLatitude(91.0))
        );
        assert_eq!(
            Waypoint::new(10.0, -91.0),
            Err(FragmentError::InvalidWaypointLatitude(-91.0))
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let err = Waypoint::parse("abc", "49.2").unwrap_err();
        assert!(matches!(err, FragmentError::MalformedWaypointToken(_)));
    }

    #[test]
    fn test_deserialize_validates_latitude() {
        let ok: Waypoint = serde_json::from_str(r#"{"lng": -123.0, "lat": 49.0}"#).unwrap();
        assert_eq!(ok.to_array(), [-123.0, 49.0]);
        let bad = serde_json::from_str::<Waypoint>(r#"{"lng": 0.0, "lat": 95.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_display() {
        let waypoint = Waypoint::new(1.5, 2.5).unwrap();
        assert_eq!(waypoint.to_string(), "LngLat(1.5, 2.5)");
    }
}
