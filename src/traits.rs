//! Seams between the routing core and its external collaborators.
//!
//! The core never talks to a network or an identity service directly;
//! hosts plug those in by implementing the traits below.

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::RouteError;
use crate::waypoint::Waypoint;

/// Travel mode requested from the routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Driving,
}

/// A single route calculation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// Calculator (or profile) identity configured for the session.
    pub calculator: String,
    /// Departure position (lng, lat).
    pub departure: [f64; 2],
    /// Destination position (lng, lat).
    pub destination: [f64; 2],
    /// Ordered interior positions. `None` when only departure and
    /// destination were placed.
    pub intermediate_waypoints: Option<Vec<[f64; 2]>>,
    pub travel_mode: TravelMode,
    pub include_leg_geometry: bool,
}

impl RouteRequest {
    /// Builds a driving request from an ordered waypoint list.
    ///
    /// Returns `InsufficientWaypoints` for fewer than two points.
    pub fn driving(calculator: &str, waypoints: &[Waypoint]) -> Result<Self, RouteError> {
        let (first, last) = match waypoints {
            [first, .., last] => (first, last),
            _ => return Err(RouteError::InsufficientWaypoints(waypoints.len())),
        };

        let intermediate_waypoints = if waypoints.len() > 2 {
            Some(
                waypoints[1..waypoints.len() - 1]
                    .iter()
                    .map(Waypoint::to_array)
                    .collect(),
            )
        } else {
            None
        };

        Ok(Self {
            calculator: calculator.to_string(),
            departure: first.to_array(),
            destination: last.to_array(),
            intermediate_waypoints,
            travel_mode: TravelMode::Driving,
            include_leg_geometry: true,
        })
    }

    /// All positions in travel order.
    pub fn positions(&self) -> Vec<[f64; 2]> {
        let mut positions = vec![self.departure];
        if let Some(interior) = &self.intermediate_waypoints {
            positions.extend(interior.iter().copied());
        }
        positions.push(self.destination);
        positions
    }
}

/// One provider-returned leg.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteLeg {
    /// Ordered (lng, lat) points, absent if the provider did not return them.
    pub geometry: Option<Vec<[f64; 2]>>,
}

/// Provider response for a [`RouteRequest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteResponse {
    pub legs: Vec<RouteLeg>,
    /// Total distance as reported by the provider.
    pub distance: Option<f64>,
    pub duration_seconds: Option<f64>,
}

/// Computes driving routes.
pub trait RouteProvider {
    fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse, RouteError>;
}

/// Builds an authorized [`RouteProvider`] for a region.
///
/// Called again whenever the credential identity changes.
pub trait RouteProviderFactory {
    type Provider: RouteProvider;

    fn build(&self, region: &str, credentials: &Credentials) -> Result<Self::Provider, RouteError>;
}

/// Supplies authorization credentials for routing calls.
pub trait CredentialProvider {
    fn credentials(&mut self) -> Result<Credentials, RouteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(lng: f64, lat: f64) -> Waypoint {
        Waypoint::new(lng, lat).unwrap()
    }

    #[test]
    fn test_two_waypoints_have_no_intermediates() {
        let request = RouteRequest::driving("calc", &[wp(1.0, 2.0), wp(3.0, 4.0)]).unwrap();
        assert_eq!(request.departure, [1.0, 2.0]);
        assert_eq!(request.destination, [3.0, 4.0]);
        assert!(request.intermediate_waypoints.is_none());
        assert_eq!(request.travel_mode, TravelMode::Driving);
        assert!(request.include_leg_geometry);
    }

    #[test]
    fn test_interior_points_keep_click_order() {
        let points = [wp(0.0, 0.0), wp(1.0, 1.0), wp(2.0, 2.0), wp(3.0, 3.0)];
        let request = RouteRequest::driving("calc", &points).unwrap();
        assert_eq!(
            request.intermediate_waypoints,
            Some(vec![[1.0, 1.0], [2.0, 2.0]])
        );
        assert_eq!(request.positions().len(), 4);
    }

    #[test]
    fn test_single_waypoint_is_insufficient() {
        let err = RouteRequest::driving("calc", &[wp(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, RouteError::InsufficientWaypoints(1)));
    }
}
