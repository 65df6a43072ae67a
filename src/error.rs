//! Error types for fragment decoding and route computation.

use thiserror::Error;

/// Failures while decoding a URL fragment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FragmentError {
    #[error("malformed fragment: {0}")]
    MalformedFragment(String),
    #[error("invalid waypoint latitude {0}: must be between -90 and 90")]
    InvalidWaypointLatitude(f64),
    #[error("malformed waypoint token: {0:?}")]
    MalformedWaypointToken(String),
}

/// Failures while computing a route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("at least 2 waypoints are required, got {0}")]
    InsufficientWaypoints(usize),
    #[error("route response has no leg geometry")]
    RouteGeometryUnavailable,
    #[error("credential acquisition failed: {0}")]
    CredentialAcquisitionFailure(String),
    #[error("routing provider failed: {0}")]
    RoutingProviderFailure(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_latitude() {
        let err = FragmentError::InvalidWaypointLatitude(91.0);
        assert_eq!(
            err.to_string(),
            "invalid waypoint latitude 91: must be between -90 and 90"
        );
    }

    #[test]
    fn error_display_insufficient_waypoints() {
        let err = RouteError::InsufficientWaypoints(1);
        assert_eq!(err.to_string(), "at least 2 waypoints are required, got 1");
    }

    #[test]
    fn error_display_provider_failure() {
        let err = RouteError::RoutingProviderFailure("NoRoute".into());
        assert_eq!(err.to_string(), "routing provider failed: NoRoute");
    }
}
