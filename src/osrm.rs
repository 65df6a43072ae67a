//! OSRM HTTP adapter for route calculation.

use serde::Deserialize;
use tracing::warn;

use crate::credentials::Credentials;
use crate::error::RouteError;
use crate::traits::{RouteLeg, RouteProvider, RouteProviderFactory, RouteRequest, RouteResponse};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OsrmConfig {
    #[serde(default = "OsrmConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "OsrmConfig::default_profile")]
    pub profile: String,
    #[serde(default = "OsrmConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            profile: Self::default_profile(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl OsrmConfig {
    fn default_base_url() -> String {
        "http://localhost:5000".to_string()
    }
    fn default_profile() -> String {
        "driving".to_string()
    }
    fn default_timeout_secs() -> u64 {
        10
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    bearer_token: Option<String>,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        Self::with_token(config, None)
    }

    pub fn with_token(config: OsrmConfig, bearer_token: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            bearer_token,
            client,
        })
    }

    fn route_url(&self, request: &RouteRequest) -> String {
        let coords = request
            .positions()
            .iter()
            .map(|[lng, lat]| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");

        let profile = if request.calculator.is_empty() {
            self.config.profile.as_str()
        } else {
            request.calculator.as_str()
        };

        // Steps carry the per-leg geometry; the route overview is not needed.
        let geometry = if request.include_leg_geometry {
            "&steps=true&geometries=geojson"
        } else {
            ""
        };

        format!(
            "{}/route/v1/{}/{}?overview=false&continue_straight=true{}",
            self.config.base_url.trim_end_matches('/'),
            profile,
            coords,
            geometry
        )
    }
}

impl RouteProvider for OsrmClient {
    fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse, RouteError> {
        let mut builder = self.client.get(self.route_url(request));
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        // Error codes (NoRoute, InvalidQuery) arrive as JSON on 4xx responses.
        let response = builder
            .send()
            .map_err(|err| RouteError::RoutingProviderFailure(format!("request failed: {err}")))?;
        let status = response.status();
        let body = response.json::<OsrmRouteResponse>().map_err(|err| {
            RouteError::RoutingProviderFailure(format!("unreadable response ({status}): {err}"))
        })?;

        if body.code != "Ok" {
            let message = body.message.unwrap_or_default();
            warn!(code = %body.code, %message, "OSRM rejected route request");
            return Err(RouteError::RoutingProviderFailure(format!("{}: {}", body.code, message)));
        }

        let Some(route) = body.routes.into_iter().next() else {
            return Err(RouteError::RoutingProviderFailure("no route returned".into()));
        };

        let legs = route
            .legs
            .into_iter()
            .map(|leg| RouteLeg {
                geometry: leg_geometry(leg.steps),
            })
            .collect();

        Ok(RouteResponse {
            legs,
            distance: Some(route.distance),
            duration_seconds: Some(route.duration),
        })
    }
}

/// Builds OSRM clients carrying the current credential as a bearer token.
#[derive(Debug, Clone, Default)]
pub struct OsrmFactory {
    config: OsrmConfig,
}

impl OsrmFactory {
    pub fn new(config: OsrmConfig) -> Self {
        Self { config }
    }
}

impl RouteProviderFactory for OsrmFactory {
    type Provider = OsrmClient;

    fn build(&self, _region: &str, credentials: &Credentials) -> Result<OsrmClient, RouteError> {
        let token = credentials.bearer_token().map(str::to_string);
        Ok(OsrmClient::with_token(self.config.clone(), token)?)
    }
}

/// Concatenates step geometries, dropping the point shared by consecutive
/// steps. `None` when the leg carries no steps.
fn leg_geometry(steps: Vec<OsrmStep>) -> Option<Vec<[f64; 2]>> {
    if steps.is_empty() {
        return None;
    }

    let mut points: Vec<[f64; 2]> = Vec::new();
    for step in steps {
        for point in step.geometry.coordinates {
            if points.last() != Some(&point) {
                points.push(point);
            }
        }
    }
    Some(points)
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}
