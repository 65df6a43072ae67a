//! Route computation through an external routing provider.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::credentials::CredentialCache;
use crate::error::RouteError;
use crate::fragment::encode_waypoints;
use crate::polyline::{BoundingBox, MultiLine, Polyline};
use crate::traits::{CredentialProvider, RouteProvider, RouteProviderFactory, RouteRequest, RouteResponse};
use crate::waypoint::Waypoint;

/// A computed route, replaced wholesale on every successful call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub distance: f64,
    pub duration_seconds: f64,
    pub path: MultiLine,
    pub bbox: BoundingBox,
    /// `route=` payload for the input waypoints.
    pub compact_waypoints: String,
}

impl RouteResult {
    /// Normalizes a provider response for the given input waypoints.
    pub fn from_response(response: RouteResponse, waypoints: &[Waypoint]) -> Result<Self, RouteError> {
        if response.legs.is_empty() {
            return Err(RouteError::RouteGeometryUnavailable);
        }

        let lines = response
            .legs
            .into_iter()
            .map(|leg| leg.geometry.filter(|points| !points.is_empty()).map(Polyline::new))
            .collect::<Option<Vec<_>>>()
            .ok_or(RouteError::RouteGeometryUnavailable)?;

        let path = MultiLine::merge(lines);
        let bbox = path.bounding_box();

        Ok(Self {
            distance: response.distance.unwrap_or(0.0),
            duration_seconds: response.duration_seconds.unwrap_or(0.0),
            path,
            bbox,
            compact_waypoints: encode_waypoints(waypoints),
        })
    }
}

struct ConnectedProvider<T> {
    access_key_id: String,
    region: String,
    provider: T,
}

/// Computes routes with cached credentials and a lazily built provider.
pub struct RouteServiceClient<F: RouteProviderFactory, C> {
    factory: F,
    credentials: CredentialCache<C>,
    connected: Option<ConnectedProvider<F::Provider>>,
}

impl<F, C> RouteServiceClient<F, C>
where
    F: RouteProviderFactory,
    C: CredentialProvider,
{
    pub fn new(factory: F, credentials: CredentialCache<C>) -> Self {
        Self {
            factory,
            credentials,
            connected: None,
        }
    }

    /// Routes through `waypoints` in order.
    pub fn compute_route(
        &mut self,
        waypoints: &[Waypoint],
        region: &str,
        calculator: &str,
    ) -> Result<RouteResult, RouteError> {
        let request = RouteRequest::driving(calculator, waypoints)?;
        debug!(
            waypoints = waypoints.len(),
            intermediate = request.intermediate_waypoints.as_ref().map_or(0, Vec::len),
            calculator,
            "calculating route"
        );

        let response = self.provider(region)?.calculate_route(&request)?;
        let result = RouteResult::from_response(response, waypoints)?;
        info!(
            distance = result.distance,
            duration_seconds = result.duration_seconds,
            lines = result.path.lines().len(),
            "route calculated"
        );
        Ok(result)
    }

    /// Whether a provider handle has been built.
    pub fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    fn provider(&mut self, region: &str) -> Result<&F::Provider, RouteError> {
        let credentials = self.credentials.get(Utc::now())?;

        let stale = match &self.connected {
            Some(connected) => {
                connected.access_key_id != credentials.access_key_id || connected.region != region
            }
            None => true,
        };

        if stale {
            debug!(region, "building routing provider");
            let provider = self.factory.build(region, credentials)?;
            self.connected = Some(ConnectedProvider {
                access_key_id: credentials.access_key_id.clone(),
                region: region.to_string(),
                provider,
            });
        }

        self.connected
            .as_ref()
            .map(|connected| &connected.provider)
            .ok_or_else(|| RouteError::RoutingProviderFailure("provider not connected".into()))
    }
}
