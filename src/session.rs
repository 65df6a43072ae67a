//! Session state kept in sync with the URL fragment.
//!
//! A session owns the current fragment, the last settled viewport, the
//! debounced waypoint buffer and the last computed route. Hosts feed it map
//! events and a clock, and write [`Session::fragment`] back to the page URL
//! after every event.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::debounce::WaypointBuffer;
use crate::error::{FragmentError, RouteError};
use crate::fragment::{decode_viewport, decode_waypoints, encode_fragment, route_segment};
use crate::polyline::BoundingBox;
use crate::route::{RouteResult, RouteServiceClient};
use crate::traits::{CredentialProvider, RouteProviderFactory};
use crate::waypoint::{ViewportState, Waypoint};

/// Padding, in pixels, applied on every side when framing a route.
pub const FIT_PADDING: u32 = 50;

/// Command for the map widget to frame a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct FitBounds {
    pub bbox: BoundingBox,
    pub padding: u32,
    pub speed: f64,
    pub linear: bool,
}

impl FitBounds {
    /// `None` for bounds that cannot be framed (empty geometry).
    pub fn new(bbox: BoundingBox) -> Option<Self> {
        bbox.is_finite().then_some(Self {
            bbox,
            padding: FIT_PADDING,
            speed: 0.8,
            linear: false,
        })
    }
}

#[derive(Debug)]
pub struct Session {
    fragment: String,
    viewport: ViewportState,
    waypoints: WaypointBuffer,
    route: Option<RouteResult>,
}

impl Session {
    /// Restores a session from an existing fragment, or starts a fresh one
    /// at `default_viewport`.
    ///
    /// Waypoints are decoded once, here. A fragment that fails to decode is
    /// replaced by the default one.
    pub fn bootstrap(
        existing: Option<&str>,
        default_viewport: ViewportState,
        window: Duration,
    ) -> Self {
        let restored = existing
            .filter(|fragment| !fragment.is_empty() && *fragment != "#")
            .map(|fragment| {
                let viewport = decode_viewport(fragment)?;
                let waypoints = decode_waypoints(fragment)?;
                Ok::<_, FragmentError>((fragment.to_string(), viewport, waypoints))
            });

        let (fragment, viewport, waypoints) = match restored {
            Some(Ok(state)) => {
                debug!(waypoints = state.2.len(), "restored session from fragment");
                state
            }
            Some(Err(err)) => {
                warn!(%err, "ignoring malformed fragment, starting a fresh session");
                (encode_fragment(&default_viewport, None), default_viewport, Vec::new())
            }
            None => (encode_fragment(&default_viewport, None), default_viewport, Vec::new()),
        };

        Self {
            fragment,
            viewport,
            waypoints: WaypointBuffer::new(waypoints, window),
            route: None,
        }
    }

    /// The fragment to mirror into the page URL.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Last settled viewport.
    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    /// Live waypoints, including edits still inside the quiescence window.
    pub fn waypoints(&self) -> &[Waypoint] {
        self.waypoints.live()
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    /// When the pending waypoint edit becomes routable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.waypoints.next_deadline()
    }

    /// Map movement settled: re-encode the viewport, keep the route segment.
    pub fn on_move_end(&mut self, viewport: ViewportState) {
        let mut fragment = encode_fragment(&viewport, None);
        if let Some(route) = route_segment(&self.fragment) {
            fragment.push('&');
            fragment.push_str(route);
        }
        self.viewport = viewport;
        self.fragment = fragment;
    }

    /// Map clicked: append a waypoint.
    pub fn on_click(&mut self, waypoint: Waypoint, now: Instant) {
        self.waypoints.push(waypoint, now);
    }

    /// Replace every waypoint at once.
    pub fn set_waypoints(&mut self, waypoints: Vec<Waypoint>, now: Instant) {
        self.waypoints.replace(waypoints, now);
    }

    /// Returns the waypoints to route when the buffer has settled on more
    /// than one point.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<Waypoint>> {
        let settled = self.waypoints.poll(now)?;
        (settled.len() > 1).then(|| settled.clone())
    }

    /// Records a computed route and writes it into the fragment.
    ///
    /// Results are applied in delivery order; a late response overwrites a
    /// newer one.
    pub fn apply_route(&mut self, result: RouteResult) -> Option<FitBounds> {
        self.fragment = encode_fragment(&self.viewport, Some(&result.compact_waypoints));
        let fit = FitBounds::new(result.bbox);
        info!(fragment = %self.fragment, "route applied");
        self.route = Some(result);
        fit
    }

    /// Polls the buffer and, if a route is due, computes and applies it.
    ///
    /// Errors leave the fragment, waypoints and previous route untouched.
    pub fn tick<F, C>(
        &mut self,
        now: Instant,
        client: &mut RouteServiceClient<F, C>,
        region: &str,
        calculator: &str,
    ) -> Result<Option<FitBounds>, RouteError>
    where
        F: RouteProviderFactory,
        C: CredentialProvider,
    {
        let Some(waypoints) = self.poll(now) else {
            return Ok(None);
        };

        match client.compute_route(&waypoints, region, calculator) {
            Ok(result) => Ok(self.apply_route(result)),
            Err(err) => {
                error!(%err, waypoints = waypoints.len(), "route calculation failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DEFAULT_WINDOW;
    use crate::fragment::encode_waypoints;
    use crate::polyline::MultiLine;

    fn wp(lng: f64, lat: f64) -> Waypoint {
        Waypoint::new(lng, lat).unwrap()
    }

    fn fresh() -> Session {
        Session::bootstrap(None, ViewportState::default(), DEFAULT_WINDOW)
    }

    fn route_for(waypoints: &[Waypoint]) -> RouteResult {
        RouteResult {
            distance: 12.5,
            duration_seconds: 900.0,
            path: MultiLine::default(),
            bbox: BoundingBox([-123.1, 49.2, -122.9, 49.3]),
            compact_waypoints: encode_waypoints(waypoints),
        }
    }

    #[test]
    fn test_bootstrap_without_fragment_writes_default() {
        let session = fresh();
        assert_eq!(session.fragment(), "#map=11/49.2819/-123.1187/0/0");
        assert!(session.waypoints().is_empty());
    }

    #[test]
    fn test_bootstrap_restores_fragment() {
        let waypoints = vec![wp(-122.976, 49.2246), wp(-123.047, 49.2506)];
        let fragment = format!("#map=13/49.25/-123.0/10/20&route={}", encode_waypoints(&waypoints));
        let session = Session::bootstrap(Some(&fragment), ViewportState::default(), DEFAULT_WINDOW);
        assert_eq!(session.fragment(), fragment);
        assert_eq!(session.viewport().zoom, 13.0);
        assert_eq!(session.viewport().pitch, 20.0);
        assert_eq!(session.waypoints(), &waypoints[..]);
    }

    #[test]
    fn test_bootstrap_degrades_on_malformed_fragment() {
        let session = Session::bootstrap(
            Some("#map=11/oops&route=%%%"),
            ViewportState::default(),
            DEFAULT_WINDOW,
        );
        assert_eq!(session.fragment(), "#map=11/49.2819/-123.1187/0/0");
        assert_eq!(*session.viewport(), ViewportState::default());
        assert!(session.waypoints().is_empty());
    }

    #[test]
    fn test_bootstrap_degrades_on_empty_viewport_field() {
        let session = Session::bootstrap(
            Some("#map=11//-123.1187/0/0"),
            ViewportState::default(),
            DEFAULT_WINDOW,
        );
        assert_eq!(*session.viewport(), ViewportState::default());
        assert_eq!(session.fragment(), "#map=11/49.2819/-123.1187/0/0");
    }

    #[test]
    fn test_restored_waypoints_are_routed_on_first_poll() {
        let waypoints = vec![wp(-122.976, 49.2246), wp(-123.047, 49.2506)];
        let fragment = format!("#map=13/49.25/-123/0/0&route={}", encode_waypoints(&waypoints));
        let mut session = Session::bootstrap(Some(&fragment), ViewportState::default(), DEFAULT_WINDOW);
        assert_eq!(session.poll(Instant::now()), Some(waypoints));
    }

    #[test]
    fn test_move_end_preserves_route_segment_verbatim() {
        let mut session = Session::bootstrap(
            Some("#map=11/49.2819/-123.1187/0/0&route=LTEyMi45NzYsNDkuMjI0NiQtMTIzLjA0Nyw0OS4yNTA2"),
            ViewportState::default(),
            DEFAULT_WINDOW,
        );
        session.on_move_end(ViewportState {
            zoom: 12.5,
            latitude: 49.3,
            longitude: -123.2,
            bearing: 15.0,
            pitch: 30.0,
        });
        assert_eq!(
            session.fragment(),
            "#map=12.5/49.3/-123.2/15/30&route=LTEyMi45NzYsNDkuMjI0NiQtMTIzLjA0Nyw0OS4yNTA2"
        );
    }

    #[test]
    fn test_move_end_without_route() {
        let mut session = fresh();
        session.on_move_end(ViewportState {
            zoom: 3.0,
            ..ViewportState::default()
        });
        assert_eq!(session.fragment(), "#map=3/49.2819/-123.1187/0/0");
    }

    #[test]
    fn test_single_click_does_not_route() {
        let start = Instant::now();
        let mut session = fresh();
        assert_eq!(session.poll(start), None);
        session.on_click(wp(-123.0, 49.2), start);
        assert_eq!(session.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_apply_route_writes_fragment_and_fits() {
        let start = Instant::now();
        let mut session = fresh();
        session.on_click(wp(-123.0, 49.2), start);
        session.on_click(wp(-122.9, 49.3), start + Duration::from_millis(100));
        let waypoints = session.poll(start + Duration::from_millis(600)).unwrap();

        let fit = session.apply_route(route_for(&waypoints)).unwrap();
        assert_eq!(fit.padding, 50);
        assert_eq!(fit.bbox, BoundingBox([-123.1, 49.2, -122.9, 49.3]));
        assert_eq!(
            session.fragment(),
            format!("#map=11/49.2819/-123.1187/0/0&route={}", encode_waypoints(&waypoints))
        );
        assert_eq!(decode_waypoints(session.fragment()).unwrap(), waypoints);
    }

    #[test]
    fn test_route_segment_survives_clearing_waypoints() {
        let start = Instant::now();
        let mut session = fresh();
        let waypoints = vec![wp(-123.0, 49.2), wp(-122.9, 49.3)];
        session.apply_route(route_for(&waypoints));

        session.set_waypoints(Vec::new(), start);
        assert_eq!(session.poll(start + DEFAULT_WINDOW), None);
        assert!(session.fragment().contains("&route="));
    }

    #[test]
    fn test_fit_bounds_skips_empty_geometry() {
        assert_eq!(FitBounds::new(BoundingBox::EMPTY), None);
    }
}
