//! URL fragment codec.
//!
//! A session is persisted as
//! `#map=<zoom>/<lat>/<lng>/<bearing>/<pitch>[&route=<base64>]`, where the
//! route payload is the standard-base64 encoding of
//! `lng,lat$lng,lat$...` in placement order.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::FragmentError;
use crate::waypoint::{ViewportState, Waypoint};

const MAP_PREFIX: &str = "map=";
const ROUTE_PREFIX: &str = "route=";
const WAYPOINT_SEPARATOR: char = '$';

/// Decodes the `map=` segment into a viewport.
///
/// Accepts integer or decimal text for every field. A legacy three-field
/// form (zoom/lat/lng) gets a bearing and pitch of zero.
pub fn decode_viewport(fragment: &str) -> Result<ViewportState, FragmentError> {
    let map = map_segment(fragment);
    let body = map
        .strip_prefix(MAP_PREFIX)
        .ok_or_else(|| FragmentError::MalformedFragment(format!("missing map segment in {fragment:?}")))?;

    let fields = body
        .split('/')
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|_| FragmentError::MalformedFragment(format!("non-numeric field {field:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if fields.len() < 3 {
        return Err(FragmentError::MalformedFragment(format!(
            "expected at least 3 map fields, got {}",
            fields.len()
        )));
    }

    Ok(ViewportState {
        zoom: fields[0],
        latitude: fields[1],
        longitude: fields[2],
        bearing: fields.get(3).copied().unwrap_or(0.0),
        pitch: fields.get(4).copied().unwrap_or(0.0),
    })
}

/// Decodes the waypoints carried in the `route=` segment.
///
/// A fragment without a route segment, or with an empty one, yields no
/// waypoints.
pub fn decode_waypoints(fragment: &str) -> Result<Vec<Waypoint>, FragmentError> {
    let Some(route) = route_segment(fragment) else {
        return Ok(Vec::new());
    };

    let payload = route.strip_prefix(ROUTE_PREFIX).unwrap_or(route);
    if payload.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|err| FragmentError::MalformedFragment(format!("route payload is not base64: {err}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|err| FragmentError::MalformedFragment(format!("route payload is not UTF-8: {err}")))?;

    text.split(WAYPOINT_SEPARATOR)
        .map(|token| match token.split_once(',') {
            Some((lng, lat)) if !lat.contains(',') => Waypoint::parse(lng, lat),
            _ => Err(FragmentError::MalformedWaypointToken(token.to_string())),
        })
        .collect()
}

/// Encodes a viewport plus an optional compact waypoint encoding.
pub fn encode_fragment(viewport: &ViewportState, compact_waypoints: Option<&str>) -> String {
    let map = format!(
        "#{MAP_PREFIX}{}/{}/{}/{}/{}",
        viewport.zoom, viewport.latitude, viewport.longitude, viewport.bearing, viewport.pitch
    );
    match compact_waypoints {
        Some(encoded) if !encoded.is_empty() => format!("{map}&{ROUTE_PREFIX}{encoded}"),
        _ => map,
    }
}

/// Compact waypoint encoding used in the `route=` segment.
pub fn encode_waypoints(waypoints: &[Waypoint]) -> String {
    let text = waypoints
        .iter()
        .map(|waypoint| format!("{},{}", waypoint.lng(), waypoint.lat()))
        .collect::<Vec<_>>()
        .join("$");
    STANDARD.encode(text.as_bytes())
}

/// The raw second segment (`route=...`) of a fragment, if any.
pub fn route_segment(fragment: &str) -> Option<&str> {
    fragment.split('&').nth(1)
}

fn map_segment(fragment: &str) -> &str {
    let first = fragment.split('&').next().unwrap_or_default();
    first.strip_prefix('#').unwrap_or(first)
}
