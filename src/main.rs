use std::env;
use std::process::ExitCode;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use route_share::config::AppConfig;
use route_share::credentials::{CredentialCache, EnvCredentialProvider};
use route_share::osrm::OsrmFactory;
use route_share::route::RouteServiceClient;
use route_share::session::Session;
use route_share::waypoint::Waypoint;

const USAGE: &str = "usage: route-share <config.json> [#map=...] [lng,lat ...]";

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = env::args().skip(1);
    let Some(config_path) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, path = %config_path, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let mut fragment = None;
    let mut points = Vec::new();
    for arg in args {
        if arg.starts_with('#') {
            fragment = Some(arg);
            continue;
        }
        let parsed = arg
            .split_once(',')
            .ok_or_else(|| format!("expected lng,lat, got {arg:?}"))
            .and_then(|(lng, lat)| Waypoint::parse(lng, lat).map_err(|err| err.to_string()));
        match parsed {
            Ok(point) => points.push(point),
            Err(err) => {
                error!(%err, "invalid waypoint argument");
                return ExitCode::FAILURE;
            }
        }
    }

    let mut session = Session::bootstrap(
        fragment.as_deref(),
        config.default_viewport,
        config.debounce_window(),
    );
    info!(fragment = %session.fragment(), "session ready");

    let start = Instant::now();
    for point in points {
        session.on_click(point, start);
    }

    let mut client = RouteServiceClient::new(
        OsrmFactory::new(config.routing.clone()),
        CredentialCache::new(EnvCredentialProvider),
    );

    let settle = session
        .next_deadline()
        .unwrap_or(start)
        .max(Instant::now());
    std::thread::sleep(settle.saturating_duration_since(Instant::now()));

    match session.tick(settle, &mut client, &config.region, &config.route_calculator) {
        Ok(fit) => {
            if let Some(route) = session.route() {
                println!("distance: {}", route.distance);
                println!("duration: {}s", route.duration_seconds);
            }
            if let Some(fit) = fit {
                println!("bbox: {:?}", fit.bbox.0);
            }
            println!("{}", session.fragment());
            ExitCode::SUCCESS
        }
        Err(_) => {
            println!("{}", session.fragment());
            ExitCode::FAILURE
        }
    }
}
