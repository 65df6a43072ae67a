//! route-share core
//!
//! Shareable driving routes: session state lives in the URL fragment,
//! waypoint edits are debounced, and routes come from an external provider.

pub mod config;
pub mod credentials;
pub mod debounce;
pub mod error;
pub mod fragment;
pub mod osrm;
pub mod polyline;
pub mod route;
pub mod session;
pub mod traits;
pub mod waypoint;
