//! Credential caching for the routing client.

use std::env;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::RouteError;
use crate::traits::CredentialProvider;

/// Credentials are refreshed when they expire within this margin.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Temporary credentials issued by an identity provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    /// No expiry means the credential is re-fetched on every use.
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            expiration: None,
        }
    }

    /// Token to present to the routing endpoint, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.session_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .or(Some(self.access_key_id.as_str()))
            .filter(|token| !token.is_empty())
    }
}

/// Lazily acquired, cached credentials.
#[derive(Debug)]
pub struct CredentialCache<P> {
    provider: P,
    cached: Option<Credentials>,
}

impl<P: CredentialProvider> CredentialCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cached: None,
        }
    }

    /// Returns cached credentials, refreshing them first when needed.
    pub fn get(&mut self, now: DateTime<Utc>) -> Result<&Credentials, RouteError> {
        if self.needs_refresh(now) {
            debug!("refreshing routing credentials");
            let fresh = self.provider.credentials()?;
            self.cached = Some(fresh);
        }
        self.cached
            .as_ref()
            .ok_or_else(|| RouteError::CredentialAcquisitionFailure("no credentials cached".into()))
    }

    /// Nothing cached, no known expiry, or expiring within the margin.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match &self.cached {
            None => true,
            Some(Credentials {
                expiration: None, ..
            }) => true,
            Some(Credentials {
                expiration: Some(expiration),
                ..
            }) => *expiration - now < Duration::seconds(REFRESH_MARGIN_SECS),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// Returns the same credentials on every call.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credentials(&mut self) -> Result<Credentials, RouteError> {
        Ok(self.credentials.clone())
    }
}

/// Reads credentials from `ROUTE_SHARE_*` environment variables.
///
/// Falls back to anonymous credentials when no access key is set.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    pub const ACCESS_KEY_ID: &'static str = "ROUTE_SHARE_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &'static str = "ROUTE_SHARE_SECRET_ACCESS_KEY";
    pub const SESSION_TOKEN: &'static str = "ROUTE_SHARE_SESSION_TOKEN";
    pub const EXPIRATION: &'static str = "ROUTE_SHARE_EXPIRATION";
}

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&mut self) -> Result<Credentials, RouteError> {
        let Ok(access_key_id) = env::var(Self::ACCESS_KEY_ID) else {
            return Ok(Credentials::anonymous());
        };

        let expiration = match env::var(Self::EXPIRATION) {
            Ok(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|err| {
                        RouteError::CredentialAcquisitionFailure(format!(
                            "{} is not RFC 3339: {err}",
                            Self::EXPIRATION
                        ))
                    })?
                    .with_timezone(&Utc),
            ),
            Err(_) => None,
        };

        Ok(Credentials {
            access_key_id,
            secret_access_key: env::var(Self::SECRET_ACCESS_KEY).unwrap_or_default(),
            session_token: env::var(Self::SESSION_TOKEN).ok(),
            expiration,
        })
    }
}
