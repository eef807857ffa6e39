//! services/portal/src/config.rs
//!
//! Defines the portal's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use campus_core::domain::AccessToken;
use chrono::{Duration, FixedOffset};
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Base URL of the API gateway, without a trailing slash.
    pub gateway_url: String,
    pub gateway_timeout: std::time::Duration,
    /// Portal credential used to look up scanned locations. Without it the
    /// scanning user's own token is used.
    pub service_token: Option<AccessToken>,
    pub log_level: Level,
    /// Offset of the campus clock, used to place daily class times on a date.
    pub campus_offset: FixedOffset,
    pub allowed_origin: String,
    pub session_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = var_or("ALLOWED_ORIGIN", "http://localhost:5173");

        // --- Gateway ---
        let gateway_url = var_or("GATEWAY_URL", "http://localhost:8000/api/v1");
        if !(gateway_url.starts_with("http://") || gateway_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_URL".to_string(),
                format!("'{}' is not an http(s) URL", gateway_url),
            ));
        }
        let gateway_url = gateway_url.trim_end_matches('/').to_string();

        let service_token = lookup("GATEWAY_SERVICE_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(AccessToken::new);

        let timeout_secs = parse_positive(&var_or("GATEWAY_TIMEOUT_SECS", "10"), "GATEWAY_TIMEOUT_SECS")?;

        // --- Campus ---
        let offset_str = var_or("CAMPUS_UTC_OFFSET", "+00:00");
        let campus_offset = parse_offset(&offset_str).ok_or_else(|| {
            ConfigError::InvalidValue(
                "CAMPUS_UTC_OFFSET".to_string(),
                format!("'{}' is not an offset like -05:00", offset_str),
            )
        })?;

        let ttl_hours = parse_positive(&var_or("SESSION_TTL_HOURS", "12"), "SESSION_TTL_HOURS")?;

        Ok(Self {
            bind_address,
            gateway_url,
            gateway_timeout: std::time::Duration::from_secs(timeout_secs),
            service_token,
            log_level,
            campus_offset,
            allowed_origin,
            session_ttl: Duration::hours(ttl_hours as i64),
        })
    }
}

fn parse_positive(value: &str, key: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", value),
        )),
    }
}

/// Parses `+HH:MM` / `-HH:MM`.
fn parse_offset(value: &str) -> Option<FixedOffset> {
    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.gateway_url, "http://localhost:8000/api/v1");
        assert_eq!(config.gateway_timeout.as_secs(), 10);
        assert_eq!(config.campus_offset.local_minus_utc(), 0);
        assert_eq!(config.session_ttl, Duration::hours(12));
        assert!(config.service_token.is_none());
    }

    #[test]
    fn blank_service_token_counts_as_unset() {
        let config = Config::from_lookup(lookup(&[("GATEWAY_SERVICE_TOKEN", "  ")])).unwrap();
        assert!(config.service_token.is_none());

        let config = Config::from_lookup(lookup(&[("GATEWAY_SERVICE_TOKEN", "svc-123")])).unwrap();
        assert_eq!(config.service_token, Some(AccessToken::new("svc-123")));
    }

    #[test]
    fn gateway_url_loses_trailing_slash() {
        let config = Config::from_lookup(lookup(&[("GATEWAY_URL", "https://gw.campus.edu/api/v1/")])).unwrap();
        assert_eq!(config.gateway_url, "https://gw.campus.edu/api/v1");
    }

    #[test]
    fn campus_offset_is_parsed() {
        let config = Config::from_lookup(lookup(&[("CAMPUS_UTC_OFFSET", "-05:00")])).unwrap();
        assert_eq!(config.campus_offset.local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("CAMPUS_UTC_OFFSET", "Lima")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "CAMPUS_UTC_OFFSET"));

        let err = Config::from_lookup(lookup(&[("GATEWAY_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "GATEWAY_TIMEOUT_SECS"));

        let err = Config::from_lookup(lookup(&[("GATEWAY_URL", "gateway:8000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "GATEWAY_URL"));

        let err = Config::from_lookup(lookup(&[("RUST_LOG", "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "RUST_LOG"));
    }
}
