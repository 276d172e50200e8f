//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. An optional `app.env` file is read
//! into the environment first (see `main`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use phantom_shared::constants::{DEFAULT_ACCESS_TOKEN_SECS, DEFAULT_HTTP_PORT};

/// Dotenv-style file loaded at startup when present.
pub const ENV_FILE: &str = "app.env";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: the platform data directory (see `Database::default_path`).
    pub database_path: Option<PathBuf>,

    /// Secret material the access token key is derived from.
    /// Env: `TOKEN_SYMMETRIC_KEY`
    /// Default: none, in which case a random per-process key is used.
    pub token_symmetric_key: Option<String>,

    /// Lifetime of issued access tokens.
    /// Env: `ACCESS_TOKEN_DURATION` (humantime, e.g. `15m`, `1h 30m`)
    /// Default: 15 minutes
    pub access_token_duration: Duration,

    /// Deadline applied to every HTTP request.
    /// Env: `REQUEST_TIMEOUT` (humantime)
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field(
                "token_symmetric_key",
                &self.token_symmetric_key.as_ref().map(|_| "<redacted>"),
            )
            .field("access_token_duration", &self.access_token_duration)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            token_symmetric_key: None,
            access_token_duration: Duration::from_secs(DEFAULT_ACCESS_TOKEN_SECS),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = var("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(key) = var("TOKEN_SYMMETRIC_KEY") {
            if !key.is_empty() {
                config.token_symmetric_key = Some(key);
            }
        }

        if let Some(d) = parse_duration(&var, "ACCESS_TOKEN_DURATION") {
            config.access_token_duration = d;
        }

        if let Some(d) = parse_duration(&var, "REQUEST_TIMEOUT") {
            config.request_timeout = d;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_duration(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = var(key)?;
    match humantime::parse_duration(&raw) {
        Ok(d) if !d.is_zero() => Some(d),
        Ok(_) => {
            tracing::warn!(key, "Zero duration, using default");
            None
        }
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Invalid duration, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = load(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.access_token_duration, Duration::from_secs(900));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.database_path.is_none());
        assert!(config.token_symmetric_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HTTP_ADDR", "127.0.0.1:3000"),
            ("DATABASE_PATH", "/tmp/phantom.db"),
            ("TOKEN_SYMMETRIC_KEY", "12345678901234567890123456789012"),
            ("ACCESS_TOKEN_DURATION", "1h 30m"),
            ("REQUEST_TIMEOUT", "250ms"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 3000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/phantom.db")));
        assert_eq!(config.access_token_duration, Duration::from_secs(5400));
        assert_eq!(config.request_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("HTTP_ADDR", "not an address"),
            ("ACCESS_TOKEN_DURATION", "soon"),
            ("REQUEST_TIMEOUT", "0s"),
        ]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.access_token_duration, Duration::from_secs(900));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = load(&[("TOKEN_SYMMETRIC_KEY", "super-secret-material-000000000000")]);
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
