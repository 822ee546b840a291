//! Service configuration, read from the environment

use std::env;
use std::fmt;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_COOKIE: &str = "__session";

#[derive(Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// SQLite database file; in-memory stores when unset
    pub database_path: Option<String>,

    /// Identity-provider webhook secret (`whsec_...`)
    pub webhook_secret: Option<String>,

    /// Name of the session cookie
    pub session_cookie: String,

    /// Mount `/api/test/*` (never in production)
    pub enable_test_routes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: None,
            webhook_secret: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            enable_test_routes: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("session_cookie", &self.session_cookie)
            .field("enable_test_routes", &self.enable_test_routes)
            .finish()
    }
}

impl Config {
    /// Load from the process environment, after an optional `.env` file
    pub fn from_env() -> Self {
        // A missing .env is normal outside development
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup; unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid PORT, using default");
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            port,
            database_path: non_empty("DATABASE_PATH"),
            webhook_secret: non_empty("IDENTITY_WEBHOOK_SECRET"),
            session_cookie: non_empty("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            enable_test_routes: non_empty("ENABLE_TEST_ROUTES")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.enable_test_routes),
        }
    }
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.database_path.is_none());
        assert_eq!(config.session_cookie, DEFAULT_SESSION_COOKIE);
        assert!(!config.enable_test_routes);
    }

    #[test]
    fn test_values_read() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DATABASE_PATH", "/tmp/landlease.db"),
            ("IDENTITY_WEBHOOK_SECRET", "whsec_abc"),
            ("ENABLE_TEST_ROUTES", "true"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path.as_deref(), Some("/tmp/landlease.db"));
        assert!(config.enable_test_routes);
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = Config::from_lookup(lookup(&[("PORT", "eighty")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_lookup(lookup(&[("IDENTITY_WEBHOOK_SECRET", "whsec_topsecret")]));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("topsecret"));
    }
}
