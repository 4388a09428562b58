//! Layered application configuration.
//!
//! Sources, highest priority first:
//!
//! 1. Environment variables (`SOCIAL_` prefix, `__` as the level separator,
//!    e.g. `SOCIAL_PROVIDERS__GOOGLE__CLIENT_ID`)
//! 2. `./config.toml`
//! 3. Hardcoded defaults
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [session]
//! secret = "<at least 32 bytes of randomness>"
//! ttl_days = 30
//!
//! [providers.google]
//! client_id = "your-google-client-id"
//! client_secret = "your-google-client-secret"
//! redirect_uri = "http://localhost:3000/auth/google/callback"
//!
//! [providers.github]
//! client_id = "your-github-client-id"
//! client_secret = "your-github-client-secret"
//! redirect_uri = "http://localhost:3000/auth/github/callback"
//! ```
//!
//! A `MOCK_`-prefixed client id puts that provider into mock mode.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::oauth2::types::ProviderConfig;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Session and cookie-signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Key material for signed cookies; at least 32 bytes
    pub secret: String,
    /// Session lifetime in days
    pub ttl_days: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            // Development-only default; override in production
            secret: "insecure-development-session-secret-change-me".to_string(),
            ttl_days: 30,
        }
    }
}

/// Configured social login providers; unset providers are not routed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Google OIDC credentials
    pub google: Option<ProviderConfig>,
    /// GitHub OAuth2 credentials
    pub github: Option<ProviderConfig>,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Session and signing settings
    #[serde(default)]
    pub session: SessionSettings,
    /// Social login providers
    #[serde(default)]
    pub providers: ProviderSettings,
}

impl AppConfig {
    /// Load configuration from defaults, `./config.toml`, and `SOCIAL_`
    /// environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a source fails to parse or the merged result is
    /// structurally invalid.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration with an explicit config file path
    ///
    /// # Errors
    ///
    /// Returns an error if a source fails to parse or the merged result is
    /// structurally invalid.
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SOCIAL_").split("__"))
            .extract()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.ttl_days, 30);
        assert!(config.session.secret.len() >= 32);
        assert!(config.providers.google.is_none());
        assert!(config.providers.github.is_none());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = AppConfig::load_from("does-not-exist.toml").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
