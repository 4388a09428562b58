//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::oauth2::providers::ProviderRegistry;
use crate::store::AuthStore;

const MIN_SECRET_BYTES: usize = 32;

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Persistence backend
    pub store: Arc<dyn AuthStore>,
    /// Configured provider strategies
    pub providers: Arc<ProviderRegistry>,
    key: Key,
}

impl AppState {
    /// Build the state: derive the cookie-signing key and construct every
    /// configured provider
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the session secret is shorter than
    /// 32 bytes, and [`AppError::OAuth`] if a configured provider cannot be
    /// constructed.
    pub async fn new(config: AppConfig, store: Arc<dyn AuthStore>) -> Result<Self, AppError> {
        if config.session.secret.len() < MIN_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "session secret must be at least {MIN_SECRET_BYTES} bytes"
            )));
        }
        let key = Key::derive_from(config.session.secret.as_bytes());
        let providers = ProviderRegistry::from_config(&config.providers).await?;

        Ok(Self {
            config: Arc::new(config),
            store,
            providers: Arc::new(providers),
            key,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}
