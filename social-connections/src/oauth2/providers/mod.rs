//! Provider strategies and the registry that maps provider names to them.
//!
//! Each provider implements [`AuthProvider`]: the OAuth2/OIDC exchange
//! yielding a normalized [`ExternalProfile`], best-effort connection
//! enrichment, and mock hooks for deterministic testing.

pub mod base;
pub mod github;
pub mod google;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderSettings;
use crate::oauth2::types::{
    AuthorizationRequest, ConnectionData, ExternalProfile, OAuthError, ProviderName,
};

pub use base::BaseOAuthProvider;
pub use github::GitHubProvider;
pub use google::GoogleProvider;

/// Contract required of every social login provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Provider identity
    fn name(&self) -> ProviderName;

    /// Whether this provider short-circuits the network exchange
    fn mock_enabled(&self) -> bool;

    /// Authorization code the mock initiation hands to the callback
    fn mock_code(&self) -> &'static str;

    /// Deterministic fixture profile returned in mock mode
    fn mock_profile(&self) -> ExternalProfile;

    /// Build the authorization redirect (URL, CSRF state, PKCE verifier)
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Run the code exchange and produce the normalized profile
    ///
    /// In mock mode the provider returns [`Self::mock_profile`] when handed
    /// [`Self::mock_code`] without touching the network.
    async fn authenticate(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ExternalProfile, OAuthError>;

    /// Best-effort display enrichment for a linked connection
    ///
    /// Never fails the flow: providers fall back to a placeholder when the
    /// lookup is unavailable.
    async fn resolve_connection_data(&self, provider_id: &str) -> ConnectionData;
}

/// Maps provider names to their strategies
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, Arc<dyn AuthProvider>>,
}

impl ProviderRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration, constructing each configured
    /// provider (Google resolves its endpoints via OIDC discovery unless
    /// overridden or mocked)
    ///
    /// # Errors
    ///
    /// Returns an error if a configured provider cannot be constructed.
    pub async fn from_config(settings: &ProviderSettings) -> Result<Self, OAuthError> {
        let mut registry = Self::new();
        if let Some(config) = &settings.google {
            registry.register(Arc::new(GoogleProvider::discover(config.clone()).await?));
        }
        if let Some(config) = &settings.github {
            registry.register(Arc::new(GitHubProvider::new(config.clone())?));
        }
        Ok(registry)
    }

    /// Register a provider strategy
    pub fn register(&mut self, provider: Arc<dyn AuthProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    /// Look up the strategy for a provider name
    #[must_use]
    pub fn get(&self, name: ProviderName) -> Option<Arc<dyn AuthProvider>> {
        self.providers.get(&name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth2::types::ProviderConfig;

    fn mock_config(provider: ProviderName) -> ProviderConfig {
        ProviderConfig {
            client_id: format!("MOCK_{}_CLIENT_ID", provider.as_str().to_uppercase()),
            client_secret: "secret".to_string(),
            redirect_uri: format!("http://localhost:3000/auth/{provider}/callback"),
            scopes: vec![],
            issuer: None,
            auth_url: None,
            token_url: None,
            userinfo_url: None,
        }
    }

    #[tokio::test]
    async fn registry_resolves_registered_providers() {
        let settings = ProviderSettings {
            google: Some(mock_config(ProviderName::Google)),
            github: Some(mock_config(ProviderName::GitHub)),
        };
        let registry = ProviderRegistry::from_config(&settings).await.unwrap();

        assert!(registry.get(ProviderName::Google).is_some());
        assert!(registry.get(ProviderName::GitHub).is_some());
    }

    #[tokio::test]
    async fn registry_misses_unconfigured_providers() {
        let settings = ProviderSettings {
            google: Some(mock_config(ProviderName::Google)),
            github: None,
        };
        let registry = ProviderRegistry::from_config(&settings).await.unwrap();

        assert!(registry.get(ProviderName::Google).is_some());
        assert!(registry.get(ProviderName::GitHub).is_none());
    }
}
