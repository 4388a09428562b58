//! OAuth2/OIDC social login support: provider strategies, the provider
//! registry, and the shared types flowing through the connection handlers.

pub mod http;
pub mod providers;
pub mod types;

pub use providers::{AuthProvider, GitHubProvider, GoogleProvider, ProviderRegistry};
pub use types::{
    AuthorizationRequest, ConnectionData, ExternalProfile, OAuthError, OAuthToken,
    ProviderConfig, ProviderName, MOCK_CLIENT_ID_PREFIX,
};
