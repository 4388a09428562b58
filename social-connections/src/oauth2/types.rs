//! Shared OAuth2 types: provider names, configuration, errors, and the
//! normalized profile produced after a successful exchange.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client id prefix that switches a provider into mock mode.
///
/// When a configured client id starts with this sentinel, the provider never
/// talks to the network: initiation redirects straight to the callback with
/// the provider's mock code, and authentication yields the fixture profile.
pub const MOCK_CLIENT_ID_PREFIX: &str = "MOCK_";

/// Supported social login providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    /// Google (OpenID Connect)
    Google,
    /// GitHub OAuth2
    GitHub,
}

impl ProviderName {
    /// Lowercase wire name, as used in routes and connection rows
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::GitHub => "github",
        }
    }

    /// Human-readable label for toasts ("Google", "GitHub")
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::GitHub => "GitHub",
        }
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderName {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::GitHub),
            other => Err(OAuthError::UnknownProvider(other.to_string())),
        }
    }
}

/// Per-provider configuration
///
/// Endpoint overrides exist so tests can point a provider at the mock
/// harness; in production they are left unset and the provider uses its
/// well-known endpoints (Google resolves them from the issuer's discovery
/// document).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth2 client id (a `MOCK_` prefix enables mock mode)
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// OAuth scopes to request
    #[serde(default)]
    pub scopes: Vec<String>,
    /// OIDC issuer override (Google only)
    #[serde(default)]
    pub issuer: Option<String>,
    /// Authorization endpoint override
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Token endpoint override
    #[serde(default)]
    pub token_url: Option<String>,
    /// Userinfo endpoint override
    #[serde(default)]
    pub userinfo_url: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider should short-circuit the network exchange
    #[must_use]
    pub fn mock_enabled(&self) -> bool {
        self.client_id.starts_with(MOCK_CLIENT_ID_PREFIX)
    }
}

/// OAuth2 client with auth and token endpoints configured (oauth2 5.0
/// tracks endpoint presence in the type)
pub type ConfiguredClient = oauth2::basic::BasicClient<
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

/// Pending authorization redirect produced by a provider strategy
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Provider authorization URL to redirect the user to
    pub url: String,
    /// CSRF state token, round-tripped through the connection-flow cookie
    pub state: String,
    /// PKCE verifier matching the challenge embedded in `url`
    pub pkce_verifier: String,
}

/// Access token returned by the code exchange
#[derive(Debug, Clone)]
pub struct OAuthToken {
    /// Bearer access token
    pub access_token: String,
    /// Refresh token, when the provider issues one
    pub refresh_token: Option<String>,
    /// Expiry instant, when the provider reports one
    pub expires_at: Option<std::time::SystemTime>,
}

/// Normalized external identity produced by a provider strategy
///
/// Ephemeral: consumed by the callback handler (and the onboarding cookie),
/// never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProfile {
    /// Provider-scoped stable user id
    pub id: String,
    /// Email address reported by the provider
    pub email: String,
    /// Provider username/handle, when available
    #[serde(default)]
    pub username: Option<String>,
    /// Display name, when available
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL, when available
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ExternalProfile {
    /// Name used in toast descriptions: username, falling back to email
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }
}

/// Best-effort enrichment for displaying a connection in settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionData {
    /// Display name for the linked account
    pub display_name: String,
    /// Profile link, when the provider exposes one
    pub link: Option<String>,
}

/// OAuth2 flow errors
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Provider name not recognized
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider misconfiguration (bad URLs, missing credentials)
    #[error("OAuth configuration error: {0}")]
    Config(String),

    /// OIDC discovery document could not be fetched or parsed
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Callback arrived without a code, or with a state that does not match
    /// the connection-flow cookie
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    /// Authorization code could not be exchanged for a token
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Userinfo request failed or returned an unusable payload
    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    /// Provider reported an absent or unverified email address
    #[error("Email missing or unverified")]
    EmailNotVerified,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name_round_trip() {
        assert_eq!("google".parse::<ProviderName>().unwrap(), ProviderName::Google);
        assert_eq!("github".parse::<ProviderName>().unwrap(), ProviderName::GitHub);
        assert_eq!(ProviderName::Google.as_str(), "google");
        assert_eq!(ProviderName::GitHub.label(), "GitHub");
        assert!("gitlab".parse::<ProviderName>().is_err());
    }

    #[test]
    fn mock_mode_detected_from_client_id() {
        let mut config = ProviderConfig {
            client_id: "MOCK_GOOGLE_CLIENT_ID".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/google/callback".to_string(),
            scopes: vec![],
            issuer: None,
            auth_url: None,
            token_url: None,
            userinfo_url: None,
        };
        assert!(config.mock_enabled());

        config.client_id = "real-client-id".to_string();
        assert!(!config.mock_enabled());
    }

    #[test]
    fn profile_display_name_falls_back_to_email() {
        let mut profile = ExternalProfile {
            id: "123".to_string(),
            email: "user@example.com".to_string(),
            username: Some("user".to_string()),
            name: None,
            image_url: None,
        };
        assert_eq!(profile.display_name(), "user");

        profile.username = None;
        assert_eq!(profile.display_name(), "user@example.com");
    }
}
