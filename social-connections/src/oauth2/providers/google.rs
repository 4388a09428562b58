//! Google social login strategy (OpenID Connect).
//!
//! Endpoints are resolved from the issuer's discovery document unless the
//! configuration overrides them (tests point them at the mock harness).
//! Google reports email verification; an absent or unverified email fails
//! the strategy.

use async_trait::async_trait;
use serde::Deserialize;

use crate::oauth2::providers::base::{discover, BaseOAuthProvider};
use crate::oauth2::providers::AuthProvider;
use crate::oauth2::types::{
    AuthorizationRequest, ConnectionData, ExternalProfile, OAuthError, ProviderConfig,
    ProviderName,
};

const GOOGLE_ISSUER: &str = "https://accounts.google.com";
const MOCK_CODE_GOOGLE: &str = "MOCK_CODE_GOOGLE";

/// Deterministic fixture profile used in mock mode and by the test harness
#[must_use]
pub fn mock_profile() -> ExternalProfile {
    ExternalProfile {
        id: "mock-google-sub-1093ef2b".to_string(),
        email: "mock.google.user@example.com".to_string(),
        username: Some("mock.google.user".to_string()),
        name: Some("Mock Google User".to_string()),
        image_url: Some("https://lh3.googleusercontent.com/a-/mock-avatar".to_string()),
    }
}

/// Google OIDC provider
pub struct GoogleProvider {
    config: ProviderConfig,
    base: BaseOAuthProvider,
    userinfo_url: String,
    scopes: Vec<String>,
}

impl GoogleProvider {
    /// Construct the provider, resolving endpoints via OIDC discovery when
    /// the configuration does not override them
    ///
    /// Mock mode skips discovery entirely; the well-known production
    /// endpoints are wired in but never contacted.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails or the configuration is invalid.
    pub async fn discover(config: ProviderConfig) -> Result<Self, OAuthError> {
        let (auth_url, token_url, userinfo_url) = match (
            &config.auth_url,
            &config.token_url,
            &config.userinfo_url,
        ) {
            (Some(auth), Some(token), Some(userinfo)) => {
                (auth.clone(), token.clone(), userinfo.clone())
            }
            _ if config.mock_enabled() => (
                "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                "https://oauth2.googleapis.com/token".to_string(),
                "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            ),
            _ => {
                let issuer = config.issuer.as_deref().unwrap_or(GOOGLE_ISSUER);
                let document = discover(issuer).await?;
                (
                    document.authorization_endpoint,
                    document.token_endpoint,
                    document.userinfo_endpoint,
                )
            }
        };

        let base = BaseOAuthProvider::new(&auth_url, &token_url, &config)?;
        let scopes = if config.scopes.is_empty() {
            vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ]
        } else {
            config.scopes.clone()
        };

        Ok(Self {
            config,
            base,
            userinfo_url,
            scopes,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, OAuthError> {
        let value = self.base.fetch_json(&self.userinfo_url, access_token, &[]).await?;
        let userinfo: GoogleUserInfo = serde_json::from_value(value)
            .map_err(|e| OAuthError::UserInfoFailed(format!("failed to parse userinfo: {e}")))?;
        profile_from_userinfo(userinfo)
    }
}

fn profile_from_userinfo(userinfo: GoogleUserInfo) -> Result<ExternalProfile, OAuthError> {
    let email = match (userinfo.email, userinfo.email_verified) {
        (Some(email), Some(true)) => email,
        _ => return Err(OAuthError::EmailNotVerified),
    };

    Ok(ExternalProfile {
        id: userinfo.sub,
        email,
        username: userinfo.preferred_username,
        name: userinfo.given_name.or(userinfo.name),
        image_url: userinfo.picture,
    })
}

#[async_trait]
impl AuthProvider for GoogleProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Google
    }

    fn mock_enabled(&self) -> bool {
        self.config.mock_enabled()
    }

    fn mock_code(&self) -> &'static str {
        MOCK_CODE_GOOGLE
    }

    fn mock_profile(&self) -> ExternalProfile {
        mock_profile()
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        self.base.authorization_request(&self.scopes)
    }

    async fn authenticate(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ExternalProfile, OAuthError> {
        if self.mock_enabled() && code == MOCK_CODE_GOOGLE {
            return Ok(mock_profile());
        }

        let token = self.base.exchange_code(code, pkce_verifier).await?;
        self.fetch_profile(&token.access_token).await
    }

    // Google has no public profile lookup by subject; the provider id is
    // the best available display value (original behavior).
    async fn resolve_connection_data(&self, provider_id: &str) -> ConnectionData {
        ConnectionData {
            display_name: provider_id.to_string(),
            link: None,
        }
    }
}

/// Google userinfo endpoint response
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    given_name: Option<String>,
    preferred_username: Option<String>,
    picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config() -> ProviderConfig {
        ProviderConfig {
            client_id: "MOCK_GOOGLE_CLIENT_ID".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/google/callback".to_string(),
            scopes: vec![],
            issuer: None,
            auth_url: None,
            token_url: None,
            userinfo_url: None,
        }
    }

    #[tokio::test]
    async fn mock_mode_skips_the_network() {
        let provider = GoogleProvider::discover(mock_config()).await.unwrap();
        assert!(provider.mock_enabled());

        let profile = provider
            .authenticate(MOCK_CODE_GOOGLE, "")
            .await
            .unwrap();
        assert_eq!(profile.id, mock_profile().id);
        assert_eq!(profile.email, mock_profile().email);
    }

    #[tokio::test]
    async fn connection_data_falls_back_to_provider_id() {
        let provider = GoogleProvider::discover(mock_config()).await.unwrap();
        let data = provider.resolve_connection_data("109384").await;
        assert_eq!(data.display_name, "109384");
        assert!(data.link.is_none());
    }

    #[test]
    fn unverified_email_is_rejected() {
        let userinfo: GoogleUserInfo = serde_json::from_value(serde_json::json!({
            "sub": "123",
            "email": "someone@example.com",
            "email_verified": false,
        }))
        .unwrap();
        assert!(matches!(
            profile_from_userinfo(userinfo),
            Err(OAuthError::EmailNotVerified)
        ));
    }

    #[test]
    fn missing_email_is_rejected() {
        let userinfo: GoogleUserInfo =
            serde_json::from_value(serde_json::json!({ "sub": "123" })).unwrap();
        assert!(matches!(
            profile_from_userinfo(userinfo),
            Err(OAuthError::EmailNotVerified)
        ));
    }

    #[test]
    fn verified_email_maps_to_profile() {
        let userinfo: GoogleUserInfo = serde_json::from_value(serde_json::json!({
            "sub": "109384",
            "email": "someone@example.com",
            "email_verified": true,
            "given_name": "Someone",
            "picture": "https://lh3.googleusercontent.com/a-/xyz",
        }))
        .unwrap();
        let profile = profile_from_userinfo(userinfo).unwrap();
        assert_eq!(profile.id, "109384");
        assert_eq!(profile.email, "someone@example.com");
        assert_eq!(profile.name.as_deref(), Some("Someone"));
    }
}
