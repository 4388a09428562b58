//! GitHub social login strategy.
//!
//! GitHub is plain OAuth2: fixed endpoints, then userinfo via the REST API
//! (`/user` plus `/user/emails` for the primary verified address). GitHub
//! requires a `User-Agent` header on API requests.

use async_trait::async_trait;
use serde::Deserialize;

use crate::oauth2::providers::base::BaseOAuthProvider;
use crate::oauth2::providers::AuthProvider;
use crate::oauth2::types::{
    AuthorizationRequest, ConnectionData, ExternalProfile, OAuthError, ProviderConfig,
    ProviderName,
};

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const MOCK_CODE_GITHUB: &str = "MOCK_CODE_GITHUB";
const USER_AGENT: &str = "social-connections";

/// Deterministic fixture profile used in mock mode and by the test harness
#[must_use]
pub fn mock_profile() -> ExternalProfile {
    ExternalProfile {
        id: "1138".to_string(),
        email: "mock.github.user@example.com".to_string(),
        username: Some("mock-github-user".to_string()),
        name: Some("Mock GitHub User".to_string()),
        image_url: Some("https://github.com/ghost.png".to_string()),
    }
}

/// GitHub OAuth2 provider
pub struct GitHubProvider {
    config: ProviderConfig,
    base: BaseOAuthProvider,
    user_url: String,
    emails_url: String,
    scopes: Vec<String>,
}

impl GitHubProvider {
    /// Construct the provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ProviderConfig) -> Result<Self, OAuthError> {
        let auth_url = config.auth_url.clone().unwrap_or_else(|| GITHUB_AUTH_URL.to_string());
        let token_url = config
            .token_url
            .clone()
            .unwrap_or_else(|| GITHUB_TOKEN_URL.to_string());
        let user_url = config
            .userinfo_url
            .clone()
            .unwrap_or_else(|| GITHUB_USER_URL.to_string());
        let emails_url = format!("{user_url}/emails");

        let base = BaseOAuthProvider::new(&auth_url, &token_url, &config)?;
        let scopes = if config.scopes.is_empty() {
            vec!["read:user".to_string(), "user:email".to_string()]
        } else {
            config.scopes.clone()
        };

        Ok(Self {
            config,
            base,
            user_url,
            emails_url,
            scopes,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, OAuthError> {
        let user: GitHubUser = serde_json::from_value(
            self.base
                .fetch_json(&self.user_url, access_token, &[("User-Agent", USER_AGENT)])
                .await?,
        )
        .map_err(|e| OAuthError::UserInfoFailed(format!("failed to parse user: {e}")))?;

        // The emails endpoint needs its own scope; treat failures as "no
        // verified email on record" rather than failing the flow.
        let emails: Vec<GitHubEmail> = match self
            .base
            .fetch_json(&self.emails_url, access_token, &[("User-Agent", USER_AGENT)])
            .await
        {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(_) => vec![],
        };

        let primary_email = emails
            .iter()
            .find(|e| e.primary && e.verified)
            .or_else(|| emails.iter().find(|e| e.verified))
            .or_else(|| emails.first());

        let email = primary_email.map_or_else(
            || format!("{}@users.noreply.github.com", user.id),
            |e| e.email.clone(),
        );

        Ok(ExternalProfile {
            id: user.id.to_string(),
            email,
            username: Some(user.login.clone()),
            name: user.name.or(Some(user.login)),
            image_url: Some(user.avatar_url),
        })
    }
}

#[async_trait]
impl AuthProvider for GitHubProvider {
    fn name(&self) -> ProviderName {
        ProviderName::GitHub
    }

    fn mock_enabled(&self) -> bool {
        self.config.mock_enabled()
    }

    fn mock_code(&self) -> &'static str {
        MOCK_CODE_GITHUB
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
        if self.mock_enabled() && code == MOCK_CODE_GITHUB {
            return Ok(mock_profile());
        }

        let token = self.base.exchange_code(code, pkce_verifier).await?;
        self.fetch_profile(&token.access_token).await
    }

    async fn resolve_connection_data(&self, provider_id: &str) -> ConnectionData {
        if self.mock_enabled() {
            let profile = mock_profile();
            let login = profile.username.unwrap_or(profile.id);
            return ConnectionData {
                link: Some(format!("https://github.com/{login}")),
                display_name: login,
            };
        }

        let url = format!("{}/{provider_id}", self.user_url);
        let lookup = async {
            let response = self
                .base
                .http_client()
                .get(&url)
                .header("User-Agent", USER_AGENT)
                .send()
                .await
                .ok()?;
            if !response.status().is_success() {
                return None;
            }
            response.json::<GitHubUserSummary>().await.ok()
        }
        .await;

        lookup.map_or(
            ConnectionData {
                display_name: "Unknown".to_string(),
                link: None,
            },
            |user| ConnectionData {
                display_name: user.login,
                link: Some(user.html_url),
            },
        )
    }
}

/// GitHub `/user` response
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    name: Option<String>,
    avatar_url: String,
}

/// GitHub `/user/emails` entry
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    verified: bool,
    primary: bool,
}

/// GitHub user-by-id response, used for connection enrichment
#[derive(Debug, Deserialize)]
struct GitHubUserSummary {
    login: String,
    html_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config() -> ProviderConfig {
        ProviderConfig {
            client_id: "MOCK_GITHUB_CLIENT_ID".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/github/callback".to_string(),
            scopes: vec![],
            issuer: None,
            auth_url: None,
            token_url: None,
            userinfo_url: None,
        }
    }

    #[test]
    fn authorization_request_uses_github_endpoints() {
        let provider = GitHubProvider::new(ProviderConfig {
            client_id: "real-client-id".to_string(),
            ..mock_config()
        })
        .unwrap();

        let request = provider.authorization_request();
        assert!(request.url.starts_with(GITHUB_AUTH_URL));
        assert!(request.url.contains("client_id=real-client-id"));
        assert!(request.url.contains("scope=read%3Auser"));
        assert!(!request.state.is_empty());
    }

    #[tokio::test]
    async fn mock_mode_returns_the_fixture() {
        let provider = GitHubProvider::new(mock_config()).unwrap();
        let profile = provider.authenticate(MOCK_CODE_GITHUB, "").await.unwrap();
        assert_eq!(profile.username.as_deref(), Some("mock-github-user"));
    }

    #[tokio::test]
    async fn mock_connection_data_names_the_fixture() {
        let provider = GitHubProvider::new(mock_config()).unwrap();
        let data = provider.resolve_connection_data("1138").await;
        assert_eq!(data.display_name, "mock-github-user");
        assert!(data.link.is_some());
    }
}
