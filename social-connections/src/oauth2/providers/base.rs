//! Shared OAuth2 plumbing used by the Google and GitHub strategies:
//! client construction, PKCE authorization URLs, the code exchange, and
//! OIDC discovery.

use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::oauth2::http::async_http_client;
use crate::oauth2::types::{
    AuthorizationRequest, ConfiguredClient, OAuthError, OAuthToken, ProviderConfig,
};

/// Subset of the OIDC discovery document the providers care about
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    /// Issuer identifier
    pub issuer: String,
    /// Authorization endpoint URL
    pub authorization_endpoint: String,
    /// Token endpoint URL
    pub token_endpoint: String,
    /// Userinfo endpoint URL
    pub userinfo_endpoint: String,
}

/// Fetch `{issuer}/.well-known/openid-configuration`
///
/// # Errors
///
/// Returns [`OAuthError::DiscoveryFailed`] if the document cannot be
/// fetched or parsed.
pub async fn discover(issuer: &str) -> Result<DiscoveryDocument, OAuthError> {
    let url = format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    );
    let response = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .map_err(|e| OAuthError::DiscoveryFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(OAuthError::DiscoveryFailed(format!(
            "HTTP {}",
            response.status()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| OAuthError::DiscoveryFailed(format!("failed to parse document: {e}")))
}

/// Base strategy holding the configured OAuth2 client and a reusable HTTP
/// client for userinfo-style requests
pub struct BaseOAuthProvider {
    client: ConfiguredClient,
    http_client: reqwest::Client,
}

impl BaseOAuthProvider {
    /// Build the OAuth2 client from concrete endpoints
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Config`] if any URL is invalid.
    pub fn new(
        auth_url: &str,
        token_url: &str,
        config: &ProviderConfig,
    ) -> Result<Self, OAuthError> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(auth_url.to_string())
                    .map_err(|e| OAuthError::Config(format!("invalid auth URL: {e}")))?,
            )
            .set_token_uri(
                TokenUrl::new(token_url.to_string())
                    .map_err(|e| OAuthError::Config(format!("invalid token URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone())
                    .map_err(|e| OAuthError::Config(format!("invalid redirect URI: {e}")))?,
            );

        Ok(Self {
            client,
            http_client: reqwest::Client::new(),
        })
    }

    /// Generate an authorization redirect with PKCE and CSRF state
    #[must_use]
    pub fn authorization_request(&self, scopes: &[String]) -> AuthorizationRequest {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut builder = self.client.authorize_url(CsrfToken::new_random);
        for scope in scopes {
            builder = builder.add_scope(Scope::new(scope.clone()));
        }

        let (url, csrf_state) = builder.set_pkce_challenge(pkce_challenge).url();

        AuthorizationRequest {
            url: url.to_string(),
            state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    /// Exchange an authorization code for an access token
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::TokenExchangeFailed`] if the exchange is
    /// rejected or the transport fails.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<OAuthToken, OAuthError> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&async_http_client)
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(OAuthToken {
            access_token: token_response.access_token().secret().clone(),
            refresh_token: token_response.refresh_token().map(|t| t.secret().clone()),
            expires_at: token_response.expires_in().map(|duration| {
                std::time::SystemTime::now() + std::time::Duration::from_secs(duration.as_secs())
            }),
        })
    }

    /// Fetch a JSON document with a bearer token and optional extra headers
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::UserInfoFailed`] on transport errors, non-2xx
    /// statuses, or unparseable bodies.
    pub async fn fetch_json(
        &self,
        url: &str,
        access_token: &str,
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, OAuthError> {
        let mut request = self.http_client.get(url).bearer_auth(access_token);
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OAuthError::UserInfoFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::UserInfoFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::UserInfoFailed(format!("failed to parse JSON: {e}")))
    }

    /// Reference to the shared reqwest client
    #[must_use]
    pub const fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }
}
