//! In-process mock provider for integration tests.
//!
//! Serves just enough of a provider to satisfy both strategies on one
//! ephemeral port: an OIDC discovery document, a token endpoint, a Google
//! userinfo endpoint, and the GitHub REST endpoints (`/user`,
//! `/user/emails`, user-by-id). Fixture data matches the providers' mock
//! profiles so assertions line up either way.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::oauth2::providers::{github, google};

/// Access token the mock token endpoint hands out
pub const MOCK_ACCESS_TOKEN: &str = "__MOCK_ACCESS_TOKEN__";

/// Failure-path knobs for the mock provider
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBehavior {
    /// Token endpoint rejects every exchange
    pub fail_token: bool,
    /// Userinfo reports the email as unverified
    pub unverified_email: bool,
}

#[derive(Clone)]
struct MockState {
    base_url: String,
    behavior: MockBehavior,
}

/// Router implementing the mock provider endpoints
///
/// `base_url` is embedded in the discovery document and profile links;
/// `behavior` selects the failure paths to simulate.
pub fn mock_provider_router(base_url: &str, behavior: MockBehavior) -> Router {
    let state = MockState {
        base_url: base_url.to_string(),
        behavior,
    };
    Router::new()
        .route("/.well-known/openid-configuration", get(discovery))
        .route("/token", post(token))
        .route("/userinfo", get(userinfo))
        .route("/avatar.png", get(avatar))
        .route("/user", get(github_user))
        .route("/user/emails", get(github_emails))
        .route("/user/{id}", get(github_user_by_id))
        .with_state(state)
}

/// Running mock provider bound to an ephemeral port
pub struct MockProvider {
    /// Base URL of the mock, e.g. `http://127.0.0.1:49152`
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl MockProvider {
    /// Endpoint URL under the mock's base
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Bind the mock provider on `127.0.0.1:0` and serve it in the background
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn spawn_mock_provider(behavior: MockBehavior) -> std::io::Result<MockProvider> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let router = mock_provider_router(&base_url, behavior);
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(MockProvider { base_url, handle })
}

async fn discovery(State(state): State<MockState>) -> Json<serde_json::Value> {
    let base = &state.base_url;
    Json(json!({
        "issuer": base,
        "authorization_endpoint": format!("{base}/authorize"),
        "token_endpoint": format!("{base}/token"),
        "userinfo_endpoint": format!("{base}/userinfo"),
        "jwks_uri": format!("{base}/jwks"),
        "response_types_supported": ["code"],
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": ["RS256"],
    }))
}

async fn token(State(state): State<MockState>) -> impl IntoResponse {
    if state.behavior.fail_token {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": MOCK_ACCESS_TOKEN,
            "token_type": "bearer",
            "expires_in": 3600,
        })),
    )
}

async fn userinfo(State(state): State<MockState>) -> Json<serde_json::Value> {
    let profile = google::mock_profile();
    Json(json!({
        "sub": profile.id,
        "email": profile.email,
        "email_verified": !state.behavior.unverified_email,
        "name": profile.name,
        "preferred_username": profile.username,
        "picture": format!("{}/avatar.png", state.base_url),
    }))
}

async fn avatar() -> impl IntoResponse {
    // 1x1 transparent PNG
    const PIXEL: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];
    ([("content-type", "image/png")], PIXEL)
}

async fn github_user(State(state): State<MockState>) -> Json<serde_json::Value> {
    let profile = github::mock_profile();
    Json(json!({
        "id": profile.id.parse::<i64>().unwrap_or(0),
        "login": profile.username,
        "name": profile.name,
        "avatar_url": format!("{}/avatar.png", state.base_url),
    }))
}

async fn github_emails() -> Json<serde_json::Value> {
    let profile = github::mock_profile();
    Json(json!([
        { "email": profile.email, "verified": true, "primary": true },
        { "email": "secondary@example.com", "verified": false, "primary": false },
    ]))
}

async fn github_user_by_id(Path(id): Path<String>) -> impl IntoResponse {
    let profile = github::mock_profile();
    if id != profile.id {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })));
    }
    let login = profile.username.unwrap_or(profile.id);
    (
        StatusCode::OK,
        Json(json!({
            "login": login,
            "html_url": format!("https://github.com/{login}"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn discovery_points_at_the_mock() {
        let mock = spawn_mock_provider(MockBehavior::default()).await.unwrap();
        let document = crate::oauth2::providers::base::discover(&mock.base_url)
            .await
            .unwrap();
        assert_eq!(document.token_endpoint, mock.url("/token"));
        assert_eq!(document.userinfo_endpoint, mock.url("/userinfo"));
    }

    #[tokio::test]
    async fn token_endpoint_can_be_forced_to_fail() {
        let mock = spawn_mock_provider(MockBehavior {
            fail_token: true,
            ..MockBehavior::default()
        })
        .await
        .unwrap();
        let response = reqwest::Client::new()
            .post(mock.url("/token"))
            .form(&[("grant_type", "authorization_code")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn github_fixture_endpoints_line_up() {
        let mock = spawn_mock_provider(MockBehavior::default()).await.unwrap();
        let client = reqwest::Client::new();

        let user: serde_json::Value = client
            .get(mock.url("/user"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(user["login"], "mock-github-user");

        let by_id: serde_json::Value = client
            .get(mock.url("/user/1138"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(by_id["html_url"], "https://github.com/mock-github-user");
    }
}
