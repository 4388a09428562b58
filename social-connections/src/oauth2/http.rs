//! Shared HTTP client for OAuth2 token exchange requests.
//!
//! The `oauth2` crate is transport-agnostic; this module supplies the one
//! reqwest-backed client every provider hands to `request_async`. Redirects
//! are disabled per the OAuth2 spec.

use once_cell::sync::Lazy;
use thiserror::Error;

static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_default()
});

/// Transport errors from the token exchange
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// Request failed to send or the body could not be read
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// Response could not be rebuilt into an `http` response
    #[error(transparent)]
    Http(#[from] http::Error),
}

/// Async HTTP client bridging `oauth2::HttpRequest` to reqwest
///
/// # Errors
///
/// Returns [`HttpClientError`] if the request fails to send or the response
/// cannot be read back.
pub async fn async_http_client(
    request: oauth2::HttpRequest,
) -> Result<oauth2::HttpResponse, HttpClientError> {
    let method = request.method().clone();
    let url = request.uri().to_string();
    let headers = request.headers().clone();
    let body = request.into_body();

    let mut request_builder = CLIENT.request(method, &url).body(body);
    for (name, value) in &headers {
        request_builder = request_builder.header(name.as_str(), value.as_bytes());
    }

    let response = request_builder.send().await?;

    let status_code = response.status();
    let headers = response.headers().to_owned();
    let body = response.bytes().await?.to_vec();

    let mut builder = http::Response::builder().status(status_code);
    for (name, value) in &headers {
        builder = builder.header(name, value);
    }

    Ok(builder.body(body)?)
}
