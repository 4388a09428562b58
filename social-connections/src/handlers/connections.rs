//! Social login connection flows.
//!
//! `POST /auth/{provider}` starts the authorization redirect,
//! `GET /auth/{provider}/callback` completes it and runs the
//! account-linking decision procedure, and
//! `GET /settings/profile/connections` lists the session user's linked
//! accounts.

use std::collections::BTreeMap;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header::REFERER, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{self, ConnectionFlow};
use crate::error::AppError;
use crate::oauth2::providers::AuthProvider;
use crate::oauth2::types::{ConnectionData, ExternalProfile, OAuthError, ProviderName};
use crate::state::AppState;
use crate::store::{StoreError, TWO_FA_VERIFICATION_TYPE};
use crate::toast::{self, Toast};

const CONNECTIONS_PATH: &str = "/settings/profile/connections";

/// Optional form body on initiation
#[derive(Debug, Deserialize)]
pub struct ConnectionForm {
    /// Where to land after a successful login
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// Callback query parameters from the provider
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code
    pub code: Option<String>,
    /// CSRF state token
    pub state: Option<String>,
    /// Provider-reported error code (user denied, etc.)
    pub error: Option<String>,
}

/// `GET /auth/{provider}`: browsers landing here directly go to login
pub async fn auth_redirect() -> Redirect {
    Redirect::to("/login")
}

/// `POST /auth/{provider}`: start the authorization redirect
///
/// Sets the connection-flow cookie (state + PKCE verifier) and, when a
/// redirect target is known, the redirect hint cookie. Mock mode skips the
/// provider and redirects straight to the callback with the mock code.
///
/// # Errors
///
/// `404` for an unknown or unconfigured provider.
pub async fn initiate(
    State(app): State<AppState>,
    Path(provider): Path<String>,
    jar: SignedCookieJar,
    headers: HeaderMap,
    form: Result<Form<ConnectionForm>, FormRejection>,
) -> Result<Response, AppError> {
    let (provider_name, provider) = resolve_provider(&app, &provider)?;

    // The form body is optional; initiation may arrive with no body at all
    let redirect_to = form
        .ok()
        .and_then(|Form(form)| form.redirect_to)
        .filter(|target| !target.is_empty())
        .or_else(|| referer_path(&headers));

    let mut jar = jar;
    if let Some(target) = &redirect_to {
        jar = jar.add(auth::redirect_to_cookie(target));
    }

    if provider.mock_enabled() {
        let state_token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let flow = ConnectionFlow {
            state: state_token.clone(),
            pkce_verifier: String::new(),
        };
        jar = jar.add(auth::connection_cookie(&flow));
        let url = format!(
            "/auth/{provider_name}/callback?code={}&state={state_token}",
            provider.mock_code()
        );
        tracing::debug!(provider = %provider_name, "mock initiation, skipping provider");
        return Ok((jar, Redirect::to(&url)).into_response());
    }

    let request = provider.authorization_request();
    let flow = ConnectionFlow {
        state: request.state,
        pkce_verifier: request.pkce_verifier,
    };
    jar = jar.add(auth::connection_cookie(&flow));
    Ok((jar, Redirect::to(&request.url)).into_response())
}

/// `GET /auth/{provider}/callback`: complete the exchange and link
///
/// Decision procedure, in order:
///
/// 1. existing connection + logged in: informational toast when it is the
///    session user's own connection, error toast when it belongs to another
///    account
/// 2. logged in, no existing connection: link to the session user
/// 3. existing connection, not logged in: log in as its owner
/// 4. a local user matches the profile email: auto-link and log in
/// 5. otherwise: divert to onboarding with the profile in a signed cookie
///
/// # Errors
///
/// `404` for an unknown provider; storage failures map to `500`. Upstream
/// auth failures do not error: they redirect to `/login` with a toast.
pub async fn callback(
    State(app): State<AppState>,
    Path(provider): Path<String>,
    jar: SignedCookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let (provider_name, provider) = resolve_provider(&app, &provider)?;
    let (jar, flow) = auth::take_connection_flow(jar);
    let (jar, redirect_to) = auth::take_redirect_to(jar);

    let profile = match authenticate_callback(provider.as_ref(), flow, &query).await {
        Ok(profile) => profile,
        Err(err) => return Ok(auth_failed(jar, provider_name, &err)),
    };

    let session_user = auth::session_user_id(app.store.as_ref(), &jar).await?;
    let existing = app.store.find_connection(provider_name, &profile.id).await?;
    let label = provider_name.label();
    let name = profile.display_name().to_string();

    match (existing, session_user) {
        (Some(connection), Some(user_id)) => {
            let toast = if connection.user_id == user_id {
                Toast::message("Already Connected").with_description(format!(
                    "Your \"{name}\" {label} account is already connected."
                ))
            } else {
                Toast::error("Already Connected").with_description(format!(
                    "The \"{name}\" {label} account is already connected to another account."
                ))
            };
            let (jar, redirect) = toast::redirect_with_toast(jar, CONNECTIONS_PATH, &toast);
            Ok((jar, redirect).into_response())
        }

        (None, Some(user_id)) => {
            match app
                .store
                .create_connection(user_id, provider_name, &profile.id)
                .await
            {
                Ok(_) => {
                    let toast = Toast::success("Connected").with_description(format!(
                        "Your \"{name}\" {label} account has been connected."
                    ));
                    let (jar, redirect) =
                        toast::redirect_with_toast(jar, CONNECTIONS_PATH, &toast);
                    Ok((jar, redirect).into_response())
                }
                Err(StoreError::Conflict(_)) => {
                    let toast = Toast::error("Already Connected").with_description(format!(
                        "The \"{name}\" {label} account is already connected to another account."
                    ));
                    let (jar, redirect) =
                        toast::redirect_with_toast(jar, CONNECTIONS_PATH, &toast);
                    Ok((jar, redirect).into_response())
                }
                Err(err) => Err(err.into()),
            }
        }

        (Some(connection), None) => {
            make_session(&app, jar, connection.user_id, redirect_to, None).await
        }

        (None, None) => {
            if let Some(user) = app.store.find_user_by_email(&profile.email).await? {
                match app
                    .store
                    .create_connection(user.id, provider_name, &profile.id)
                    .await
                {
                    Ok(_) => {
                        let toast = Toast::message("Connected").with_description(format!(
                            "Your \"{name}\" {label} account has been connected."
                        ));
                        make_session(&app, jar, user.id, redirect_to, Some(toast)).await
                    }
                    Err(StoreError::Conflict(_)) => {
                        let toast = Toast::error("Already Connected").with_description(format!(
                            "The \"{name}\" {label} account is already connected to another account."
                        ));
                        let (jar, redirect) = toast::redirect_with_toast(jar, "/login", &toast);
                        Ok((jar, redirect).into_response())
                    }
                    Err(err) => Err(err.into()),
                }
            } else {
                let jar = jar.add(auth::onboarding_cookie(&profile));
                Ok((jar, Redirect::to(&format!("/onboarding/{provider_name}"))).into_response())
            }
        }
    }
}

/// One connection in the listing response
#[derive(Debug, Serialize)]
pub struct ConnectionView {
    /// Connection row id
    pub id: Uuid,
    /// Provider the identity belongs to
    pub provider_name: ProviderName,
    /// Display name resolved from the provider (best effort)
    pub display_name: String,
    /// Profile link, when the provider exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// When the identity was linked
    pub created_at: DateTime<Utc>,
}

/// Listing response body
#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    /// The session user's linked accounts
    pub connections: Vec<ConnectionView>,
}

/// `GET /settings/profile/connections`: list the session user's
/// connections, enriched with provider display data
///
/// # Errors
///
/// `401` without a valid session; storage failures map to `500`.
pub async fn list_connections(
    State(app): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Json<ConnectionsResponse>, AppError> {
    let Some(user_id) = auth::session_user_id(app.store.as_ref(), &jar).await? else {
        return Err(AppError::Unauthorized("login required".to_string()));
    };

    let mut views = Vec::new();
    for connection in app.store.connections_for_user(user_id).await? {
        let data = match app.providers.get(connection.provider_name) {
            Some(provider) => provider.resolve_connection_data(&connection.provider_id).await,
            None => ConnectionData {
                display_name: "Unknown".to_string(),
                link: None,
            },
        };
        views.push(ConnectionView {
            id: connection.id,
            provider_name: connection.provider_name,
            display_name: data.display_name,
            link: data.link,
            created_at: connection.created_at,
        });
    }

    Ok(Json(ConnectionsResponse { connections: views }))
}

fn resolve_provider(
    app: &AppState,
    name: &str,
) -> Result<(ProviderName, std::sync::Arc<dyn AuthProvider>), AppError> {
    let provider_name: ProviderName = name
        .parse()
        .map_err(|_| AppError::NotFound(format!("unknown provider: {name}")))?;
    let provider = app
        .providers
        .get(provider_name)
        .ok_or_else(|| AppError::NotFound(format!("provider {provider_name} is not configured")))?;
    Ok((provider_name, provider))
}

fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(REFERER)?.to_str().ok()?;
    let url = url::Url::parse(referer).ok()?;
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}

async fn authenticate_callback(
    provider: &dyn AuthProvider,
    flow: Option<ConnectionFlow>,
    query: &CallbackQuery,
) -> Result<ExternalProfile, OAuthError> {
    if let Some(error) = &query.error {
        return Err(OAuthError::InvalidCallback(format!(
            "provider returned error: {error}"
        )));
    }
    let code = query
        .code
        .as_deref()
        .ok_or_else(|| OAuthError::InvalidCallback("missing code".to_string()))?;
    let state = query
        .state
        .as_deref()
        .ok_or_else(|| OAuthError::InvalidCallback("missing state".to_string()))?;
    let flow = flow
        .ok_or_else(|| OAuthError::InvalidCallback("missing connection flow cookie".to_string()))?;
    if flow.state != state {
        return Err(OAuthError::InvalidCallback("state mismatch".to_string()));
    }

    provider.authenticate(code, &flow.pkce_verifier).await
}

fn auth_failed(jar: SignedCookieJar, provider: ProviderName, err: &OAuthError) -> Response {
    tracing::error!(provider = %provider, error = %err, "authentication failed");
    let label = provider.label();
    let toast = if matches!(err, OAuthError::EmailNotVerified) {
        Toast::error(format!("Cannot connect {label} Account"))
            .with_description(format!("Your {label} Email is Unverified"))
    } else {
        Toast::error("Auth Failed")
            .with_description(format!("There was an error authenticating with {label}."))
    };
    let (jar, redirect) = toast::redirect_with_toast(jar, "/login", &toast);
    (jar, redirect).into_response()
}

/// Log the user in, diverting to `/verify` first when they have 2FA enabled
async fn make_session(
    app: &AppState,
    jar: SignedCookieJar,
    user_id: Uuid,
    redirect_to: Option<String>,
    toast: Option<Toast>,
) -> Result<Response, AppError> {
    let redirect_target = redirect_to.unwrap_or_else(|| "/".to_string());

    let two_fa = app
        .store
        .find_verification(TWO_FA_VERIFICATION_TYPE, &user_id.to_string())
        .await?;
    if two_fa.is_some() {
        // No session until the code is verified; any pending toast rides
        // along to the verify page
        let url = verify_url(&redirect_target, user_id);
        return Ok(match toast {
            Some(toast) => {
                let (jar, redirect) = toast::redirect_with_toast(jar, &url, &toast);
                (jar, redirect).into_response()
            }
            None => (jar, Redirect::to(&url)).into_response(),
        });
    }

    let expiration = auth::session_expiration_date(app.config.session.ttl_days);
    let session = app.store.create_session(user_id, expiration).await?;
    let jar = jar.add(auth::session_cookie(&session));

    match toast {
        Some(toast) => {
            let (jar, redirect) = toast::redirect_with_toast(jar, &redirect_target, &toast);
            Ok((jar, redirect).into_response())
        }
        None => Ok((jar, Redirect::to(&redirect_target)).into_response()),
    }
}

fn verify_url(redirect_to: &str, user_id: Uuid) -> String {
    // BTreeMap keeps the query keys sorted
    let mut params = BTreeMap::new();
    params.insert("redirectTo", redirect_to.to_string());
    params.insert("remember", "on".to_string());
    params.insert("target", user_id.to_string());
    params.insert("type", TWO_FA_VERIFICATION_TYPE.to_string());
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&params)
        .finish();
    format!("/verify?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_url_keys_are_sorted() {
        let user_id = Uuid::nil();
        let url = verify_url("/dashboard", user_id);
        assert_eq!(
            url,
            format!("/verify?redirectTo=%2Fdashboard&remember=on&target={user_id}&type=2fa")
        );
    }

    #[test]
    fn referer_fallback_keeps_path_and_query() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REFERER,
            "http://localhost:3000/settings/profile?tab=connections"
                .parse()
                .unwrap(),
        );
        assert_eq!(
            referer_path(&headers).as_deref(),
            Some("/settings/profile?tab=connections")
        );
    }

    #[test]
    fn referer_fallback_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, "not a url".parse().unwrap());
        assert!(referer_path(&headers).is_none());
    }
}
