//! Session and flow cookies.
//!
//! Everything here is a signed cookie keyed by the configured session
//! secret:
//!
//! - `en_session`: the login session id, expiring with the session row
//! - `en_connection`: OAuth `state` + PKCE verifier across the provider
//!   redirect (10 minutes)
//! - `en_redirect_to`: post-login redirect hint across the provider
//!   redirect (10 minutes)
//! - `en_onboarding`: the external profile handed to the onboarding flow
//!   when no local account matches (10 minutes)

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::oauth2::types::ExternalProfile;
use crate::store::{AuthStore, Session, StoreError};

/// Login session cookie
pub const SESSION_COOKIE: &str = "en_session";
/// Connection-flow cookie (OAuth state + PKCE verifier)
pub const CONNECTION_COOKIE: &str = "en_connection";
/// Redirect-target hint cookie
pub const REDIRECT_TO_COOKIE: &str = "en_redirect_to";
/// Onboarding profile cookie
pub const ONBOARDING_COOKIE: &str = "en_onboarding";

const FLOW_COOKIE_MINUTES: i64 = 10;

/// Compute a fresh session expiry from the configured TTL
#[must_use]
pub fn session_expiration_date(ttl_days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(ttl_days)
}

/// State carried across the provider redirect in `en_connection`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionFlow {
    /// OAuth CSRF state token
    pub state: String,
    /// PKCE verifier matching the authorization request
    pub pkce_verifier: String,
}

fn flow_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(FLOW_COOKIE_MINUTES))
        .build()
}

/// Removal cookie for a root-scoped cookie
#[must_use]
pub fn remove_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Build the connection-flow cookie
#[must_use]
pub fn connection_cookie(flow: &ConnectionFlow) -> Cookie<'static> {
    let value = serde_json::to_string(flow).unwrap_or_default();
    flow_cookie(CONNECTION_COOKIE, value)
}

/// Build the redirect-target hint cookie
#[must_use]
pub fn redirect_to_cookie(redirect_to: &str) -> Cookie<'static> {
    flow_cookie(REDIRECT_TO_COOKIE, redirect_to.to_string())
}

/// Build the onboarding cookie carrying the external profile
#[must_use]
pub fn onboarding_cookie(profile: &ExternalProfile) -> Cookie<'static> {
    let value = serde_json::to_string(profile).unwrap_or_default();
    flow_cookie(ONBOARDING_COOKIE, value)
}

/// Build the session cookie, expiring with the session row
#[must_use]
pub fn session_cookie(session: &Session) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(session.expiration_date.timestamp()) {
        builder = builder.expires(expires);
    }
    builder.build()
}

/// Read and remove the connection-flow cookie
pub fn take_connection_flow(jar: SignedCookieJar) -> (SignedCookieJar, Option<ConnectionFlow>) {
    let flow = jar
        .get(CONNECTION_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok());
    (jar.remove(remove_cookie(CONNECTION_COOKIE)), flow)
}

/// Read and remove the redirect-target hint cookie
pub fn take_redirect_to(jar: SignedCookieJar) -> (SignedCookieJar, Option<String>) {
    let redirect_to = jar
        .get(REDIRECT_TO_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|v| !v.is_empty());
    (jar.remove(remove_cookie(REDIRECT_TO_COOKIE)), redirect_to)
}

/// Resolve the user bound to the current session cookie, if any
///
/// An unknown or expired session reads as "no session"; only backend
/// failures surface as errors.
///
/// # Errors
///
/// Returns [`StoreError`] if the session lookup fails.
pub async fn session_user_id(
    store: &dyn AuthStore,
    jar: &SignedCookieJar,
) -> Result<Option<Uuid>, StoreError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let Ok(session_id) = Uuid::parse_str(cookie.value()) else {
        return Ok(None);
    };
    let Some(session) = store.find_session(session_id).await? else {
        return Ok(None);
    };
    if session.expiration_date <= Utc::now() {
        return Ok(None);
    }
    Ok(Some(session.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiration_honors_ttl() {
        let expiry = session_expiration_date(30);
        let days = (expiry - Utc::now()).num_days();
        assert!((29..=30).contains(&days));
    }

    #[test]
    fn flow_cookies_are_short_lived() {
        let cookie = redirect_to_cookie("/settings/profile/connections");
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(10)));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn connection_cookie_round_trips_the_flow() {
        let flow = ConnectionFlow {
            state: "state-token".to_string(),
            pkce_verifier: "verifier".to_string(),
        };
        let cookie = connection_cookie(&flow);
        let back: ConnectionFlow = serde_json::from_str(cookie.value()).unwrap();
        assert_eq!(back.state, flow.state);
        assert_eq!(back.pkce_verifier, flow.pkce_verifier);
    }

    #[test]
    fn session_cookie_expires_with_the_session() {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expiration_date: Utc::now() + Duration::days(30),
        };
        let cookie = session_cookie(&session);
        assert_eq!(cookie.value(), session.id.to_string());
        assert!(cookie.expires_datetime().is_some());
    }
}
