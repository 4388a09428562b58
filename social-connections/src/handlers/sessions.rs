//! Session teardown.

use axum::extract::State;
use axum::response::Redirect;
use axum_extra::extract::cookie::SignedCookieJar;
use uuid::Uuid;

use crate::auth::{self, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::AppState;

/// `POST /logout`: delete the session row and clear the cookie
///
/// Idempotent: a missing or stale cookie still clears and redirects.
///
/// # Errors
///
/// Storage failures map to `500`.
pub async fn logout(
    State(app): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Redirect), AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(session_id) = Uuid::parse_str(cookie.value()) {
            app.store.delete_session(session_id).await?;
        }
    }
    let jar = jar.remove(auth::remove_cookie(SESSION_COOKIE));
    Ok((jar, Redirect::to("/")))
}
