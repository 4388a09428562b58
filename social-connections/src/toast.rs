//! One-shot toast notifications carried across redirects.
//!
//! A toast is JSON in a signed cookie (`en_toast`) attached to a redirect
//! response; the next page render reads it exactly once and removes it.

use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};

/// Cookie carrying the pending toast
pub const TOAST_COOKIE: &str = "en_toast";

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastType {
    /// Something went wrong
    Error,
    /// Action completed
    Success,
    /// Neutral information
    Message,
}

/// One-shot notification shown after a redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Short title
    pub title: String,
    /// Longer description, when useful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Severity
    #[serde(rename = "type")]
    pub toast_type: ToastType,
}

impl Toast {
    /// Error toast
    #[must_use]
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            toast_type: ToastType::Error,
        }
    }

    /// Success toast
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            toast_type: ToastType::Success,
        }
    }

    /// Informational toast
    #[must_use]
    pub fn message(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            toast_type: ToastType::Message,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn toast_cookie(toast: &Toast) -> Cookie<'static> {
    // Serialization of this shape cannot fail; fall back to a bare title
    // rather than panicking in a response path.
    let value = serde_json::to_string(toast)
        .unwrap_or_else(|_| format!(r#"{{"title":"{}","type":"error"}}"#, toast.title));
    Cookie::build((TOAST_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Attach a toast to a redirect response
pub fn redirect_with_toast(
    jar: SignedCookieJar,
    to: &str,
    toast: &Toast,
) -> (SignedCookieJar, Redirect) {
    (jar.add(toast_cookie(toast)), Redirect::to(to))
}

/// Read and remove the pending toast, if any (single-read semantics)
pub fn take_toast(jar: SignedCookieJar) -> (SignedCookieJar, Option<Toast>) {
    let toast = jar
        .get(TOAST_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok());
    let jar = jar.remove(Cookie::build((TOAST_COOKIE, "")).path("/").build());
    (jar, toast)
}
