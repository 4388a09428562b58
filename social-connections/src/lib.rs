//! Social login connections: OAuth2/OIDC account linking for web sessions.
//!
//! Implements the "connect your Google/GitHub account" flows: initiating an
//! authorization redirect, handling the provider callback with an
//! account-linking decision procedure, diverting to two-factor verification
//! when the user has it enabled, and listing linked accounts. Persistence is
//! consumed through the [`store::AuthStore`] trait; an in-memory backend
//! serves tests and local development.
//!
//! Providers configured with a `MOCK_`-prefixed client id run fully offline
//! against deterministic fixtures; the [`testing`] module additionally
//! serves a mock provider over HTTP for end-to-end tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod oauth2;
pub mod state;
pub mod store;
pub mod testing;
pub mod toast;
