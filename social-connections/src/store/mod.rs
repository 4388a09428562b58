//! Storage interface consumed by the connection flows.
//!
//! Persistence itself lives outside this crate; the handlers only read and
//! write users, connections, sessions and verification challenges through
//! [`AuthStore`]. The in-memory backend in [`memory`] backs tests and local
//! development.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::oauth2::types::ProviderName;

pub use memory::MemoryStore;

/// Verification kind marking a user as having two-factor auth enabled
pub const TWO_FA_VERIFICATION_TYPE: &str = "2fa";

/// Local user account (owned by the external persistence layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: Uuid,
    /// Email address, stored lowercase
    pub email: String,
    /// Unique handle
    pub username: String,
    /// Display name
    pub name: Option<String>,
}

/// Link between one external identity and exactly one local user
///
/// `(provider_name, provider_id)` is unique across all users; a user holds
/// at most one connection per provider. Rows are created exactly once per
/// successful first-time link and never updated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Primary key
    pub id: Uuid,
    /// Which provider this identity belongs to
    pub provider_name: ProviderName,
    /// Provider-scoped user id
    pub provider_id: String,
    /// Local user the identity is linked to
    pub user_id: Uuid,
    /// When the link was created
    pub created_at: DateTime<Utc>,
}

/// Login session, referenced by the signed session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Primary key, carried in the cookie
    pub id: Uuid,
    /// Session owner
    pub user_id: Uuid,
    /// Hard expiry; sessions past this instant are treated as absent
    pub expiration_date: DateTime<Utc>,
}

/// TOTP verification challenge (2FA); consulted, never mutated, by this flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    /// Challenge kind (e.g. [`TWO_FA_VERIFICATION_TYPE`])
    pub kind: String,
    /// Challenge target (the user id, for 2FA)
    pub target: String,
    /// TOTP shared secret
    pub secret: String,
    /// TOTP hash algorithm
    pub algorithm: String,
    /// TOTP digit count
    pub digits: u32,
    /// TOTP period in seconds
    pub period: u64,
    /// Code character set
    pub charset: String,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Uniqueness invariant violated (duplicate connection)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend failure; propagated as a 500-class response
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Data-access interface for the connection flows
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Look up a user by id
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Look up a user by email, case-insensitively
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Look up a connection by its unique `(provider_name, provider_id)`
    async fn find_connection(
        &self,
        provider_name: ProviderName,
        provider_id: &str,
    ) -> Result<Option<Connection>, StoreError>;

    /// All connections belonging to a user
    async fn connections_for_user(&self, user_id: Uuid) -> Result<Vec<Connection>, StoreError>;

    /// Create a connection linking an external identity to a user
    ///
    /// Fails with [`StoreError::Conflict`] if the identity is already
    /// linked, or the user already holds a connection for this provider.
    async fn create_connection(
        &self,
        user_id: Uuid,
        provider_name: ProviderName,
        provider_id: &str,
    ) -> Result<Connection, StoreError>;

    /// Create a session for a user with the given expiry
    async fn create_session(
        &self,
        user_id: Uuid,
        expiration_date: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    /// Look up a session by id
    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Delete a session (logout); absent sessions are not an error
    async fn delete_session(&self, id: Uuid) -> Result<(), StoreError>;

    /// Look up a verification challenge by kind and target
    async fn find_verification(
        &self,
        kind: &str,
        target: &str,
    ) -> Result<Option<Verification>, StoreError>;
}
