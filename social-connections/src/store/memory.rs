//! In-memory [`AuthStore`] backend.
//!
//! Backs tests and local development; a real deployment plugs a relational
//! implementation of [`AuthStore`] into `AppState` instead.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AuthStore, Connection, Session, StoreError, User, Verification};
use crate::oauth2::types::ProviderName;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    connections: HashMap<Uuid, Connection>,
    sessions: HashMap<Uuid, Session>,
    verifications: HashMap<(String, String), Verification>,
}

/// Thread-safe in-memory store
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user (test/dev helper; user creation is otherwise owned by
    /// the external onboarding flow)
    pub fn insert_user(&self, email: &str, username: &str, name: Option<&str>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            username: username.to_string(),
            name: name.map(ToString::to_string),
        };
        self.inner.write().users.insert(user.id, user.clone());
        user
    }

    /// Seed a verification challenge (created out-of-band in production)
    pub fn insert_verification(&self, verification: Verification) {
        self.inner.write().verifications.insert(
            (verification.kind.clone(), verification.target.clone()),
            verification,
        );
    }

    /// Number of stored sessions (test helper)
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }

    /// Number of stored connections (test helper)
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_connection(
        &self,
        provider_name: ProviderName,
        provider_id: &str,
    ) -> Result<Option<Connection>, StoreError> {
        Ok(self
            .inner
            .read()
            .connections
            .values()
            .find(|c| c.provider_name == provider_name && c.provider_id == provider_id)
            .cloned())
    }

    async fn connections_for_user(&self, user_id: Uuid) -> Result<Vec<Connection>, StoreError> {
        let mut connections: Vec<Connection> = self
            .inner
            .read()
            .connections
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        connections.sort_by_key(|c| c.created_at);
        Ok(connections)
    }

    async fn create_connection(
        &self,
        user_id: Uuid,
        provider_name: ProviderName,
        provider_id: &str,
    ) -> Result<Connection, StoreError> {
        let mut inner = self.inner.write();

        if inner
            .connections
            .values()
            .any(|c| c.provider_name == provider_name && c.provider_id == provider_id)
        {
            return Err(StoreError::Conflict(format!(
                "{provider_name} identity {provider_id} is already linked"
            )));
        }
        if inner
            .connections
            .values()
            .any(|c| c.user_id == user_id && c.provider_name == provider_name)
        {
            return Err(StoreError::Conflict(format!(
                "user {user_id} already has a {provider_name} connection"
            )));
        }

        let connection = Connection {
            id: Uuid::new_v4(),
            provider_name,
            provider_id: provider_id.to_string(),
            user_id,
            created_at: Utc::now(),
        };
        inner.connections.insert(connection.id, connection.clone());
        Ok(connection)
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expiration_date: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            expiration_date,
        };
        self.inner.write().sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.read().sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.write().sessions.remove(&id);
        Ok(())
    }

    async fn find_verification(
        &self,
        kind: &str,
        target: &str,
    ) -> Result<Option<Verification>, StoreError> {
        Ok(self
            .inner
            .read()
            .verifications
            .get(&(kind.to_string(), target.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TWO_FA_VERIFICATION_TYPE;

    fn totp(target: &str) -> Verification {
        Verification {
            kind: TWO_FA_VERIFICATION_TYPE.to_string(),
            target: target.to_string(),
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            algorithm: "SHA-1".to_string(),
            digits: 6,
            period: 30,
            charset: "0123456789".to_string(),
        }
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let user = store.insert_user("Kody@Example.COM", "kody", None);

        let found = store.find_user_by_email("KODY@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);

        let by_id = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "kody@example.com");
    }

    #[tokio::test]
    async fn duplicate_identity_is_a_conflict() {
        let store = MemoryStore::new();
        let a = store.insert_user("a@example.com", "a", None);
        let b = store.insert_user("b@example.com", "b", None);

        store
            .create_connection(a.id, ProviderName::Google, "sub-1")
            .await
            .unwrap();
        let err = store
            .create_connection(b.id, ProviderName::Google, "sub-1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn one_connection_per_provider_per_user() {
        let store = MemoryStore::new();
        let user = store.insert_user("a@example.com", "a", None);

        store
            .create_connection(user.id, ProviderName::GitHub, "gh-1")
            .await
            .unwrap();
        let err = store
            .create_connection(user.id, ProviderName::GitHub, "gh-2")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // A different provider is fine
        store
            .create_connection(user.id, ProviderName::Google, "sub-1")
            .await
            .unwrap();
        assert_eq!(store.connection_count(), 2);
    }

    #[tokio::test]
    async fn sessions_round_trip_and_delete() {
        let store = MemoryStore::new();
        let user = store.insert_user("a@example.com", "a", None);
        let session = store
            .create_session(user.id, Utc::now() + chrono::Duration::days(30))
            .await
            .unwrap();

        let found = store.find_session(session.id).await.unwrap().unwrap();
        assert_eq!(found.user_id, user.id);

        store.delete_session(session.id).await.unwrap();
        assert!(store.find_session(session.id).await.unwrap().is_none());
        // Deleting again is a no-op
        store.delete_session(session.id).await.unwrap();
    }

    #[tokio::test]
    async fn verification_lookup_by_kind_and_target() {
        let store = MemoryStore::new();
        let user = store.insert_user("a@example.com", "a", None);
        store.insert_verification(totp(&user.id.to_string()));

        let found = store
            .find_verification(TWO_FA_VERIFICATION_TYPE, &user.id.to_string())
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = store
            .find_verification("onboarding", &user.id.to_string())
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
