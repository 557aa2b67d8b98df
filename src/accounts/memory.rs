use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AccountStore, StoreError, StoreResult, User, UserId};

struct Inner {
    // keyed by lowercased email
    users: HashMap<String, User>,
    next_id: UserId,
}

impl Inner {
    fn key_of(&self, id: UserId) -> Option<String> {
        self.users
            .iter()
            .find(|(_, u)| u.id == id)
            .map(|(k, _)| k.clone())
    }
}

/// Process-local account store. Data is lost on restart.
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Store holding the demo account `test@example.com` (id 1, no password).
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let inner = store.inner.get_mut();
        inner.users.insert(
            "test@example.com".into(),
            User {
                id: 1,
                email: "test@example.com".into(),
                name: "Test User".into(),
                password_hash: None,
                cumulative_gpa: Some(3.5),
            },
        );
        inner.next_id = 2;
        store
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&email.trim().to_lowercase()).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, email: &str, name: &str, password_hash: &str) -> StoreResult<User> {
        let key = email.to_lowercase();
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&key) {
            return Err(StoreError::EmailTaken);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let user = User {
            id,
            email: email.to_string(),
            name: name.to_string(),
            password_hash: Some(password_hash.to_string()),
            cumulative_gpa: None,
        };
        inner.users.insert(key, user.clone());
        debug!(user_id = id, "in-memory user inserted");
        Ok(user)
    }

    async fn update_name(&self, id: UserId, name: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.values_mut().find(|u| u.id == id) {
            user.name = name.to_string();
        }
        Ok(())
    }

    async fn update_email(&self, id: UserId, new_email: &str) -> StoreResult<()> {
        let new_key = new_email.to_lowercase();
        let mut inner = self.inner.write().await;
        if let Some(holder) = inner.users.get(&new_key) {
            if holder.id != id {
                return Err(StoreError::EmailTaken);
            }
        }
        let Some(old_key) = inner.key_of(id) else {
            return Ok(());
        };
        if let Some(mut user) = inner.users.remove(&old_key) {
            user.email = new_email.to_string();
            inner.users.insert(new_key, user);
        }
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.values_mut().find(|u| u.id == id) {
            user.password_hash = Some(password_hash.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_store_has_demo_account() {
        let store = MemoryAccountStore::seeded();
        let demo = store.find_by_id(1).await.unwrap().expect("demo user");
        assert_eq!(demo.email, "test@example.com");
        assert_eq!(demo.name, "Test User");
        assert!(demo.password_hash.is_none());
        assert_eq!(demo.cumulative_gpa, Some(3.5));

        let created = store.insert("new@x.com", "", "hash").await.unwrap();
        assert_eq!(created.id, 2);
    }

    #[tokio::test]
    async fn lookup_by_email_ignores_case() {
        let store = MemoryAccountStore::new();
        let user = store.insert("user@x.com", "U", "hash").await.unwrap();
        let found = store.find_by_email("USER@X.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryAccountStore::new();
        store.insert("dup@x.com", "", "h1").await.unwrap();
        let err = store.insert("DUP@x.com", "", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[tokio::test]
    async fn update_email_rekeys_index() {
        let store = MemoryAccountStore::new();
        let user = store.insert("old@x.com", "", "h").await.unwrap();
        store.update_email(user.id, "new@x.com").await.unwrap();

        assert!(store.find_by_email("old@x.com").await.unwrap().is_none());
        let moved = store.find_by_email("new@x.com").await.unwrap().unwrap();
        assert_eq!(moved.id, user.id);
        assert_eq!(moved.email, "new@x.com");

        // the freed address can be claimed again
        store.insert("old@x.com", "", "h").await.unwrap();
    }

    #[tokio::test]
    async fn update_email_to_own_address_is_allowed() {
        let store = MemoryAccountStore::new();
        let user = store.insert("me@x.com", "", "h").await.unwrap();
        store.update_email(user.id, "me@x.com").await.unwrap();
        assert_eq!(store.find_by_email("me@x.com").await.unwrap().unwrap().id, user.id);
    }

    #[tokio::test]
    async fn update_email_rejects_address_of_other_user() {
        let store = MemoryAccountStore::new();
        let a = store.insert("a@x.com", "", "h").await.unwrap();
        store.insert("b@x.com", "", "h").await.unwrap();
        let err = store.update_email(a.id, "b@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[tokio::test]
    async fn name_and_password_updates_apply() {
        let store = MemoryAccountStore::new();
        let user = store.insert("n@x.com", "before", "h1").await.unwrap();
        store.update_name(user.id, "after").await.unwrap();
        store.update_password(user.id, "h2").await.unwrap();

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.name, "after");
        assert_eq!(user.password_hash.as_deref(), Some("h2"));
    }

    #[tokio::test]
    async fn updates_on_unknown_id_are_noops() {
        let store = MemoryAccountStore::new();
        store.update_name(42, "x").await.unwrap();
        store.update_email(42, "x@x.com").await.unwrap();
        store.update_password(42, "h").await.unwrap();
        assert!(store.find_by_email("x@x.com").await.unwrap().is_none());
    }
}
