//! Account persistence.
//!
//! `AccountStore` is implemented by a Postgres backend and an in-memory
//! fallback; the one in use is picked at startup from configuration.

use async_trait::async_trait;

mod memory;
mod postgres;
mod repo_types;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;
pub use repo_types::{normalize_email, User, UserId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User persistence operations shared by every backend.
///
/// Emails passed in are expected to be normalized already; lookups still
/// compare case-insensitively. Updates against an unknown id are no-ops.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Create a user. Fails with [`StoreError::EmailTaken`] if the email exists.
    async fn insert(&self, email: &str, name: &str, password_hash: &str) -> StoreResult<User>;

    async fn update_name(&self, id: UserId, name: &str) -> StoreResult<()>;

    /// Fails with [`StoreError::EmailTaken`] if another user holds `new_email`.
    async fn update_email(&self, id: UserId, new_email: &str) -> StoreResult<()>;

    async fn update_password(&self, id: UserId, password_hash: &str) -> StoreResult<()>;
}
