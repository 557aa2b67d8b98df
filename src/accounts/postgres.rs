use async_trait::async_trait;
use sqlx::PgPool;

use super::{AccountStore, StoreError, StoreResult, User, UserId};

const FIND_BY_EMAIL: &str = r#"
    SELECT user_id, email, name, password_hash, cumulative_gpa
    FROM users
    WHERE LOWER(email) = LOWER($1)
"#;

const FIND_BY_ID: &str = r#"
    SELECT user_id, email, name, password_hash, cumulative_gpa
    FROM users
    WHERE user_id = $1
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users (email, name, password_hash)
    VALUES ($1, $2, $3)
    RETURNING user_id, email, name, password_hash, cumulative_gpa
"#;

const UPDATE_NAME: &str = "UPDATE users SET name = $1 WHERE user_id = $2";
const UPDATE_EMAIL: &str = "UPDATE users SET email = $1 WHERE user_id = $2";
const UPDATE_PASSWORD: &str = "UPDATE users SET password_hash = $1 WHERE user_id = $2";

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::EmailTaken,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(FIND_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(FIND_BY_ID)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn insert(&self, email: &str, name: &str, password_hash: &str) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(INSERT_USER)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique)?;
        Ok(user)
    }

    async fn update_name(&self, id: UserId, name: &str) -> StoreResult<()> {
        sqlx::query(UPDATE_NAME)
            .bind(name)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn update_email(&self, id: UserId, new_email: &str) -> StoreResult<()> {
        sqlx::query(UPDATE_EMAIL)
            .bind(new_email)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(map_unique)?;
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> StoreResult<()> {
        sqlx::query(UPDATE_PASSWORD)
            .bind(password_hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
