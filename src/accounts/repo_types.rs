use serde::Serialize;
use sqlx::FromRow;

pub type UserId = i64;

/// User record as stored by either backend.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    #[serde(rename = "user_id")]
    #[sqlx(rename = "user_id")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 PHC or legacy bcrypt, not exposed in JSON
    pub cumulative_gpa: Option<f64>,
}

impl User {
    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Trim and lowercase an email; `None` when nothing is left.
pub fn normalize_email(raw: Option<&str>) -> Option<String> {
    let email = raw?.trim().to_lowercase();
    if email.is_empty() {
        None
    } else {
        Some(email)
    }
}
