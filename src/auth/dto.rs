use serde::{Deserialize, Serialize};

use crate::accounts::{User, UserId};

/// Request body for signup. Presence is checked by the handler.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub cumulative_gpa: Option<f64>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            email: u.email,
            name: u.name,
            cumulative_gpa: u.cumulative_gpa,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub data: PublicUser,
    pub token: String,
}
