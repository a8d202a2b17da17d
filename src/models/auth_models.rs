use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content_models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// What the backend knows about an issued reset token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetTokenRecord {
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}
