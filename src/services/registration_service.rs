use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{ApiError, AuthApi};
use crate::db::services::user_service;
use crate::models::{RegisterRequest, User};

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub fn validate(request: &RegisterRequest) -> Result<(), RegistrationError> {
    if request.name.trim().is_empty() {
        return Err(RegistrationError::InvalidInput("Name is required.".to_string()));
    }
    let email = request.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(RegistrationError::InvalidInput(
            "Enter a valid email address.".to_string(),
        ));
    }
    if request.password.len() < 8 {
        return Err(RegistrationError::InvalidInput(
            "Password must be at least 8 characters long.".to_string(),
        ));
    }
    Ok(())
}

/// Registers a customer. When a database is configured the email is checked
/// for an existing account before the backend is called.
pub async fn register(
    db: Option<&DatabaseConnection>,
    auth: &AuthApi,
    mut request: RegisterRequest,
    cancel: &CancellationToken,
) -> Result<User, RegistrationError> {
    validate(&request)?;
    request.email = request.email.trim().to_lowercase();
    request.name = request.name.trim().to_string();

    if let Some(db) = db {
        if user_service::email_exists(db, &request.email).await? {
            return Err(RegistrationError::EmailTaken);
        }
    }

    let user = auth.register(&request, cancel).await?;
    info!(user_id = user.id, "Registered new customer.");
    Ok(user)
}
