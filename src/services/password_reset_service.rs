//! Validation of password-reset links (`?token=...&email=...`).
//!
//! Links expire a fixed time after issue and can be used once. The backend
//! reports when a token was issued and used; the expiry window is applied
//! here so the form is never rendered for a dead link.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{ApiError, AuthApi};
use crate::models::ResetTokenRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    Missing,
    NotFound,
    Expired,
    AlreadyUsed,
    EmailMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetLinkState {
    Valid { token: String, email: String },
    Invalid(InvalidReason),
}

/// Decides whether a looked-up token still grants a reset.
pub fn evaluate(
    record: Option<&ResetTokenRecord>,
    token: &str,
    email: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> ResetLinkState {
    let Some(record) = record else {
        return ResetLinkState::Invalid(InvalidReason::NotFound);
    };
    if !record.email.eq_ignore_ascii_case(email) {
        return ResetLinkState::Invalid(InvalidReason::EmailMismatch);
    }
    if record.used_at.is_some() {
        return ResetLinkState::Invalid(InvalidReason::AlreadyUsed);
    }
    if now >= record.created_at + ttl {
        return ResetLinkState::Invalid(InvalidReason::Expired);
    }
    ResetLinkState::Valid {
        token: token.to_string(),
        email: record.email.clone(),
    }
}

/// Checks a link from the query string against the backend. Blank
/// parameters are rejected without a call; a 404 means the token was never
/// issued. Other failures are returned so the page can explain them.
pub async fn check_link(
    auth: &AuthApi,
    token: Option<&str>,
    email: Option<&str>,
    ttl: Duration,
    cancel: &CancellationToken,
) -> Result<ResetLinkState, ApiError> {
    let (token, email) = match (token.map(str::trim), email.map(str::trim)) {
        (Some(token), Some(email)) if !token.is_empty() && !email.is_empty() => (token, email),
        _ => return Ok(ResetLinkState::Invalid(InvalidReason::Missing)),
    };

    let record = match auth.verify_reset_token(token, email, cancel).await {
        Ok(record) => Some(record),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err),
    };

    let state = evaluate(record.as_ref(), token, email, Utc::now(), ttl);
    if let ResetLinkState::Invalid(reason) = &state {
        info!(reason = ?reason, "Rejected password reset link.");
    }
    Ok(state)
}
