use axum::{
    Form, Router,
    extract::{Query, State},
    response::Response,
    routing::{get, post},
};
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::models::{LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::services::cookie_crypto;
use crate::services::password_reset_service::{self, ResetLinkState};
use crate::services::registration_service::{self, RegistrationError};
use crate::view::{Notice, PageScope};
use crate::web::context::{PageContext, SESSION_COOKIE};
use crate::web::forms::{
    ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm, ResetQuery,
};
use crate::web::{AppError, AppState};

const MIN_PASSWORD_LEN: usize = 8;

pub fn create_auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/register", get(register_page).post(register))
        .route(
            "/forgot-password",
            get(forgot_password_page).post(forgot_password),
        )
        .route(
            "/reset-password",
            get(reset_password_page).post(reset_password),
        )
}

/// Form failures keep the backend's wording; the login form has no session
/// to lose, so a 401 is a plain error here.
fn form_notice(err: &ApiError, locale: &str) -> Option<Notice> {
    match err {
        ApiError::Server { detail, .. } => Some(Notice::error(detail.clone())),
        other => Notice::from_api_error(other, locale),
    }
}

fn render_form(
    ctx: PageContext,
    state: &AppState,
    template: &str,
    email: &str,
    notice: Option<Notice>,
) -> Result<Response, AppError> {
    let mut context = ctx.base_context();
    context.insert("email", email);
    if notice.is_some() {
        context.insert("notice", &notice);
    }
    ctx.page(state, template, &context)
}

#[axum::debug_handler]
async fn login_page(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    if ctx.is_signed_in() {
        return Ok(ctx.redirect("/dashboard", None));
    }
    render_form(ctx, &app_state, "auth/login.html", "", None)
}

#[axum::debug_handler]
async fn login(
    State(app_state): State<Arc<AppState>>,
    mut ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let request = LoginRequest {
        email: form.email.trim().to_lowercase(),
        password: form.password,
    };

    match app_state.auth.login(&request, scope.token()).await {
        Ok(session) => {
            let sealed = cookie_crypto::seal(&session.access_token, &app_state.config.session_key)
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            // Lists cached for the previous identity must not leak into this one.
            app_state.views.evict_session(&ctx.session.id).await;
            ctx.set_cookie(SESSION_COOKIE, sealed);
            info!(user_id = session.user.id, "User signed in.");
            let welcome = format!("{} {}", ctx.t("auth.welcome_back"), session.user.name);
            Ok(ctx.redirect("/dashboard", Some(Notice::success(welcome))))
        }
        Err(err) => {
            warn!(error = %err, "Sign-in failed.");
            let notice = form_notice(&err, &ctx.locale);
            render_form(ctx, &app_state, "auth/login.html", &request.email, notice)
        }
    }
}

#[axum::debug_handler]
async fn logout(State(app_state): State<Arc<AppState>>, mut ctx: PageContext) -> Response {
    app_state.views.evict_session(&ctx.session.id).await;
    ctx.remove_cookie(SESSION_COOKIE);
    let notice = Notice::success(ctx.t("auth.signed_out"));
    ctx.redirect("/", Some(notice))
}

#[axum::debug_handler]
async fn register_page(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    render_form(ctx, &app_state, "auth/register.html", "", None)
}

#[axum::debug_handler]
async fn register(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        let notice = Notice::error(ctx.t("auth.password_mismatch"));
        return render_form(ctx, &app_state, "auth/register.html", &form.email, Some(notice));
    }

    let scope = PageScope::new();
    let email = form.email.clone();
    let request = RegisterRequest {
        name: form.name,
        email: form.email,
        password: form.password,
    };

    match registration_service::register(
        app_state.db.as_ref(),
        &app_state.auth,
        request,
        scope.token(),
    )
    .await
    {
        Ok(_) => {
            let notice = Notice::success(ctx.t("auth.registered"));
            Ok(ctx.redirect("/login", Some(notice)))
        }
        Err(RegistrationError::InvalidInput(message)) => {
            render_form(ctx, &app_state, "auth/register.html", &email, Some(Notice::error(message)))
        }
        Err(RegistrationError::EmailTaken) => {
            let notice = Notice::error(ctx.t("auth.email_taken"));
            render_form(ctx, &app_state, "auth/register.html", &email, Some(notice))
        }
        Err(RegistrationError::Api(err)) => {
            let notice = form_notice(&err, &ctx.locale);
            render_form(ctx, &app_state, "auth/register.html", &email, notice)
        }
        Err(err @ RegistrationError::Database(_)) => Err(err.into()),
    }
}

#[axum::debug_handler]
async fn forgot_password_page(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    render_form(ctx, &app_state, "auth/forgot_password.html", "", None)
}

#[axum::debug_handler]
async fn forgot_password(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let email = form.email.trim().to_lowercase();
    let notice = match app_state.auth.forgot_password(&email, scope.token()).await {
        // Same answer whether or not the address is known.
        Ok(_) => Some(Notice::success(ctx.t("auth.reset_link_sent"))),
        Err(err) => form_notice(&err, &ctx.locale),
    };
    render_form(ctx, &app_state, "auth/forgot_password.html", &email, notice)
}

fn reset_ttl(state: &AppState) -> Duration {
    Duration::minutes(state.config.password_reset_ttl_minutes)
}

/// Renders the form for a valid link and the "invalid link" view for
/// anything else, including a lookup that failed.
fn render_reset(
    ctx: PageContext,
    state: &AppState,
    link: Result<ResetLinkState, ApiError>,
    notice: Option<Notice>,
) -> Result<Response, AppError> {
    let mut context = ctx.base_context();
    if notice.is_some() {
        context.insert("notice", &notice);
    }
    match link {
        Ok(ResetLinkState::Valid { token, email }) => {
            context.insert("token", &token);
            context.insert("email", &email);
            ctx.page(state, "auth/reset_password.html", &context)
        }
        Ok(ResetLinkState::Invalid(reason)) => {
            context.insert("reason", &reason);
            ctx.page(state, "auth/reset_invalid.html", &context)
        }
        Err(err) => {
            if let Some(notice) = Notice::from_api_error(&err, &ctx.locale) {
                context.insert("notice", &notice);
            }
            ctx.page(state, "auth/reset_invalid.html", &context)
        }
    }
}

#[axum::debug_handler]
async fn reset_password_page(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Query(query): Query<ResetQuery>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let link = password_reset_service::check_link(
        &app_state.auth,
        query.token.as_deref(),
        query.email.as_deref(),
        reset_ttl(&app_state),
        scope.token(),
    )
    .await;
    render_reset(ctx, &app_state, link, None)
}

#[axum::debug_handler]
async fn reset_password(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    // The link may have expired or been used while the form was open.
    let link = password_reset_service::check_link(
        &app_state.auth,
        Some(&form.token),
        Some(&form.email),
        reset_ttl(&app_state),
        scope.token(),
    )
    .await;
    let (token, email) = match link {
        Ok(ResetLinkState::Valid { token, email }) => (token, email),
        other => return render_reset(ctx, &app_state, other, None),
    };

    let valid = |token: String, email: String| -> Result<ResetLinkState, ApiError> {
        Ok(ResetLinkState::Valid { token, email })
    };
    if form.new_password.chars().count() < MIN_PASSWORD_LEN {
        let notice = Notice::error(ctx.t("auth.password_too_short"));
        return render_reset(ctx, &app_state, valid(token, email), Some(notice));
    }
    if form.new_password != form.password_confirm {
        let notice = Notice::error(ctx.t("auth.password_mismatch"));
        return render_reset(ctx, &app_state, valid(token, email), Some(notice));
    }

    let request = ResetPasswordRequest {
        token: token.clone(),
        email: email.clone(),
        new_password: form.new_password,
    };
    match app_state.auth.reset_password(&request, scope.token()).await {
        Ok(_) => {
            info!("Password reset completed.");
            let notice = Notice::success(ctx.t("auth.password_reset_done"));
            Ok(ctx.redirect("/login", Some(notice)))
        }
        Err(err) => {
            let notice = form_notice(&err, &ctx.locale);
            render_reset(ctx, &app_state, valid(token, email), notice)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_notice_keeps_unauthorized_detail() {
        let err = ApiError::Server {
            status: 401,
            detail: "Incorrect email or password".to_string(),
        };
        let notice = form_notice(&err, "en").unwrap();
        assert_eq!(notice, Notice::error("Incorrect email or password"));
        assert!(form_notice(&ApiError::Cancelled, "en").is_none());
    }
}
