use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::web::AppState;
use crate::web::context::SESSION_ID_COOKIE;

/// Anonymous session id, available to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

/// Makes sure every visitor carries a session id cookie.
pub async fn ensure_session_id(
    State(app_state): State<Arc<AppState>>,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let existing = jar
        .get(SESSION_ID_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| uuid::Uuid::parse_str(v).is_ok());

    let (session_id, is_new) = match existing {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    };
    req.extensions_mut().insert(SessionId(session_id.clone()));

    let mut response = next.run(req).await;

    if is_new {
        debug!(session_id = %session_id, "Issued new session id.");
        let cookie = Cookie::build((SESSION_ID_COOKIE, session_id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(app_state.config.secure_cookies)
            .build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Failed to encode session id cookie."),
        }
    }
    response
}
