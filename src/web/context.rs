//! Per-request page context: locale, theme and session are extracted from
//! the request and handed to handlers and templates explicitly.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderMap, header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::server::config::SUPPORTED_LOCALES;
use crate::services::cart_service::{CART_COOKIE, Cart};
use crate::services::cookie_crypto;
use crate::view::{Notice, NoticeKind};
use crate::web::middleware::session::SessionId;
use crate::web::{AppError, AppState};

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_ID_COOKIE: &str = "sid";
pub const THEME_COOKIE: &str = "theme";
pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Anonymous id keying the per-session view caches.
    pub id: String,
    /// Backend bearer token, when signed in.
    pub token: Option<String>,
}

pub struct PageContext {
    pub locale: String,
    pub theme: Theme,
    pub session: Session,
    /// Request path without the locale prefix, for the language switcher.
    pub path: String,
    pub flash: Option<Notice>,
    pub jar: CookieJar,
    secure_cookies: bool,
}

/// Picks the first `Accept-Language` tag we have a catalogue for.
pub fn preferred_locale(headers: &HeaderMap, default_locale: &str) -> String {
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| {
            s.split(',')
                .map(|tag| tag.split(';').next().unwrap_or("").trim())
                .map(|tag| tag.split('-').next().unwrap_or("").to_ascii_lowercase())
                .find(|tag| SUPPORTED_LOCALES.contains(&tag.as_str()))
        })
        .unwrap_or_else(|| default_locale.to_string())
}

/// Splits `/{locale}/rest` into the locale segment and the remainder.
pub fn split_locale(path: &str) -> (&str, &str) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.find('/') {
        Some(index) => (&trimmed[..index], &trimmed[index..]),
        None => (trimmed, "/"),
    }
}

/// Backend token sealed in the session cookie, if it can be opened.
pub fn session_token(jar: &CookieJar, session_key: &str) -> Option<String> {
    let cookie = jar.get(SESSION_COOKIE)?;
    match cookie_crypto::open(cookie.value(), session_key) {
        Ok(token) => Some(token),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable session cookie.");
            None
        }
    }
}

impl FromRequestParts<Arc<AppState>> for PageContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let full_path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let (locale, rest) = split_locale(&full_path);
        if !SUPPORTED_LOCALES.contains(&locale) {
            let target = format!("/{}{}", state.config.default_locale, rest);
            return Err(Redirect::to(&target).into_response());
        }
        let locale = locale.to_string();
        let path = rest.to_string();

        let mut jar = CookieJar::from_headers(&parts.headers);

        let session_id = parts
            .extensions
            .get::<SessionId>()
            .map(|sid| sid.0.clone())
            .or_else(|| jar.get(SESSION_ID_COOKIE).map(|c| c.value().to_string()))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let token = session_token(&jar, &state.config.session_key);

        let theme = match jar.get(THEME_COOKIE).map(|c| c.value()) {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        };

        let flash = jar.get(FLASH_COOKIE).and_then(|cookie| {
            urlencoding::decode(cookie.value())
                .ok()
                .and_then(|json| serde_json::from_str::<FlashNotice>(&json).ok())
                .map(Notice::from)
        });
        if flash.is_some() {
            jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
        }

        Ok(PageContext {
            locale,
            theme,
            session: Session {
                id: session_id,
                token,
            },
            path,
            flash,
            jar,
            secure_cookies: state.config.secure_cookies,
        })
    }
}

#[derive(Serialize, serde::Deserialize)]
struct FlashNotice {
    error: bool,
    message: String,
}

impl From<FlashNotice> for Notice {
    fn from(flash: FlashNotice) -> Self {
        if flash.error {
            Notice::error(flash.message)
        } else {
            Notice::success(flash.message)
        }
    }
}

impl PageContext {
    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.token.is_some()
    }

    /// Cache key of this session's list pages.
    pub fn view_key(&self) -> String {
        self.session.id.clone()
    }

    /// Cache key of a list that belongs to one resource, e.g. a VPS.
    pub fn scoped_view_key(&self, scope: impl std::fmt::Display) -> String {
        format!("{}:{}", self.session.id, scope)
    }

    /// Absolute path inside the current locale.
    pub fn href(&self, path: &str) -> String {
        match path {
            "" | "/" => format!("/{}", self.locale),
            _ => format!("/{}{}", self.locale, path),
        }
    }

    pub fn login_required(&self) -> AppError {
        AppError::LoginRequired {
            locale: self.locale.clone(),
        }
    }

    pub fn t(&self, key: &str) -> String {
        t!(key, locale = self.locale.as_str()).to_string()
    }

    pub fn cart(&self) -> Cart {
        self.jar
            .get(CART_COOKIE)
            .map(|c| Cart::from_cookie_value(c.value()))
            .unwrap_or_default()
    }

    pub fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build()
    }

    pub fn set_cookie(&mut self, name: &'static str, value: String) {
        let cookie = self.cookie(name, value);
        self.jar = self.jar.clone().add(cookie);
    }

    pub fn remove_cookie(&mut self, name: &'static str) {
        self.jar = self.jar.clone().remove(Cookie::build(name).path("/"));
    }

    /// Variables every template expects.
    pub fn base_context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("locale", &self.locale);
        context.insert("locales", SUPPORTED_LOCALES);
        context.insert("theme", self.theme.as_str());
        context.insert("signed_in", &self.is_signed_in());
        context.insert("current_path", &self.path);
        context.insert("cart_count", &self.cart().items.len());
        context.insert("notice", &self.flash);
        context
    }

    /// Renders `template` and attaches pending cookie changes.
    pub fn page(
        self,
        state: &AppState,
        template: &str,
        context: &tera::Context,
    ) -> Result<Response, AppError> {
        let body = state.templates.render(template, context)?;
        Ok((self.jar, Html(body)).into_response())
    }

    /// Redirects inside the current locale, carrying a notice to the next page.
    pub fn redirect(mut self, path: &str, notice: Option<Notice>) -> Response {
        if let Some(notice) = notice {
            let flash = FlashNotice {
                error: notice.kind != NoticeKind::Success,
                message: notice.message,
            };
            if let Ok(json) = serde_json::to_string(&flash) {
                self.set_cookie(FLASH_COOKIE, urlencoding::encode(&json).into_owned());
            }
        }
        let target = self.href(path);
        (self.jar, Redirect::to(&target)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_preferred_locale() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("fr-FR,id-ID;q=0.9,en;q=0.8"),
        );
        assert_eq!(preferred_locale(&headers, "en"), "id");

        assert_eq!(preferred_locale(&HeaderMap::new(), "en"), "en");
    }

    #[test]
    fn test_split_locale() {
        assert_eq!(split_locale("/id/plans/3"), ("id", "/plans/3"));
        assert_eq!(split_locale("/en"), ("en", "/"));
        assert_eq!(split_locale("/"), ("", "/"));
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().as_str(), "light");
    }
}
