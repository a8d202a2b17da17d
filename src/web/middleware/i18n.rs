use axum::{
    body::Body as AxumBody,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::server::config::SUPPORTED_LOCALES;
use crate::web::AppState;
use crate::web::context::{preferred_locale, split_locale};

/// Paths served outside the locale prefix.
const UNLOCALIZED_PREFIXES: &[&str] = &["api", "static"];

fn looks_like_locale(segment: &str) -> bool {
    let mut parts = segment.split('-');
    let language = parts.next().unwrap_or("");
    language.len() == 2
        && language.chars().all(|c| c.is_ascii_alphabetic())
        && parts.all(|region| region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Where a request for `path` belongs, or `None` when it is already
/// correctly prefixed.
pub fn locale_redirect_target(path: &str, query: Option<&str>, locale: &str) -> Option<String> {
    let (first, rest) = split_locale(path);
    if SUPPORTED_LOCALES.contains(&first) || UNLOCALIZED_PREFIXES.contains(&first) {
        return None;
    }
    // An unsupported locale is replaced; a path without one is kept whole.
    let rest = if looks_like_locale(first) { rest } else { path };
    let rest = if rest == "/" { "" } else { rest };
    let target = match query {
        Some(q) if !q.is_empty() => format!("/{locale}{rest}?{q}"),
        _ => format!("/{locale}{rest}"),
    };
    Some(target)
}

/// Redirects requests without a supported locale prefix, choosing the
/// locale from `Accept-Language`.
pub async fn i18n_middleware(
    State(app_state): State<Arc<AppState>>,
    req: Request<AxumBody>,
    next: Next,
) -> Response {
    let locale = preferred_locale(req.headers(), &app_state.config.default_locale);
    if let Some(target) = locale_redirect_target(req.uri().path(), req.uri().query(), &locale) {
        return Redirect::temporary(&target).into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_paths_pass_through() {
        assert_eq!(locale_redirect_target("/en/plans", None, "en"), None);
        assert_eq!(locale_redirect_target("/id", None, "en"), None);
        assert_eq!(locale_redirect_target("/api/health", None, "en"), None);
        assert_eq!(locale_redirect_target("/static/site.css", None, "en"), None);
    }

    #[test]
    fn test_root_and_missing_locale() {
        assert_eq!(locale_redirect_target("/", None, "id").as_deref(), Some("/id"));
        assert_eq!(
            locale_redirect_target("/plans", Some("category=basic"), "en").as_deref(),
            Some("/en/plans?category=basic")
        );
        assert_eq!(
            locale_redirect_target("/dashboard/vps/3", None, "en").as_deref(),
            Some("/en/dashboard/vps/3")
        );
    }

    #[test]
    fn test_unsupported_locale_is_replaced() {
        assert_eq!(
            locale_redirect_target("/fr/plans", None, "en").as_deref(),
            Some("/en/plans")
        );
        assert_eq!(locale_redirect_target("/pt-BR", None, "en").as_deref(), Some("/en"));
    }
}
