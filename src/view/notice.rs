use serde::Serialize;

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    LoginRequired,
}

/// User-visible notification rendered at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Maps a failed call to what the user sees. Cancellation is silent.
    pub fn from_api_error(err: &ApiError, locale: &str) -> Option<Self> {
        if err.is_cancelled() {
            return None;
        }
        if err.requires_login() {
            return Some(Notice {
                kind: NoticeKind::LoginRequired,
                message: t!("notice.login_required", locale = locale).to_string(),
            });
        }
        let notice = match err {
            ApiError::Server { detail, .. } => Notice::error(detail.clone()),
            _ => Notice::error(t!("notice.try_again_later", locale = locale).to_string()),
        };
        Some(notice)
    }

    pub fn requires_login(&self) -> bool {
        self.kind == NoticeKind::LoginRequired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransportKind;

    #[test]
    fn test_cancelled_is_silent() {
        assert!(Notice::from_api_error(&ApiError::Cancelled, "en").is_none());
    }

    #[test]
    fn test_server_detail_is_verbatim() {
        let notice = Notice::from_api_error(
            &ApiError::Server {
                status: 422,
                detail: "Hostname already taken".to_string(),
            },
            "en",
        )
        .unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Hostname already taken");
    }

    #[test]
    fn test_transport_is_generic() {
        let notice = Notice::from_api_error(
            &ApiError::Transport {
                kind: TransportKind::Timeout,
                message: "operation timed out".to_string(),
            },
            "en",
        )
        .unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(!notice.message.contains("timed out"));
        assert_eq!(notice.message, t!("notice.try_again_later", locale = "en"));
    }

    #[test]
    fn test_missing_credential_requires_login() {
        let notice = Notice::from_api_error(&ApiError::MissingCredential, "id").unwrap();
        assert!(notice.requires_login());
    }
}
