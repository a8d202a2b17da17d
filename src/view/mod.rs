//! Page-side state: the load lifecycle of a page, the cancellation scope of
//! its backend calls, and the per-session copies that mutations patch.

use tokio_util::sync::CancellationToken;

use crate::api::ApiError;

pub mod cache;
pub mod collection;
pub mod notice;

pub use cache::ViewCache;
pub use collection::{Collection, Keyed};
pub use notice::{Notice, NoticeKind};

/// Cancellation scope of one page render. Dropping the scope (the handler
/// future was dropped because the client went away) cancels every backend
/// call that was given its token.
pub struct PageScope {
    token: CancellationToken,
}

impl PageScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for PageScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl Default for PageScope {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    Failed(Notice),
}

impl<T> LoadState<T> {
    /// Moves the page out of `Loading`. A cancelled call leaves the state
    /// untouched and yields no notice; any other failure is returned so the
    /// caller can redirect or show it.
    pub fn settle(&mut self, result: Result<T, ApiError>, locale: &str) -> Option<Notice> {
        match result {
            Ok(data) => {
                *self = LoadState::Loaded(data);
                None
            }
            Err(err) => {
                let notice = Notice::from_api_error(&err, locale)?;
                *self = LoadState::Failed(notice.clone());
                Some(notice)
            }
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            LoadState::Loading => LoadState::Loading,
            LoadState::Loaded(data) => LoadState::Loaded(f(data)),
            LoadState::Failed(notice) => LoadState::Failed(notice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_scope_cancels_token() {
        let scope = PageScope::new();
        let token = scope.token().clone();
        assert!(!token.is_cancelled());
        drop(scope);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_settle_success() {
        let mut state = LoadState::Loading;
        let notice = state.settle(Ok(vec![1, 2, 3]), "en");
        assert!(notice.is_none());
        assert_eq!(state.data(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn test_settle_cancelled_keeps_state() {
        let mut state: LoadState<Vec<u32>> = LoadState::Loading;
        let notice = state.settle(Err(ApiError::Cancelled), "en");
        assert!(notice.is_none());
        assert!(state.is_loading());

        let mut loaded = LoadState::Loaded(vec![4]);
        assert!(loaded.settle(Err(ApiError::Cancelled), "en").is_none());
        assert_eq!(loaded, LoadState::Loaded(vec![4]));
    }

    #[test]
    fn test_settle_server_error_fails_with_detail() {
        let mut state: LoadState<Vec<u32>> = LoadState::Loading;
        let notice = state
            .settle(
                Err(ApiError::Server {
                    status: 500,
                    detail: "Proxmox node unreachable".to_string(),
                }),
                "en",
            )
            .unwrap();
        assert_eq!(notice.message, "Proxmox node unreachable");
        assert!(matches!(state, LoadState::Failed(_)));
    }
}
