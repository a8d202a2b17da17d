use serde::Serialize;
use std::future::Future;

use crate::api::ApiError;
use crate::view::{Collection, Keyed, LoadState, Notice, ViewCache};
use crate::web::AppError;
use crate::web::context::PageContext;

pub mod admin_routes;
pub mod api_routes;
pub mod auth_routes;
pub mod cart_routes;
pub mod dashboard_routes;
pub mod plan_routes;
pub mod public_routes;

/// Settles a page load. A failure that needs a session aborts the render
/// with a redirect to the login page; other failures stay in the state.
pub(crate) fn load_state<T>(
    ctx: &PageContext,
    result: Result<T, ApiError>,
) -> Result<LoadState<T>, AppError> {
    let mut state = LoadState::Loading;
    match state.settle(result, &ctx.locale) {
        Some(notice) if notice.requires_login() => Err(ctx.login_required()),
        _ => Ok(state),
    }
}

/// Notice shown after a mutation. Cancelled calls produce none.
pub(crate) fn mutation_notice<T>(
    ctx: &PageContext,
    result: Result<T, ApiError>,
    success: impl FnOnce(T) -> Notice,
) -> Result<Option<Notice>, AppError> {
    match result {
        Ok(value) => Ok(Some(success(value))),
        Err(err) => match Notice::from_api_error(&err, &ctx.locale) {
            Some(notice) if notice.requires_login() => Err(ctx.login_required()),
            notice => Ok(notice),
        },
    }
}

/// Exposes a load state to a template as `loading`, `load_error` and `name`.
pub(crate) fn insert_state<T: Serialize>(
    context: &mut tera::Context,
    name: &str,
    state: &LoadState<T>,
) {
    context.insert("loading", &state.is_loading());
    match state {
        LoadState::Loaded(data) => context.insert(name, data),
        LoadState::Failed(notice) => context.insert("load_error", notice),
        LoadState::Loading => {}
    }
}

/// Fetches a list on page mount and keeps it as the session's local copy.
pub(crate) async fn mount_collection<T, Fut>(
    ctx: &PageContext,
    cache: &ViewCache<T>,
    key: String,
    fetch: Fut,
) -> Result<LoadState<Collection<T>>, AppError>
where
    T: Keyed + Clone,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    let state = load_state(ctx, fetch.await.map(Collection::new))?;
    if let LoadState::Loaded(collection) = &state {
        cache.store(key, collection.clone()).await;
    }
    Ok(state)
}

/// Applies a finished mutation to the session's copy of a list. The list is
/// only fetched when the session has no copy yet. On failure the copy is
/// left as it was and the notice explains why.
pub(crate) async fn patch_collection<T, Fut, F>(
    ctx: &PageContext,
    cache: &ViewCache<T>,
    key: String,
    fetch: Fut,
    apply: F,
    success: Notice,
) -> Result<(LoadState<Collection<T>>, Option<Notice>), AppError>
where
    T: Keyed + Clone,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
    F: FnOnce(&mut Collection<T>) -> Result<(), ApiError>,
{
    let (collection, outcome) = match cache.update(&key, apply).await {
        Ok(patched) => patched,
        Err(apply) => match load_state(ctx, fetch.await.map(Collection::new))? {
            LoadState::Loaded(fetched) => cache.update_or_seed(key, fetched, apply).await,
            failed => {
                // The list is gone but the mutation outcome is still reported.
                let notice = mutation_notice(ctx, apply(&mut Collection::default()), |()| success)?;
                return Ok((failed, notice));
            }
        },
    };

    let notice = mutation_notice(ctx, outcome, |()| success)?;
    Ok((LoadState::Loaded(collection), notice))
}

/// Notice for a form that was rejected before any backend call.
pub(crate) fn invalid_input_notice(err: AppError) -> Result<Notice, AppError> {
    match err {
        AppError::InvalidInput(message) => Ok(Notice::error(message)),
        other => Err(other),
    }
}
