mod common;

use axum::{Json, Router, routing::get};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use common::spawn_backend;
use vps_storefront::api::{ApiClient, ApiError, PlanApi};
use vps_storefront::view::PageScope;

fn counting_backend(hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/plans",
        get(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(200)).await;
                Json(json!([]))
            }
        }),
    )
}

#[tokio::test]
async fn test_already_cancelled_scope_sends_nothing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn_backend(counting_backend(hits.clone())).await;
    let plans = PlanApi::new(ApiClient::new(&base, Duration::from_secs(5)).unwrap());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = plans.list(&cancel).await;

    assert_eq!(result.unwrap_err(), ApiError::Cancelled);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dropping_the_scope_cancels_in_flight_calls() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn_backend(counting_backend(hits.clone())).await;
    let plans = PlanApi::new(ApiClient::new(&base, Duration::from_secs(5)).unwrap());

    let scope = PageScope::new();
    let token = scope.token().clone();
    let call = tokio::spawn(async move { plans.list(&token).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(scope);

    let result = call.await.unwrap();
    assert_eq!(result.unwrap_err(), ApiError::Cancelled);
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn_backend(counting_backend(hits)).await;
    let plans = PlanApi::new(ApiClient::new(&base, Duration::from_millis(20)).unwrap());

    let result = plans.list(&CancellationToken::new()).await;
    assert!(matches!(result, Err(ApiError::Transport { .. })));
}
