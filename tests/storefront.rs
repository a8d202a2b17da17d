mod common;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{StatusCode, header},
    routing::{delete, get},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use common::*;

#[tokio::test]
async fn test_health() {
    let app = storefront("http://127.0.0.1:9");
    let response = app
        .oneshot(common::get("/api/health", &anonymous_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unprefixed_path_redirects_to_preferred_locale() {
    let app = storefront("http://127.0.0.1:9");
    let request = axum::http::Request::builder()
        .uri("/plans?category=basic")
        .header(header::ACCEPT_LANGUAGE, "id-ID,id;q=0.9")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/id/plans?category=basic");
}

#[tokio::test]
async fn test_dashboard_requires_sign_in() {
    let app = storefront("http://127.0.0.1:9");
    let response = app
        .oneshot(common::get("/en/dashboard/vps", &anonymous_cookie()))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/en/login");
}

#[tokio::test]
async fn test_overview_shows_at_most_five_servers() {
    let seen_limit = Arc::new(Mutex::new(None::<String>));
    let recorded = seen_limit.clone();
    let backend = Router::new()
        .route(
            "/vps/my-vps",
            get(move |Query(query): Query<HashMap<String, String>>| {
                let recorded = recorded.clone();
                async move {
                    *recorded.lock().unwrap() = query.get("limit").cloned();
                    // This backend ignores the limit.
                    let all: Vec<Value> =
                        (1..=7).map(|i| vps_json(i, &format!("web-{i}"))).collect();
                    Json(all)
                }
            }),
        )
        .route("/auth/me", get(|| async { Json(user_json()) }));
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(common::get("/en/dashboard", &signed_in_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert_eq!(seen_limit.lock().unwrap().as_deref(), Some("5"));
    assert_eq!(html.matches("class=\"vps-row\"").count(), 5);
    assert!(html.contains("Ana"));
    assert!(!html.contains("web-6"));
}

#[tokio::test]
async fn test_vps_list_empty_state_links_to_plans() {
    let backend = Router::new().route("/vps/my-vps", get(|| async { Json(json!([])) }));
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(common::get("/id/dashboard/vps", &signed_in_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("id=\"no-vps\""));
    assert!(html.contains("href=\"/id/plans\""));
}

#[tokio::test]
async fn test_expired_backend_token_redirects_to_login() {
    let backend = Router::new().route(
        "/vps/my-vps",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Token expired" })),
            )
        }),
    );
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(common::get("/en/dashboard/vps", &signed_in_cookie()))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/en/login");
}

#[tokio::test]
async fn test_backend_failure_keeps_the_page() {
    let backend = Router::new().route(
        "/vps/my-vps",
        get(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({ "detail": "Account suspended" })),
            )
        }),
    );
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(common::get("/en/dashboard/vps", &signed_in_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Account suspended"));
    assert!(!html.contains("id=\"no-vps\""));
}

fn reset_backend() -> Router {
    Router::new().route(
        "/auth/reset-password/verify",
        get(|Query(query): Query<HashMap<String, String>>| async move {
            let email = query.get("email").cloned().unwrap_or_default();
            let created_at = match query.get("token").map(String::as_str) {
                Some("fresh") => Utc::now() - Duration::minutes(5),
                Some("old") => Utc::now() - Duration::hours(2),
                _ => {
                    return (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "detail": "Token not found" })),
                    );
                }
            };
            (
                StatusCode::OK,
                Json(json!({ "email": email, "created_at": created_at })),
            )
        }),
    )
}

#[tokio::test]
async fn test_reset_link_views() {
    let base = spawn_backend(reset_backend()).await;
    let cases = [
        ("/en/reset-password", "The link is incomplete."),
        (
            "/en/reset-password?token=unknown&email=ana@example.com",
            "The link is not recognised.",
        ),
        (
            "/en/reset-password?token=old&email=ana@example.com",
            "The link has expired.",
        ),
    ];

    for (uri, reason) in cases {
        let response = storefront(&base)
            .oneshot(common::get(uri, &anonymous_cookie()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let html = body_text(response).await;
        assert!(html.contains("id=\"reset-invalid\""), "{uri}");
        assert!(html.contains(reason), "{uri}");
        assert!(!html.contains("id=\"reset-form\""), "{uri}");
    }

    let response = storefront(&base)
        .oneshot(common::get(
            "/en/reset-password?token=fresh&email=ana@example.com",
            &anonymous_cookie(),
        ))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("id=\"reset-form\""));
    assert!(html.contains("ana@example.com"));
}

#[tokio::test]
async fn test_rrd_envelope() {
    let backend = Router::new().route(
        "/vps/{id}/rrd",
        get(
            |Path(id): Path<i64>, Query(query): Query<HashMap<String, String>>| async move {
                assert_eq!(id, 42);
                assert_eq!(query.get("timeframe").map(String::as_str), Some("day"));
                assert_eq!(query.get("cf").map(String::as_str), Some("AVERAGE"));
                Json(json!([
                    { "time": 1_700_000_000, "cpu": 0.25, "mem": 512.0, "maxmem": 1024.0 },
                    { "time": 1_700_000_060, "cpu": null }
                ]))
            },
        ),
    );
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(common::get("/api/vps/42/rrd?timeframe=day", &signed_in_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["cpu"], 0.25);
    assert!(body.get("error").is_none());

    let response = storefront(&base)
        .oneshot(common::get("/api/vps/42/rrd", &anonymous_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "NO_TOKEN");
    assert!(body.get("data").is_none());

    let response = storefront(&base)
        .oneshot(common::get("/api/vps/42/rrd?timeframe=decade", &signed_in_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_admin_delete_patches_the_list_without_refetch() {
    let list_calls = Arc::new(AtomicUsize::new(0));
    let counter = list_calls.clone();
    let backend = Router::new()
        .route(
            "/plans",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!([
                        plan_json(1, "Starter", 1, 50_000.0),
                        plan_json(2, "Builder", 4, 150_000.0)
                    ]))
                }
            }),
        )
        .route("/plans/{id}", delete(|| async { StatusCode::NO_CONTENT }));
    let base = spawn_backend(backend).await;
    let app = storefront(&base);

    let response = app
        .clone()
        .oneshot(common::get("/en/admin/plans", &signed_in_cookie()))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("data-id=\"2\""));
    assert_eq!(list_calls.load(Ordering::SeqCst), 1);

    let response = app
        .oneshot(post_form("/en/admin/plans/2/delete", &signed_in_cookie(), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Plan deleted."));
    assert!(html.contains("data-id=\"1\""));
    assert!(!html.contains("data-id=\"2\""));
    assert_eq!(list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_admin_rejected_mutation_keeps_the_list() {
    let backend = Router::new()
        .route(
            "/plans",
            get(|| async { Json(json!([plan_json(1, "Starter", 1, 50_000.0)])) }),
        )
        .route(
            "/plans/{id}",
            delete(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "detail": "Admins only" })),
                )
            }),
        );
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(post_form("/en/admin/plans/1/delete", &signed_in_cookie(), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Admins only"));
    assert!(html.contains("data-id=\"1\""));
}

#[tokio::test]
async fn test_plan_listing_filters_the_catalogue() {
    let backend = Router::new().route(
        "/plans",
        get(|| async {
            Json(json!([
                plan_json(1, "Starter", 1, 50_000.0),
                plan_json(2, "Builder", 4, 150_000.0),
                plan_json(3, "Heavy", 16, 600_000.0)
            ]))
        }),
    );
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(common::get("/en/plans?memory=medium&max_price=&page=", &anonymous_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Builder"));
    assert!(!html.contains("Starter"));
    assert!(!html.contains("Heavy"));
}

#[tokio::test]
async fn test_home_renders_without_articles() {
    let backend = Router::new()
        .route(
            "/plans",
            get(|| async { Json(json!([plan_json(1, "Starter", 1, 50_000.0)])) }),
        )
        .route(
            "/articles",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
    let base = spawn_backend(backend).await;

    let response = storefront(&base)
        .oneshot(common::get("/en", &anonymous_cookie()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Starter"));
    assert!(html.contains("IDR 50,000"));
}

#[tokio::test]
async fn test_add_to_cart_and_view() {
    let backend = Router::new().route(
        "/plans/{id}",
        get(|Path(id): Path<i64>| async move { Json(plan_json(id, "Starter", 1, 100_000.0)) }),
    );
    let base = spawn_backend(backend).await;
    let app = storefront(&base);

    let response = app
        .clone()
        .oneshot(post_form(
            "/en/cart/add",
            &anonymous_cookie(),
            "plan_id=1&hostname=web-1&os=debian-12&duration_months=12",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/en/cart");
    let cart_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("cart="))
        .and_then(|c| c.split(';').next())
        .unwrap()
        .to_string();

    let response = app
        .oneshot(common::get("/en/cart", &format!("{}; {cart_cookie}", anonymous_cookie())))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("web-1"));
    // 12 months at a 15% discount.
    assert!(html.contains("IDR 1,020,000"));
}

#[tokio::test]
async fn test_checkout_reprices_edited_cart_cookie() {
    let placed: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let recorder = placed.clone();
    let backend = Router::new()
        .route(
            "/plans/{id}",
            get(|Path(id): Path<i64>| async move { Json(plan_json(id, "Starter", 1, 100_000.0)) }),
        )
        .route(
            "/orders",
            axum::routing::post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(body.clone());
                    (
                        StatusCode::CREATED,
                        Json(json!({
                            "order_number": "ORD-2001",
                            "status": "pending",
                            "items": body["items"],
                            "total": 1_020_000.0,
                            "currency": "IDR",
                            "created_at": "2026-01-02T03:04:05Z"
                        })),
                    )
                }
            }),
        );
    let base = spawn_backend(backend).await;

    let edited = json!({
        "items": [{
            "id": "0b7c9a52-1d2e-4f3a-8b4c-5d6e7f8a9b0c",
            "plan_id": 1,
            "plan_name": "Starter",
            "hostname": "web-1",
            "os": "debian-12",
            "duration_months": 12,
            "price_monthly": 1.0,
            "currency": "IDR"
        }]
    });
    let cookie = format!(
        "{}; cart={}",
        signed_in_cookie(),
        urlencoding::encode(&edited.to_string())
    );

    let response = storefront(&base)
        .oneshot(post_form("/en/cart/checkout", &cookie, ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/en/dashboard/billing");

    let body = placed.lock().unwrap().clone().unwrap();
    // 100,000 a month for 12 months at a 15% discount.
    assert_eq!(body["items"][0]["price"], json!(1_020_000.0));
    assert_eq!(body["items"][0]["duration_months"], json!(12));
}

#[tokio::test]
async fn test_checkout_rejects_unoffered_duration() {
    let orders = Arc::new(AtomicUsize::new(0));
    let counter = orders.clone();
    let backend = Router::new()
        .route(
            "/plans/{id}",
            get(|Path(id): Path<i64>| async move { Json(plan_json(id, "Starter", 1, 100_000.0)) }),
        )
        .route(
            "/orders",
            axum::routing::post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::CREATED }
            }),
        );
    let base = spawn_backend(backend).await;

    let edited = json!({
        "items": [{
            "id": "0b7c9a52-1d2e-4f3a-8b4c-5d6e7f8a9b0c",
            "plan_id": 1,
            "plan_name": "Starter",
            "hostname": "web-1",
            "os": "debian-12",
            "duration_months": 24,
            "price_monthly": 100_000.0,
            "currency": "IDR"
        }]
    });
    let cookie = format!(
        "{}; cart={}",
        signed_in_cookie(),
        urlencoding::encode(&edited.to_string())
    );

    let response = storefront(&base)
        .oneshot(post_form("/en/cart/checkout", &cookie, ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/en/cart");
    let (is_error, message) = flash(&response).unwrap();
    assert!(is_error);
    assert!(message.contains("24 months"));
    assert_eq!(orders.load(Ordering::SeqCst), 0);
}

fn session_id_cookie(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("sid="))
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_session_id_cookie_follows_secure_setting() {
    let request = || {
        axum::http::Request::builder()
            .uri("/api/health")
            .body(axum::body::Body::empty())
            .unwrap()
    };

    let mut secure = config("http://127.0.0.1:9");
    secure.secure_cookies = true;
    let state = vps_storefront::web::AppState::new(Arc::new(secure), None).unwrap();
    let response = vps_storefront::web::create_axum_router(Arc::new(state))
        .oneshot(request())
        .await
        .unwrap();
    assert!(session_id_cookie(&response).contains("Secure"));

    let response = storefront("http://127.0.0.1:9")
        .oneshot(request())
        .await
        .unwrap();
    assert!(!session_id_cookie(&response).contains("Secure"));
}
