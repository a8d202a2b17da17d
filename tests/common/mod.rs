#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

use vps_storefront::notifications::Notifier;
use vps_storefront::server::config::StorefrontConfig;
use vps_storefront::services::cookie_crypto;
use vps_storefront::web::{AppState, create_axum_router};

pub const SESSION_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
pub const SESSION_ID: &str = "6f1c2a4e-8d3b-4c5a-9e7f-0a1b2c3d4e5f";

/// Serves `backend` on an ephemeral port and returns its base URL.
pub async fn spawn_backend(backend: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, backend).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn config(api_base_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        api_base_url: api_base_url.to_string(),
        session_key: SESSION_KEY.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        notification_webhook_url: None,
        log_dir: "logs".to_string(),
        default_locale: "en".to_string(),
        request_timeout_secs: 5,
        password_reset_ttl_minutes: 60,
        plans_page_size: 6,
        secure_cookies: false,
    }
}

pub fn storefront(api_base_url: &str) -> Router {
    storefront_with_notifier(api_base_url, None)
}

pub fn storefront_with_notifier(
    api_base_url: &str,
    notifier: Option<Arc<dyn Notifier>>,
) -> Router {
    let state = AppState::new(Arc::new(config(api_base_url)), None)
        .unwrap()
        .with_notifier(notifier);
    create_axum_router(Arc::new(state))
}

/// Cookie header of a signed-in visitor with a stable session id.
pub fn signed_in_cookie() -> String {
    let sealed = cookie_crypto::seal("test-token", SESSION_KEY).unwrap();
    format!("sid={SESSION_ID}; session={sealed}")
}

pub fn anonymous_cookie() -> String {
    format!("sid={SESSION_ID}")
}

pub fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The flash notice a redirect carries, as `(is_error, message)`.
pub fn flash(response: &Response<Body>) -> Option<(bool, String)> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| cookie.strip_prefix("flash="))
        .map(|rest| rest.split(';').next().unwrap_or_default())
        .map(|value| {
            let json = urlencoding::decode(value).unwrap();
            let notice: Value = serde_json::from_str(&json).unwrap();
            (
                notice["error"].as_bool().unwrap(),
                notice["message"].as_str().unwrap().to_string(),
            )
        })
}

pub fn plan_json(id: i64, name: &str, ram_gb: u32, price: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "category": "basic",
        "spec": {
            "vcpu": 1,
            "ram_gb": ram_gb,
            "storage_type": "NVMe",
            "storage_gb": 20,
            "bandwidth": "1 TB"
        },
        "price_monthly": price,
        "currency": "IDR",
        "use_cases": ["blog"],
        "max_snapshots": 2,
        "max_ips": 1,
        "is_active": true
    })
}

pub fn vps_json(id: i64, hostname: &str) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "plan_id": 1,
        "plan_name": "Basic 1",
        "vm": {
            "hostname": hostname,
            "ip_address": "203.0.113.10",
            "vcpu": 1,
            "ram_mb": 1024,
            "storage_gb": 20,
            "power_status": "running"
        },
        "status": "active",
        "created_at": "2026-01-02T03:04:05Z"
    })
}

pub fn user_json() -> Value {
    json!({
        "id": 1,
        "email": "ana@example.com",
        "name": "Ana",
        "role": "customer",
        "is_active": true
    })
}
