use axum::{
    Router,
    http::{Method, StatusCode},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tera::Tera;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{ApiClient, ArticleApi, AuthApi, OrderApi, PlanApi, UserApi, VpsApi};
use crate::models::{Article, Order, Plan, Snapshot, User};
use crate::notifications::Notifier;
use crate::notifications::webhook::WebhookNotifier;
use crate::server::config::StorefrontConfig;
use crate::view::ViewCache;

pub use error::AppError;

pub mod context;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod routes;
pub mod static_files;
pub mod templates;

use routes::*;

/// Idle time after which a session's cached list pages are dropped.
const VIEW_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Per-session copies of the list pages that mutations patch.
pub struct ViewCaches {
    pub plans: ViewCache<Plan>,
    pub orders: ViewCache<Order>,
    pub articles: ViewCache<Article>,
    pub users: ViewCache<User>,
    pub snapshots: ViewCache<Snapshot>,
}

impl ViewCaches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            plans: ViewCache::new(ttl),
            orders: ViewCache::new(ttl),
            articles: ViewCache::new(ttl),
            users: ViewCache::new(ttl),
            snapshots: ViewCache::new(ttl),
        }
    }

    pub async fn evict_session(&self, session_id: &str) {
        self.plans.evict_session(session_id).await;
        self.orders.evict_session(session_id).await;
        self.articles.evict_session(session_id).await;
        self.users.evict_session(session_id).await;
        self.snapshots.evict_session(session_id).await;
    }
}

pub struct AppState {
    pub config: Arc<StorefrontConfig>,
    pub templates: Tera,
    pub vps: VpsApi,
    pub plans: PlanApi,
    pub orders: OrderApi,
    pub articles: ArticleApi,
    pub users: UserApi,
    pub auth: AuthApi,
    pub db: Option<DatabaseConnection>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub views: ViewCaches,
}

impl AppState {
    pub fn new(
        config: Arc<StorefrontConfig>,
        db: Option<DatabaseConnection>,
    ) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = ApiClient::new(&config.api_base_url, timeout)?;

        let notifier = match &config.notification_webhook_url {
            Some(url) => {
                let http = reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| AppError::InternalServerError(e.to_string()))?;
                Some(Arc::new(WebhookNotifier::new(http, url.clone())) as Arc<dyn Notifier>)
            }
            None => None,
        };

        Ok(Self {
            templates: templates::load_templates()?,
            vps: VpsApi::new(client.clone()),
            plans: PlanApi::new(client.clone()),
            orders: OrderApi::new(client.clone()),
            articles: ArticleApi::new(client.clone()),
            users: UserApi::new(client.clone()),
            auth: AuthApi::new(client),
            db,
            notifier,
            views: ViewCaches::new(VIEW_CACHE_TTL),
            config,
        })
    }

    pub fn with_notifier(mut self, notifier: Option<Arc<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn localized_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(public_routes::home))
        .route("/privacy", get(public_routes::privacy))
        .route("/terms", get(public_routes::terms))
        .route("/articles/{slug}", get(public_routes::article))
        .route("/theme", post(public_routes::toggle_theme))
        .merge(auth_routes::create_auth_router())
        .merge(plan_routes::create_plan_router())
        .merge(cart_routes::create_cart_router())
        .nest("/dashboard", dashboard_routes::create_dashboard_router())
        .nest("/admin", admin_routes::create_admin_router())
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(api_routes::health_check_handler))
        .route("/api/vps/{id}/rrd", get(api_routes::vps_rrd_handler))
        .route("/static/{*path}", get(static_files::serve_static))
        .nest("/{locale}", localized_router())
        .fallback(not_found_handler)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::i18n::i18n_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::session::ensure_session_id,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
