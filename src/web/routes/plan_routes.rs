use axum::{
    Router,
    extract::{Path, Query, State},
    response::Response,
    routing::get,
};
use std::sync::Arc;

use crate::catalog::{self, DURATION_OPTIONS, MemoryTier, PlanFilter, PlanQuery, pricing};
use crate::models::{Plan, PlanCategory};
use crate::services::cart_service::OS_CHOICES;
use crate::view::PageScope;
use crate::web::context::PageContext;
use crate::web::forms::IdPath;
use crate::web::routes::{insert_state, load_state};
use crate::web::{AppError, AppState};

const MEMORY_TIERS: [MemoryTier; 3] = [MemoryTier::Small, MemoryTier::Medium, MemoryTier::Large];

pub fn create_plan_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/{id}", get(plan_detail))
}

/// Filters are applied to the whole active catalogue on every request, so
/// clearing them shows the catalogue exactly as fetched.
#[axum::debug_handler]
async fn list_plans(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Query(query): Query<PlanQuery>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let filter = PlanFilter::from_query(&query);
    let page_size = app_state.config.plans_page_size;

    let catalogue = app_state.plans.list(scope.token()).await.map(|plans| {
        let active: Vec<Plan> = plans.into_iter().filter(|plan| plan.is_active).collect();
        catalog::paginate(&filter.apply(&active), query.page(), page_size)
    });
    let state = load_state(&ctx, catalogue)?;

    let mut context = ctx.base_context();
    insert_state(&mut context, "page", &state);
    context.insert("filter", &filter);
    context.insert("filter_query", &filter.to_query_string());
    context.insert("categories", &PlanCategory::ALL);
    context.insert("memory_tiers", &MEMORY_TIERS);
    ctx.page(&app_state, "plans/list.html", &context)
}

#[axum::debug_handler]
async fn plan_detail(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let result = app_state.plans.get(path.id, scope.token()).await;
    if let Err(err) = &result {
        if err.is_not_found() {
            return Err(AppError::NotFound(format!("Plan {}", path.id)));
        }
    }
    let state = load_state(&ctx, result)?;

    let mut context = ctx.base_context();
    if let Some(plan) = state.data() {
        context.insert("quotes", &pricing::quotes(plan.price_monthly));
    }
    insert_state(&mut context, "plan", &state);
    context.insert("durations", &DURATION_OPTIONS);
    context.insert("os_choices", OS_CHOICES);
    ctx.page(&app_state, "plans/detail.html", &context)
}
