//! Back-office pages. Every list is fetched when its page is opened and kept
//! as the session's local copy; create, update and delete results are
//! applied to that copy and the page is rendered from it without a refetch.

use axum::{
    Form, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::models::{OrderStatus, PlanCategory, UserRole};
use crate::view::{Collection, Keyed, LoadState, Notice, PageScope, ViewCache};
use crate::web::context::PageContext;
use crate::web::forms::{ArticleForm, IdPath, OrderNumberPath, OrderStatusForm, PlanForm, UserForm};
use crate::web::routes::{insert_state, invalid_input_notice, mount_collection, patch_collection};
use crate::web::{AppError, AppState};

const ORDER_STATUSES: [OrderStatus; 3] = [
    OrderStatus::Pending,
    OrderStatus::Paid,
    OrderStatus::Cancelled,
];
const USER_ROLES: [UserRole; 2] = [UserRole::Admin, UserRole::Customer];

pub fn create_admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/{id}", post(update_plan))
        .route("/plans/{id}/delete", post(delete_plan))
        .route("/orders", get(list_orders))
        .route("/orders/{order_number}/status", post(update_order_status))
        .route("/articles", get(list_articles).post(create_article))
        .route("/articles/{id}", post(update_article))
        .route("/articles/{id}/delete", post(delete_article))
        .route("/users", get(list_users))
        .route("/users/{id}", post(update_user))
        .route("/users/{id}/delete", post(delete_user))
}

fn render_list<T: Keyed + Clone + Serialize>(
    app_state: &AppState,
    ctx: PageContext,
    template: &str,
    list: LoadState<Collection<T>>,
    notice: Option<Notice>,
) -> Result<Response, AppError> {
    let list = list.map(Collection::into_items);
    let mut context = ctx.base_context();
    insert_state(&mut context, "items", &list);
    if notice.is_some() {
        context.insert("notice", &notice);
    }
    context.insert("categories", &PlanCategory::ALL);
    context.insert("order_statuses", &ORDER_STATUSES);
    context.insert("roles", &USER_ROLES);
    ctx.page(app_state, template, &context)
}

/// Key of the admin copy of the order list, kept apart from the billing page.
fn orders_key(ctx: &PageContext) -> String {
    ctx.scoped_view_key("admin")
}

/// The cached list with a notice for a form rejected before any call.
async fn rejected<T: Keyed + Clone>(
    cache: &ViewCache<T>,
    key: &str,
    err: AppError,
) -> Result<(LoadState<Collection<T>>, Option<Notice>), AppError> {
    let notice = invalid_input_notice(err)?;
    let list = cache
        .get(key)
        .await
        .map_or(LoadState::Loading, LoadState::Loaded);
    Ok((list, Some(notice)))
}

// Plans

#[axum::debug_handler]
async fn list_plans(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    // The catalogue is public; the console is not.
    if !ctx.is_signed_in() {
        return Err(ctx.login_required());
    }
    let scope = PageScope::new();
    let list = mount_collection(
        &ctx,
        &app_state.views.plans,
        ctx.view_key(),
        app_state.plans.list(scope.token()),
    )
    .await?;
    render_list(&app_state, ctx, "admin/plans.html", list, None)
}

#[axum::debug_handler]
async fn create_plan(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<PlanForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let cache = &app_state.views.plans;
    let (list, notice) = match form.into_input() {
        Err(err) => rejected(cache, &ctx.view_key(), err).await?,
        Ok(input) => {
            let created = app_state.plans.create(ctx.token(), &input, scope.token()).await;
            if let Ok(plan) = &created {
                info!(plan_id = plan.id, name = %plan.name, "Plan created.");
            }
            let success = Notice::success(ctx.t("admin.plan_created"));
            patch_collection(
                &ctx,
                cache,
                ctx.view_key(),
                app_state.plans.list(scope.token()),
                |plans| plans.apply_created(created),
                success,
            )
            .await?
        }
    };
    render_list(&app_state, ctx, "admin/plans.html", list, notice)
}

#[axum::debug_handler]
async fn update_plan(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
    Form(form): Form<PlanForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let cache = &app_state.views.plans;
    let (list, notice) = match form.into_input() {
        Err(err) => rejected(cache, &ctx.view_key(), err).await?,
        Ok(input) => {
            let updated = app_state
                .plans
                .update(ctx.token(), path.id, &input, scope.token())
                .await;
            let success = Notice::success(ctx.t("admin.plan_updated"));
            patch_collection(
                &ctx,
                cache,
                ctx.view_key(),
                app_state.plans.list(scope.token()),
                |plans| plans.apply_updated(updated),
                success,
            )
            .await?
        }
    };
    render_list(&app_state, ctx, "admin/plans.html", list, notice)
}

#[axum::debug_handler]
async fn delete_plan(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let removed = app_state.plans.delete(ctx.token(), path.id, scope.token()).await;
    if removed.is_ok() {
        info!(plan_id = path.id, "Plan deleted.");
    }
    let success = Notice::success(ctx.t("admin.plan_deleted"));
    let (list, notice) = patch_collection(
        &ctx,
        &app_state.views.plans,
        ctx.view_key(),
        app_state.plans.list(scope.token()),
        |plans| plans.apply_removed(&path.id, removed),
        success,
    )
    .await?;
    render_list(&app_state, ctx, "admin/plans.html", list, notice)
}

// Orders

#[axum::debug_handler]
async fn list_orders(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let list = mount_collection(
        &ctx,
        &app_state.views.orders,
        orders_key(&ctx),
        app_state.orders.list_all(ctx.token(), scope.token()),
    )
    .await?;
    render_list(&app_state, ctx, "admin/orders.html", list, None)
}

#[axum::debug_handler]
async fn update_order_status(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<OrderNumberPath>,
    ctx: PageContext,
    Form(form): Form<OrderStatusForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let cache = &app_state.views.orders;
    let (list, notice) = match form.status() {
        Err(err) => rejected(cache, &orders_key(&ctx), err).await?,
        Ok(status) => {
            let updated = app_state
                .orders
                .update_status(ctx.token(), &path.order_number, status, scope.token())
                .await;
            if updated.is_ok() {
                info!(order_number = %path.order_number, status = status.as_str(), "Order status changed.");
            }
            let success = Notice::success(ctx.t("admin.order_updated"));
            patch_collection(
                &ctx,
                cache,
                orders_key(&ctx),
                app_state.orders.list_all(ctx.token(), scope.token()),
                |orders| orders.apply_updated(updated),
                success,
            )
            .await?
        }
    };
    render_list(&app_state, ctx, "admin/orders.html", list, notice)
}

// Articles

#[axum::debug_handler]
async fn list_articles(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    if !ctx.is_signed_in() {
        return Err(ctx.login_required());
    }
    let scope = PageScope::new();
    let list = mount_collection(
        &ctx,
        &app_state.views.articles,
        ctx.view_key(),
        app_state.articles.list(scope.token()),
    )
    .await?;
    render_list(&app_state, ctx, "admin/articles.html", list, None)
}

#[axum::debug_handler]
async fn create_article(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<ArticleForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let cache = &app_state.views.articles;
    let (list, notice) = match form.into_input() {
        Err(err) => rejected(cache, &ctx.view_key(), err).await?,
        Ok(input) => {
            let created = app_state
                .articles
                .create(ctx.token(), &input, scope.token())
                .await;
            let success = Notice::success(ctx.t("admin.article_created"));
            patch_collection(
                &ctx,
                cache,
                ctx.view_key(),
                app_state.articles.list(scope.token()),
                |articles| articles.apply_created(created),
                success,
            )
            .await?
        }
    };
    render_list(&app_state, ctx, "admin/articles.html", list, notice)
}

#[axum::debug_handler]
async fn update_article(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
    Form(form): Form<ArticleForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let cache = &app_state.views.articles;
    let (list, notice) = match form.into_input() {
        Err(err) => rejected(cache, &ctx.view_key(), err).await?,
        Ok(input) => {
            let updated = app_state
                .articles
                .update(ctx.token(), path.id, &input, scope.token())
                .await;
            let success = Notice::success(ctx.t("admin.article_updated"));
            patch_collection(
                &ctx,
                cache,
                ctx.view_key(),
                app_state.articles.list(scope.token()),
                |articles| articles.apply_updated(updated),
                success,
            )
            .await?
        }
    };
    render_list(&app_state, ctx, "admin/articles.html", list, notice)
}

#[axum::debug_handler]
async fn delete_article(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let removed = app_state
        .articles
        .delete(ctx.token(), path.id, scope.token())
        .await;
    let success = Notice::success(ctx.t("admin.article_deleted"));
    let (list, notice) = patch_collection(
        &ctx,
        &app_state.views.articles,
        ctx.view_key(),
        app_state.articles.list(scope.token()),
        |articles| articles.apply_removed(&path.id, removed),
        success,
    )
    .await?;
    render_list(&app_state, ctx, "admin/articles.html", list, notice)
}

// Users

#[axum::debug_handler]
async fn list_users(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let list = mount_collection(
        &ctx,
        &app_state.views.users,
        ctx.view_key(),
        app_state.users.list(ctx.token(), scope.token()),
    )
    .await?;
    render_list(&app_state, ctx, "admin/users.html", list, None)
}

#[axum::debug_handler]
async fn update_user(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let cache = &app_state.views.users;
    let (list, notice) = match form.into_update() {
        Err(err) => rejected(cache, &ctx.view_key(), err).await?,
        Ok(update) => {
            let updated = app_state
                .users
                .update(ctx.token(), path.id, &update, scope.token())
                .await;
            let success = Notice::success(ctx.t("admin.user_updated"));
            patch_collection(
                &ctx,
                cache,
                ctx.view_key(),
                app_state.users.list(ctx.token(), scope.token()),
                |users| users.apply_updated(updated),
                success,
            )
            .await?
        }
    };
    render_list(&app_state, ctx, "admin/users.html", list, notice)
}

#[axum::debug_handler]
async fn delete_user(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let removed = app_state.users.delete(ctx.token(), path.id, scope.token()).await;
    if removed.is_ok() {
        info!(user_id = path.id, "User deleted.");
    }
    let success = Notice::success(ctx.t("admin.user_deleted"));
    let (list, notice) = patch_collection(
        &ctx,
        &app_state.views.users,
        ctx.view_key(),
        app_state.users.list(ctx.token(), scope.token()),
        |users| users.apply_removed(&path.id, removed),
        success,
    )
    .await?;
    render_list(&app_state, ctx, "admin/users.html", list, notice)
}
