use axum::{
    Form, Router,
    extract::State,
    response::Response,
    routing::{get, post},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::services::cart_service::{CART_COOKIE, Cart, CartError};
use crate::view::{Notice, PageScope};
use crate::web::context::PageContext;
use crate::web::forms::{CartAddForm, CartRemoveForm};
use crate::web::{AppError, AppState};

pub fn create_cart_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cart", get(view_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/remove", post(remove_from_cart))
        .route("/cart/checkout", post(checkout))
}

fn store_cart(ctx: &mut PageContext, cart: &Cart) -> Result<(), AppError> {
    if cart.is_empty() {
        ctx.remove_cookie(CART_COOKIE);
    } else {
        ctx.set_cookie(CART_COOKIE, cart.to_cookie_value()?);
    }
    Ok(())
}

#[axum::debug_handler]
async fn view_cart(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let cart = ctx.cart();
    let mut context = ctx.base_context();
    context.insert("lines", &cart.lines());
    context.insert("total", &cart.total());
    context.insert("currency", &cart.currency());
    ctx.page(&app_state, "cart.html", &context)
}

#[axum::debug_handler]
async fn add_to_cart(
    State(app_state): State<Arc<AppState>>,
    mut ctx: PageContext,
    Form(form): Form<CartAddForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let back = format!("/plans/{}", form.plan_id);
    let plan = match app_state.plans.get(form.plan_id, scope.token()).await {
        Ok(plan) => plan,
        Err(err) => {
            let notice = Notice::from_api_error(&err, &ctx.locale);
            return Ok(ctx.redirect(&back, notice));
        }
    };

    let mut cart = ctx.cart();
    if let Err(e) = cart.add(&plan, &form.hostname, &form.os, form.duration_months) {
        return Ok(ctx.redirect(&back, Some(Notice::error(e.to_string()))));
    }
    store_cart(&mut ctx, &cart)?;
    let notice = Notice::success(ctx.t("cart.added"));
    Ok(ctx.redirect("/cart", Some(notice)))
}

async fn remove_from_cart(
    mut ctx: PageContext,
    Form(form): Form<CartRemoveForm>,
) -> Result<Response, AppError> {
    let mut cart = ctx.cart();
    if cart.remove(form.item_id) {
        store_cart(&mut ctx, &cart)?;
    }
    Ok(ctx.redirect("/cart", None))
}

#[axum::debug_handler]
async fn checkout(
    State(app_state): State<Arc<AppState>>,
    mut ctx: PageContext,
) -> Result<Response, AppError> {
    if !ctx.is_signed_in() {
        return Err(ctx.login_required());
    }
    let cart = ctx.cart();

    // Prices come from the catalogue, never from the cookie.
    let scope = PageScope::new();
    let mut plans = HashMap::new();
    for plan_id in cart.plan_ids() {
        match app_state.plans.get(plan_id, scope.token()).await {
            Ok(plan) => {
                plans.insert(plan.id, plan);
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => {
                let notice = Notice::from_api_error(&err, &ctx.locale);
                return Ok(ctx.redirect("/cart", notice));
            }
        }
    }

    let request = match cart.checkout_request(&plans) {
        Ok(request) => request,
        Err(CartError::Empty) => {
            let notice = Notice::error(ctx.t("cart.empty"));
            return Ok(ctx.redirect("/cart", Some(notice)));
        }
        Err(e) => {
            warn!(error = %e, "Cart rejected at checkout.");
            return Ok(ctx.redirect("/cart", Some(Notice::error(e.to_string()))));
        }
    };

    match app_state.orders.checkout(ctx.token(), &request, scope.token()).await {
        Ok(order) => {
            info!(order_number = %order.order_number, items = order.items.len(), "Order placed.");
            ctx.remove_cookie(CART_COOKIE);
            let notice = Notice::success(format!(
                "{} {}",
                ctx.t("cart.order_placed"),
                order.order_number
            ));
            Ok(ctx.redirect("/dashboard/billing", Some(notice)))
        }
        Err(err) if err.requires_login() => Err(ctx.login_required()),
        Err(err) => {
            warn!(error = %err, "Checkout failed.");
            let notice = Notice::from_api_error(&err, &ctx.locale);
            Ok(ctx.redirect("/cart", notice))
        }
    }
}
