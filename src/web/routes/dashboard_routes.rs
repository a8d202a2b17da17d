use axum::{
    Form, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::ApiError;
use crate::models::{
    CreateSnapshotRequest, PasswordChange, ProfileUpdate, Snapshot, VpsInstance,
};
use crate::services::provisioning_service::{self, SetupOutcome};
use crate::view::{Collection, LoadState, Notice, PageScope};
use crate::web::context::PageContext;
use crate::web::forms::{
    ActivateForm, IdPath, PasswordForm, PowerForm, ProfileForm, SnapshotForm, SnapshotNameForm,
};
use crate::web::routes::{
    insert_state, load_state, mount_collection, mutation_notice, patch_collection,
};
use crate::web::{AppError, AppState};

/// VPS shown on the overview page.
const RECENT_VPS_LIMIT: usize = 5;
const MAX_SNAPSHOT_NAME_LEN: usize = 40;
const MIN_PASSWORD_LEN: usize = 8;

pub fn create_dashboard_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(overview))
        .route("/vps", get(vps_list))
        .route("/vps/{id}", get(vps_detail))
        .route("/vps/{id}/power", post(power_action))
        .route("/vps/{id}/snapshots", post(create_snapshot))
        .route("/vps/{id}/snapshots/restore", post(restore_snapshot))
        .route("/vps/{id}/snapshots/delete", post(delete_snapshot))
        .route("/billing", get(billing))
        .route("/billing/activate", post(activate_order))
        .route("/settings", get(settings))
        .route("/settings/profile", post(update_profile))
        .route("/settings/password", post(change_password))
}

/// Snapshot names start with a letter and use letters, digits, `-` or `_`.
pub fn is_valid_snapshot_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && name.len() <= MAX_SNAPSHOT_NAME_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[axum::debug_handler]
async fn overview(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let (instances, account) = tokio::join!(
        app_state
            .vps
            .list_my_vps(ctx.token(), Some(RECENT_VPS_LIMIT), scope.token()),
        app_state.users.me(ctx.token(), scope.token()),
    );
    let instances = load_state(&ctx, instances)?;
    let account = load_state(&ctx, account)?;

    let mut context = ctx.base_context();
    insert_state(&mut context, "instances", &instances);
    if let Some(user) = account.data() {
        context.insert("user", user);
    }
    context.insert("plans_href", &ctx.href("/plans"));
    ctx.page(&app_state, "dashboard/overview.html", &context)
}

#[axum::debug_handler]
async fn vps_list(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let result = app_state.vps.list_my_vps(ctx.token(), None, scope.token()).await;
    let instances = load_state(&ctx, result)?;

    let mut context = ctx.base_context();
    insert_state(&mut context, "instances", &instances);
    context.insert("plans_href", &ctx.href("/plans"));
    ctx.page(&app_state, "dashboard/vps_list.html", &context)
}

/// Fetches the instance and renders the detail page around the given
/// snapshot list.
async fn render_detail(
    app_state: &AppState,
    ctx: PageContext,
    vps_id: i64,
    snapshots: LoadState<Collection<Snapshot>>,
    notice: Option<Notice>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let info = app_state.vps.get_info(ctx.token(), vps_id, scope.token()).await;
    detail_page(app_state, ctx, info, snapshots, notice)
}

fn detail_page(
    app_state: &AppState,
    ctx: PageContext,
    info: Result<VpsInstance, ApiError>,
    snapshots: LoadState<Collection<Snapshot>>,
    notice: Option<Notice>,
) -> Result<Response, AppError> {
    if let Err(err) = &info {
        if err.is_not_found() {
            return Err(AppError::NotFound("VPS".to_string()));
        }
    }
    let info = load_state(&ctx, info)?;
    let snapshots = snapshots.map(Collection::into_items);

    let mut context = ctx.base_context();
    insert_state(&mut context, "vps", &info);
    match &snapshots {
        LoadState::Loaded(items) => context.insert("snapshots", items),
        LoadState::Failed(failure) => context.insert("snapshots_error", failure),
        LoadState::Loading => {}
    }
    if notice.is_some() {
        context.insert("notice", &notice);
    }
    ctx.page(app_state, "dashboard/vps_detail.html", &context)
}

#[axum::debug_handler]
async fn vps_detail(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let key = ctx.scoped_view_key(path.id);
    let (info, snapshots) = tokio::join!(
        app_state.vps.get_info(ctx.token(), path.id, scope.token()),
        mount_collection(
            &ctx,
            &app_state.views.snapshots,
            key,
            app_state.vps.list_snapshots(ctx.token(), path.id, scope.token()),
        ),
    );
    detail_page(&app_state, ctx, info, snapshots?, None)
}

#[axum::debug_handler]
async fn power_action(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
    Form(form): Form<PowerForm>,
) -> Result<Response, AppError> {
    let back = format!("/dashboard/vps/{}", path.id);
    let action = match form.action() {
        Ok(action) => action,
        Err(AppError::InvalidInput(message)) => {
            return Ok(ctx.redirect(&back, Some(Notice::error(message))));
        }
        Err(other) => return Err(other),
    };

    let scope = PageScope::new();
    let result = app_state
        .vps
        .power(ctx.token(), path.id, action, scope.token())
        .await;
    let fallback = ctx.t("vps.power_sent");
    let notice = mutation_notice(&ctx, result, |ack| {
        if ack.message.is_empty() {
            Notice::success(fallback)
        } else {
            Notice::success(ack.message)
        }
    })?;
    Ok(ctx.redirect(&back, notice))
}

#[axum::debug_handler]
async fn create_snapshot(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
    Form(form): Form<SnapshotForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let key = ctx.scoped_view_key(path.id);
    let name = form.name.trim().to_string();
    if !is_valid_snapshot_name(&name) {
        let snapshots = app_state
            .views
            .snapshots
            .get(&key)
            .await
            .map_or(LoadState::Loading, LoadState::Loaded);
        let notice = Notice::error(ctx.t("vps.snapshot_name_invalid"));
        return render_detail(&app_state, ctx, path.id, snapshots, Some(notice)).await;
    }

    let request = CreateSnapshotRequest {
        name: name.clone(),
        description: form
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    };
    let created = app_state
        .vps
        .create_snapshot(ctx.token(), path.id, &request, scope.token())
        .await
        .map(|_| Snapshot {
            name: request.name.clone(),
            description: request.description.clone(),
            vps_id: path.id,
            created_at: Some(Utc::now()),
        });
    if created.is_ok() {
        info!(vps_id = path.id, snapshot = %name, "Snapshot created.");
    }

    let success = Notice::success(ctx.t("vps.snapshot_created"));
    let (snapshots, notice) = patch_collection(
        &ctx,
        &app_state.views.snapshots,
        key,
        app_state.vps.list_snapshots(ctx.token(), path.id, scope.token()),
        |collection| collection.apply_created(created),
        success,
    )
    .await?;
    render_detail(&app_state, ctx, path.id, snapshots, notice).await
}

#[axum::debug_handler]
async fn restore_snapshot(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
    Form(form): Form<SnapshotNameForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let result = app_state
        .vps
        .restore_snapshot(ctx.token(), path.id, &form.name, scope.token())
        .await;
    let restored = ctx.t("vps.snapshot_restored");
    let notice = mutation_notice(&ctx, result, |ack| {
        if ack.message.is_empty() {
            Notice::success(restored)
        } else {
            Notice::success(ack.message)
        }
    })?;
    // Restoring leaves the snapshot list as it was.
    let snapshots = app_state
        .views
        .snapshots
        .get(&ctx.scoped_view_key(path.id))
        .await
        .map_or(LoadState::Loading, LoadState::Loaded);
    render_detail(&app_state, ctx, path.id, snapshots, notice).await
}

#[axum::debug_handler]
async fn delete_snapshot(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    ctx: PageContext,
    Form(form): Form<SnapshotNameForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let key = ctx.scoped_view_key(path.id);
    let result = app_state
        .vps
        .delete_snapshot(ctx.token(), path.id, &form.name, scope.token())
        .await;

    let success = Notice::success(ctx.t("vps.snapshot_deleted"));
    let name = form.name.clone();
    let (snapshots, notice) = patch_collection(
        &ctx,
        &app_state.views.snapshots,
        key,
        app_state.vps.list_snapshots(ctx.token(), path.id, scope.token()),
        |collection| collection.apply_removed(&name, result),
        success,
    )
    .await?;
    render_detail(&app_state, ctx, path.id, snapshots, notice).await
}

#[axum::debug_handler]
async fn billing(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let orders = mount_collection(
        &ctx,
        &app_state.views.orders,
        ctx.scoped_view_key("billing"),
        app_state.orders.my_orders(ctx.token(), scope.token()),
    )
    .await?
    .map(Collection::into_items);

    let mut context = ctx.base_context();
    insert_state(&mut context, "orders", &orders);
    ctx.page(&app_state, "dashboard/billing.html", &context)
}

/// Provisions the VPS of a paid order. The customer is told about the new
/// instance through the notifier; when that fails the VPS still exists and
/// the page says so.
#[axum::debug_handler]
async fn activate_order(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<ActivateForm>,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let account = match app_state.users.me(ctx.token(), scope.token()).await {
        Ok(account) => account,
        Err(err) if err.requires_login() => return Err(ctx.login_required()),
        Err(err) => {
            let notice = Notice::from_api_error(&err, &ctx.locale);
            return Ok(ctx.redirect("/dashboard/billing", notice));
        }
    };

    let outcome = provisioning_service::setup_vps(
        &app_state.vps,
        app_state.notifier.as_deref(),
        ctx.token(),
        &form.order_number,
        &account.email,
        scope.token(),
    )
    .await;

    match outcome {
        Ok(SetupOutcome::Provisioned(vps)) => {
            let notice = Notice::success(format!(
                "{} {}",
                ctx.t("billing.provisioned"),
                vps.vm.hostname
            ));
            Ok(ctx.redirect(&format!("/dashboard/vps/{}", vps.id), Some(notice)))
        }
        Ok(SetupOutcome::ProvisionedWithoutNotice { vps, reason }) => {
            let notice = Notice::error(format!(
                "{} {} ({reason})",
                ctx.t("billing.provisioned_without_notice"),
                vps.vm.hostname
            ));
            Ok(ctx.redirect(&format!("/dashboard/vps/{}", vps.id), Some(notice)))
        }
        Err(err) if err.requires_login() => Err(ctx.login_required()),
        Err(err) => {
            error!(order_number = %form.order_number, error = %err, "VPS setup failed.");
            let notice = Notice::from_api_error(&err, &ctx.locale);
            Ok(ctx.redirect("/dashboard/billing", notice))
        }
    }
}

#[axum::debug_handler]
async fn settings(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let result = app_state.users.me(ctx.token(), scope.token()).await;
    let account = load_state(&ctx, result)?;

    let mut context = ctx.base_context();
    insert_state(&mut context, "user", &account);
    ctx.page(&app_state, "dashboard/settings.html", &context)
}

#[axum::debug_handler]
async fn update_profile(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        let notice = Notice::error(ctx.t("settings.name_required"));
        return Ok(ctx.redirect("/dashboard/settings", Some(notice)));
    }

    let scope = PageScope::new();
    let result = app_state
        .users
        .update_me(ctx.token(), &ProfileUpdate { name }, scope.token())
        .await;
    let saved = ctx.t("settings.profile_saved");
    let notice = mutation_notice(&ctx, result, |_| Notice::success(saved))?;
    Ok(ctx.redirect("/dashboard/settings", notice))
}

#[axum::debug_handler]
async fn change_password(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    if form.new_password.chars().count() < MIN_PASSWORD_LEN {
        let notice = Notice::error(ctx.t("auth.password_too_short"));
        return Ok(ctx.redirect("/dashboard/settings", Some(notice)));
    }
    if form.new_password != form.password_confirm {
        let notice = Notice::error(ctx.t("auth.password_mismatch"));
        return Ok(ctx.redirect("/dashboard/settings", Some(notice)));
    }

    let scope = PageScope::new();
    let change = PasswordChange {
        current_password: form.current_password,
        new_password: form.new_password,
    };
    let result = app_state
        .users
        .change_password(ctx.token(), &change, scope.token())
        .await;
    let changed = ctx.t("settings.password_changed");
    let notice = mutation_notice(&ctx, result, |_| Notice::success(changed))?;
    Ok(ctx.redirect("/dashboard/settings", notice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_name_validation() {
        assert!(is_valid_snapshot_name("before-upgrade_1"));
        assert!(!is_valid_snapshot_name("1st"));
        assert!(!is_valid_snapshot_name(""));
        assert!(!is_valid_snapshot_name("has space"));
        assert!(!is_valid_snapshot_name(&"a".repeat(MAX_SNAPSHOT_NAME_LEN + 1)));
    }
}
