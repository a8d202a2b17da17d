use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::models::{Article, Plan};
use crate::view::PageScope;
use crate::web::context::{PageContext, THEME_COOKIE};
use crate::web::forms::{SlugPath, ThemeForm};
use crate::web::routes::{insert_state, load_state};
use crate::web::{AppError, AppState};

const FEATURED_PLANS: usize = 3;
const LATEST_ARTICLES: usize = 3;

fn featured_plans(plans: Vec<Plan>) -> Vec<Plan> {
    plans
        .into_iter()
        .filter(|plan| plan.is_active)
        .take(FEATURED_PLANS)
        .collect()
}

fn latest_articles(mut articles: Vec<Article>) -> Vec<Article> {
    articles.retain(|article| article.published);
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    articles.truncate(LATEST_ARTICLES);
    articles
}

#[axum::debug_handler]
pub async fn home(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let (plans, articles) = tokio::join!(
        app_state.plans.list(scope.token()),
        app_state.articles.list(scope.token()),
    );

    let plans = load_state(&ctx, plans.map(featured_plans))?;
    // The home page still renders when the blog is unavailable.
    let articles = articles.map(latest_articles).unwrap_or_else(|e| {
        debug!(error = %e, "Articles unavailable for the home page.");
        Vec::new()
    });

    let mut context = ctx.base_context();
    insert_state(&mut context, "plans", &plans);
    context.insert("articles", &articles);
    ctx.page(&app_state, "home.html", &context)
}

#[axum::debug_handler]
pub async fn privacy(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let context = ctx.base_context();
    ctx.page(&app_state, "privacy.html", &context)
}

#[axum::debug_handler]
pub async fn terms(
    State(app_state): State<Arc<AppState>>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let context = ctx.base_context();
    ctx.page(&app_state, "terms.html", &context)
}

#[axum::debug_handler]
pub async fn article(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<SlugPath>,
    ctx: PageContext,
) -> Result<Response, AppError> {
    let scope = PageScope::new();
    let result = app_state.articles.get_by_slug(&path.slug, scope.token()).await;
    if let Err(err) = &result {
        if err.is_not_found() {
            return Err(AppError::NotFound(format!("Article '{}'", path.slug)));
        }
    }
    let article = load_state(&ctx, result)?;

    let mut context = ctx.base_context();
    insert_state(&mut context, "article", &article);
    ctx.page(&app_state, "article.html", &context)
}

pub async fn toggle_theme(mut ctx: PageContext, Form(form): Form<ThemeForm>) -> Response {
    let theme = ctx.theme.toggled();
    ctx.set_cookie(THEME_COOKIE, theme.as_str().to_string());
    ctx.redirect(form.return_path(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanCategory, PlanSpec};
    use chrono::{TimeZone, Utc};

    fn plan(id: i64, is_active: bool) -> Plan {
        Plan {
            id,
            name: format!("Plan {id}"),
            category: PlanCategory::Basic,
            spec: PlanSpec {
                vcpu: 1,
                ram_gb: 1,
                storage_type: "SSD".to_string(),
                storage_gb: 20,
                bandwidth: "1 TB".to_string(),
            },
            price_monthly: 50000.0,
            currency: "IDR".to_string(),
            use_cases: vec![],
            max_snapshots: 1,
            max_ips: 1,
            is_active,
        }
    }

    fn article(id: i64, day: u32, published: bool) -> Article {
        Article {
            id,
            title: format!("Post {id}"),
            slug: format!("post-{id}"),
            body: String::new(),
            published,
            created_at: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_featured_plans_skip_inactive() {
        let plans = vec![plan(1, false), plan(2, true), plan(3, true), plan(4, true), plan(5, true)];
        let ids: Vec<i64> = featured_plans(plans).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_latest_articles_newest_first() {
        let articles = vec![
            article(1, 1, true),
            article(2, 5, false),
            article(3, 3, true),
            article(4, 4, true),
            article(5, 2, true),
        ];
        let ids: Vec<i64> = latest_articles(articles).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![4, 3, 5]);
    }
}
