//! Form and query payloads of the page routes. HTML forms send strings for
//! everything, so conversion into backend DTOs happens here.

use serde::Deserialize;
use uuid::Uuid;

use crate::models::{
    ArticleInput, OrderStatus, PlanCategory, PlanInput, PlanSpec, PowerAction, UserRole,
    UserUpdate,
};
use crate::web::AppError;

#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SlugPath {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderNumberPath {
    pub order_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    #[serde(default)]
    pub return_to: Option<String>,
}

impl ThemeForm {
    /// Path inside the current locale to go back to. Anything that is not a
    /// plain local path falls back to the home page.
    pub fn return_path(&self) -> &str {
        match self.return_to.as_deref() {
            Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
            _ => "/",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub email: String,
    pub new_password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct CartAddForm {
    pub plan_id: i64,
    pub hostname: String,
    pub os: String,
    pub duration_months: u32,
}

#[derive(Debug, Deserialize)]
pub struct CartRemoveForm {
    pub item_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PowerForm {
    pub action: String,
}

impl PowerForm {
    pub fn action(&self) -> Result<PowerAction, AppError> {
        self.action.parse().map_err(AppError::InvalidInput)
    }
}

#[derive(Debug, Deserialize)]
pub struct SnapshotForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotNameForm {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateForm {
    pub order_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct RrdQuery {
    pub timeframe: Option<String>,
    pub cf: Option<String>,
}

/// Admin plan editor. `use_cases` is one comma-separated field and
/// `is_active` a checkbox, present only when ticked.
#[derive(Debug, Deserialize)]
pub struct PlanForm {
    pub name: String,
    pub category: String,
    pub vcpu: u32,
    pub ram_gb: u32,
    pub storage_type: String,
    pub storage_gb: u32,
    pub bandwidth: String,
    pub price_monthly: f64,
    pub currency: String,
    #[serde(default)]
    pub use_cases: String,
    #[serde(default)]
    pub max_snapshots: u32,
    #[serde(default)]
    pub max_ips: u32,
    #[serde(default)]
    pub is_active: Option<String>,
}

impl PlanForm {
    pub fn into_input(self) -> Result<PlanInput, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Plan name is required".to_string()));
        }
        if !self.price_monthly.is_finite() || self.price_monthly < 0.0 {
            return Err(AppError::InvalidInput(
                "Monthly price must be a positive amount".to_string(),
            ));
        }
        let category: PlanCategory = self.category.parse().map_err(AppError::InvalidInput)?;
        let currency = match self.currency.trim() {
            "" => "IDR".to_string(),
            c => c.to_ascii_uppercase(),
        };

        Ok(PlanInput {
            name,
            category,
            spec: PlanSpec {
                vcpu: self.vcpu,
                ram_gb: self.ram_gb,
                storage_type: self.storage_type.trim().to_string(),
                storage_gb: self.storage_gb,
                bandwidth: self.bandwidth.trim().to_string(),
            },
            price_monthly: self.price_monthly,
            currency,
            use_cases: self
                .use_cases
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            max_snapshots: self.max_snapshots,
            max_ips: self.max_ips,
            is_active: self.is_active.is_some(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ArticleForm {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    pub body: String,
    #[serde(default)]
    pub published: Option<String>,
}

/// Lowercase ASCII slug with single hyphens between words.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

impl ArticleForm {
    pub fn into_input(self) -> Result<ArticleInput, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Title is required".to_string()));
        }
        let slug = match slugify(&self.slug) {
            s if s.is_empty() => slugify(&title),
            s => s,
        };
        Ok(ArticleInput {
            title,
            slug,
            body: self.body,
            published: self.published.is_some(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusForm {
    pub status: String,
}

impl OrderStatusForm {
    pub fn status(&self) -> Result<OrderStatus, AppError> {
        self.status.parse().map_err(AppError::InvalidInput)
    }
}

#[derive(Debug, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<String>,
}

impl UserForm {
    pub fn into_update(self) -> Result<UserUpdate, AppError> {
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(role) => Some(role.parse::<UserRole>().map_err(AppError::InvalidInput)?),
        };
        Ok(UserUpdate {
            name: self
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            role,
            is_active: Some(self.is_active.is_some()),
        })
    }
}
