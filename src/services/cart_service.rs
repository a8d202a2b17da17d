//! The shopping cart. It lives in a cookie as URL-encoded JSON, so anything
//! read back from it is only a display hint: the checkout request is priced
//! from plans fetched from the backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::catalog::pricing::{self, Quote};
use crate::models::{CheckoutRequest, OrderItem, Plan};

pub const CART_COOKIE: &str = "cart";
/// Keeps the cookie well below the 4 KB browser limit.
pub const MAX_CART_ITEMS: usize = 8;

/// Operating system images offered at checkout.
pub const OS_CHOICES: &[&str] = &[
    "ubuntu-24.04",
    "ubuntu-22.04",
    "debian-12",
    "rocky-9",
    "almalinux-9",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CartError {
    #[error("Hostname must be 1-63 lowercase letters, digits or hyphens")]
    InvalidHostname,
    #[error("Unsupported operating system: {0}")]
    UnsupportedOs(String),
    #[error("Unsupported billing period: {0} months")]
    UnsupportedDuration(u32),
    #[error("Plan {0} is not available")]
    PlanUnavailable(i64),
    #[error("The cart is full")]
    Full,
    #[error("The cart is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub plan_id: i64,
    pub plan_name: String,
    pub hostname: String,
    pub os: String,
    pub duration_months: u32,
    pub price_monthly: f64,
    pub currency: String,
}

impl CartItem {
    /// Price at the monthly rate stored with the item. `None` for a billing
    /// period that is not offered.
    pub fn quote(&self) -> Option<Quote> {
        pricing::duration_option(self.duration_months)
            .map(|option| pricing::quote(self.price_monthly, option))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

/// Cart line as rendered by the cart page.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub quote: Quote,
}

/// RFC 1123 host label.
pub fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname.len() <= 63
        && !hostname.starts_with('-')
        && !hostname.ends_with('-')
        && hostname
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl Cart {
    /// Reads the cart cookie. A malformed cookie yields an empty cart.
    pub fn from_cookie_value(value: &str) -> Self {
        let decoded = match urlencoding::decode(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "Cart cookie is not valid UTF-8; starting a new cart.");
                return Cart::default();
            }
        };
        serde_json::from_str(&decoded).unwrap_or_else(|e| {
            warn!(error = %e, "Cart cookie could not be parsed; starting a new cart.");
            Cart::default()
        })
    }

    pub fn to_cookie_value(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(urlencoding::encode(&json).into_owned())
    }

    pub fn add(
        &mut self,
        plan: &Plan,
        hostname: &str,
        os: &str,
        duration_months: u32,
    ) -> Result<&CartItem, CartError> {
        if !plan.is_active {
            return Err(CartError::PlanUnavailable(plan.id));
        }
        let hostname = hostname.trim().to_ascii_lowercase();
        if !is_valid_hostname(&hostname) {
            return Err(CartError::InvalidHostname);
        }
        if !OS_CHOICES.contains(&os) {
            return Err(CartError::UnsupportedOs(os.to_string()));
        }
        if pricing::duration_option(duration_months).is_none() {
            return Err(CartError::UnsupportedDuration(duration_months));
        }
        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CartError::Full);
        }

        self.items.push(CartItem {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            hostname,
            os: os.to_string(),
            duration_months,
            price_monthly: plan.price_monthly,
            currency: plan.currency.clone(),
        });
        Ok(&self.items[self.items.len() - 1])
    }

    /// Returns whether an item was removed.
    pub fn remove(&mut self, item_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        self.items.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items with an offered billing period, as shown on the cart page.
    pub fn lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .filter_map(|item| {
                item.quote().map(|quote| CartLine {
                    item: item.clone(),
                    quote,
                })
            })
            .collect()
    }

    pub fn total(&self) -> f64 {
        self.lines().iter().map(|line| line.quote.total).sum()
    }

    /// Distinct plans referenced by the cart, in first-seen order.
    pub fn plan_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for item in &self.items {
            if !ids.contains(&item.plan_id) {
                ids.push(item.plan_id);
            }
        }
        ids
    }

    /// Currency of the cart; plans are priced in a single currency.
    pub fn currency(&self) -> String {
        self.items
            .first()
            .map(|item| item.currency.clone())
            .unwrap_or_else(|| "IDR".to_string())
    }

    /// Builds the order from `plans`, the current catalogue entries keyed by
    /// id. Prices, names and the currency stored in the cookie are ignored.
    pub fn checkout_request(
        &self,
        plans: &HashMap<i64, Plan>,
    ) -> Result<CheckoutRequest, CartError> {
        if self.items.is_empty() {
            return Err(CartError::Empty);
        }
        let mut items = Vec::with_capacity(self.items.len());
        let mut currency = None;
        for item in &self.items {
            let option = pricing::duration_option(item.duration_months)
                .ok_or(CartError::UnsupportedDuration(item.duration_months))?;
            let plan = plans
                .get(&item.plan_id)
                .filter(|plan| plan.is_active)
                .ok_or(CartError::PlanUnavailable(item.plan_id))?;
            if !is_valid_hostname(&item.hostname) {
                return Err(CartError::InvalidHostname);
            }
            if !OS_CHOICES.contains(&item.os.as_str()) {
                return Err(CartError::UnsupportedOs(item.os.clone()));
            }
            currency.get_or_insert_with(|| plan.currency.clone());
            items.push(OrderItem {
                plan_id: plan.id,
                plan_name: Some(plan.name.clone()),
                hostname: item.hostname.clone(),
                os: item.os.clone(),
                duration_months: option.months,
                price: pricing::quote(plan.price_monthly, option).total,
            });
        }
        Ok(CheckoutRequest {
            items,
            currency: currency.unwrap_or_else(|| "IDR".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanCategory, PlanSpec};

    fn plan() -> Plan {
        Plan {
            id: 3,
            name: "Standard 4GB".to_string(),
            category: PlanCategory::Standard,
            spec: PlanSpec {
                vcpu: 2,
                ram_gb: 4,
                storage_type: "NVMe".to_string(),
                storage_gb: 80,
                bandwidth: "2 TB".to_string(),
            },
            price_monthly: 250_000.0,
            currency: "IDR".to_string(),
            use_cases: vec!["web".to_string()],
            max_snapshots: 3,
            max_ips: 1,
            is_active: true,
        }
    }

    fn catalogue(plan: Plan) -> HashMap<i64, Plan> {
        HashMap::from([(plan.id, plan)])
    }

    fn edited_cookie(price_monthly: f64, duration_months: u32) -> String {
        let json = serde_json::json!({
            "items": [{
                "id": Uuid::new_v4(),
                "plan_id": 3,
                "plan_name": "Standard 4GB",
                "hostname": "web",
                "os": "debian-12",
                "duration_months": duration_months,
                "price_monthly": price_monthly,
                "currency": "IDR"
            }]
        });
        urlencoding::encode(&json.to_string()).into_owned()
    }

    #[test]
    fn test_add_and_checkout_uses_discounted_total() {
        let mut cart = Cart::default();
        cart.add(&plan(), " Web-01 ", "debian-12", 12).unwrap();

        assert_eq!(cart.items[0].hostname, "web-01");
        assert_eq!(cart.total(), 2_550_000.0);

        let request = cart.checkout_request(&catalogue(plan())).unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].price, 2_550_000.0);
        assert_eq!(request.currency, "IDR");
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.add(&plan(), "-web", "debian-12", 1).unwrap_err(),
            CartError::InvalidHostname
        );
        assert_eq!(
            cart.add(&plan(), "web", "windows", 1).unwrap_err(),
            CartError::UnsupportedOs("windows".to_string())
        );
        assert_eq!(
            cart.add(&plan(), "web", "debian-12", 24).unwrap_err(),
            CartError::UnsupportedDuration(24)
        );

        let mut retired = plan();
        retired.is_active = false;
        assert_eq!(
            cart.add(&retired, "web", "debian-12", 1).unwrap_err(),
            CartError::PlanUnavailable(3)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_is_bounded() {
        let mut cart = Cart::default();
        for i in 0..MAX_CART_ITEMS {
            cart.add(&plan(), &format!("node-{i}"), "rocky-9", 1).unwrap();
        }
        assert_eq!(
            cart.add(&plan(), "one-more", "rocky-9", 1).unwrap_err(),
            CartError::Full
        );
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::default();
        let id = cart.add(&plan(), "web", "ubuntu-24.04", 3).unwrap().id;
        assert!(!cart.remove(Uuid::new_v4()));
        assert!(cart.remove(id));
        assert_eq!(
            cart.checkout_request(&catalogue(plan())).unwrap_err(),
            CartError::Empty
        );
    }

    #[test]
    fn test_cookie_value_survives_and_garbage_is_empty() {
        let mut cart = Cart::default();
        cart.add(&plan(), "web", "ubuntu-24.04", 6).unwrap();

        let value = cart.to_cookie_value().unwrap();
        assert!(!value.contains('"'));
        assert_eq!(Cart::from_cookie_value(&value), cart);
        assert_eq!(Cart::from_cookie_value("%7Bnot-json"), Cart::default());
    }

    #[test]
    fn test_checkout_prices_from_catalogue_not_cookie() {
        let cart = Cart::from_cookie_value(&edited_cookie(1.0, 12));
        assert_eq!(cart.items.len(), 1);

        let request = cart.checkout_request(&catalogue(plan())).unwrap();
        assert_eq!(request.items[0].price, 2_550_000.0);
        assert_eq!(request.items[0].duration_months, 12);
    }

    #[test]
    fn test_checkout_rejects_unoffered_duration() {
        let cart = Cart::from_cookie_value(&edited_cookie(250_000.0, 24));
        assert_eq!(
            cart.checkout_request(&catalogue(plan())).unwrap_err(),
            CartError::UnsupportedDuration(24)
        );
        // Nothing is shown or totalled for it either.
        assert!(cart.lines().is_empty());
        assert_eq!(cart.total(), 0.0);
    }

    #[test]
    fn test_checkout_rejects_missing_or_retired_plan() {
        let cart = Cart::from_cookie_value(&edited_cookie(250_000.0, 1));
        assert_eq!(
            cart.checkout_request(&HashMap::new()).unwrap_err(),
            CartError::PlanUnavailable(3)
        );

        let mut retired = plan();
        retired.is_active = false;
        assert_eq!(
            cart.checkout_request(&catalogue(retired)).unwrap_err(),
            CartError::PlanUnavailable(3)
        );
    }
}
