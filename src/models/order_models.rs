use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::view::collection::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub plan_id: i64,
    #[serde(default)]
    pub plan_name: Option<String>,
    pub hostname: String,
    pub os: String,
    pub duration_months: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "IDR".to_string()
}

impl Keyed for Order {
    type Key = String;

    fn key(&self) -> String {
        self.order_number.clone()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub items: Vec<OrderItem>,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}
