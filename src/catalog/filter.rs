use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{Plan, PlanCategory};

/// Memory buckets offered by the plan listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryTier {
    /// Up to 2 GB.
    Small,
    /// 3 to 8 GB.
    Medium,
    /// More than 8 GB.
    Large,
}

impl MemoryTier {
    pub fn contains(&self, ram_gb: u32) -> bool {
        match self {
            MemoryTier::Small => ram_gb <= 2,
            MemoryTier::Medium => (3..=8).contains(&ram_gb),
            MemoryTier::Large => ram_gb > 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryTier::Small => "small",
            MemoryTier::Medium => "medium",
            MemoryTier::Large => "large",
        }
    }
}

impl FromStr for MemoryTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(MemoryTier::Small),
            "medium" => Ok(MemoryTier::Medium),
            "large" => Ok(MemoryTier::Large),
            other => Err(format!("Unknown memory tier: {other}")),
        }
    }
}

/// Raw query string of the plan listing. HTML forms submit empty strings for
/// untouched inputs, so every field is parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanQuery {
    pub category: Option<String>,
    pub memory: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub page: Option<String>,
}

impl PlanQuery {
    /// Requested page, 1-based. Blank, zero or unparseable values mean 1.
    pub fn page(&self) -> usize {
        non_empty(&self.page)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlanFilter {
    pub category: Option<PlanCategory>,
    pub memory: Option<MemoryTier>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PlanFilter {
    /// Builds a filter from the query string; unparseable values are ignored.
    pub fn from_query(query: &PlanQuery) -> Self {
        let price = |value: &Option<String>| {
            non_empty(value)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|p| p.is_finite() && *p >= 0.0)
        };
        Self {
            category: non_empty(&query.category).and_then(|v| v.parse().ok()),
            memory: non_empty(&query.memory).and_then(|v| v.parse().ok()),
            min_price: price(&query.min_price),
            max_price: price(&query.max_price),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PlanFilter::default()
    }

    pub fn matches(&self, plan: &Plan) -> bool {
        self.category.is_none_or(|category| plan.category == category)
            && self.memory.is_none_or(|tier| tier.contains(plan.spec.ram_gb))
            && self.min_price.is_none_or(|min| plan.price_monthly >= min)
            && self.max_price.is_none_or(|max| plan.price_monthly <= max)
    }

    /// Query string reproducing this filter, for pagination links.
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(format!("category={}", category.as_str()));
        }
        if let Some(memory) = self.memory {
            pairs.push(format!("memory={}", memory.as_str()));
        }
        if let Some(min) = self.min_price {
            pairs.push(format!("min_price={min}"));
        }
        if let Some(max) = self.max_price {
            pairs.push(format!("max_price={max}"));
        }
        pairs.join("&")
    }

    /// Matching plans in their original order.
    pub fn apply(&self, plans: &[Plan]) -> Vec<Plan> {
        plans
            .iter()
            .filter(|plan| self.matches(plan))
            .cloned()
            .collect()
    }
}
