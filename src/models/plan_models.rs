use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::view::collection::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanCategory {
    Basic,
    Standard,
    Premium,
}

impl PlanCategory {
    pub const ALL: [PlanCategory; 3] = [
        PlanCategory::Basic,
        PlanCategory::Standard,
        PlanCategory::Premium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanCategory::Basic => "basic",
            PlanCategory::Standard => "standard",
            PlanCategory::Premium => "premium",
        }
    }
}

impl fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(PlanCategory::Basic),
            "standard" => Ok(PlanCategory::Standard),
            "premium" => Ok(PlanCategory::Premium),
            other => Err(format!("Unknown plan category: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSpec {
    pub vcpu: u32,
    pub ram_gb: u32,
    pub storage_type: String,
    pub storage_gb: u32,
    pub bandwidth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub category: PlanCategory,
    pub spec: PlanSpec,
    pub price_monthly: f64,
    pub currency: String,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub max_snapshots: u32,
    #[serde(default)]
    pub max_ips: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Keyed for Plan {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

/// Body of the admin create/update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    pub name: String,
    pub category: PlanCategory,
    pub spec: PlanSpec,
    pub price_monthly: f64,
    pub currency: String,
    pub use_cases: Vec<String>,
    pub max_snapshots: u32,
    pub max_ips: u32,
    pub is_active: bool,
}
