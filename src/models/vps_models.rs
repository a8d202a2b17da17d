use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::view::collection::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VpsStatus {
    Active,
    Suspended,
    Terminated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerStatus {
    Running,
    Stopped,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Live virtual machine state embedded in a VPS record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmDescriptor {
    pub hostname: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub vcpu: u32,
    pub ram_mb: u64,
    pub storage_gb: u64,
    #[serde(default)]
    pub power_status: PowerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpsInstance {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    #[serde(default)]
    pub plan_name: Option<String>,
    pub vm: VmDescriptor,
    pub status: VpsStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Start,
    Stop,
    Reboot,
}

impl PowerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerAction::Start => "start",
            PowerAction::Stop => "stop",
            PowerAction::Reboot => "reboot",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(PowerAction::Start),
            "stop" => Ok(PowerAction::Stop),
            "reboot" => Ok(PowerAction::Reboot),
            other => Err(format!("Unsupported power action: {other}")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PowerRequest {
    pub action: PowerAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub vps_id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Keyed for Snapshot {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSnapshotRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RestoreSnapshotRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SetupRequest {
    pub order_number: String,
}

/// Time window of an RRD metrics query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Timeframe::Hour),
            "day" => Ok(Timeframe::Day),
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "year" => Ok(Timeframe::Year),
            other => Err(format!("Unsupported timeframe: {other}")),
        }
    }
}

/// RRD consolidation function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsolidationFn {
    #[default]
    Average,
    Max,
}

impl ConsolidationFn {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsolidationFn::Average => "AVERAGE",
            ConsolidationFn::Max => "MAX",
        }
    }
}

impl FromStr for ConsolidationFn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVERAGE" => Ok(ConsolidationFn::Average),
            "MAX" => Ok(ConsolidationFn::Max),
            other => Err(format!("Unsupported consolidation function: {other}")),
        }
    }
}

/// One sample of the metrics series. Every gauge is optional because the
/// hypervisor leaves gaps while a VM is stopped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RrdPoint {
    pub time: i64,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub mem: Option<f64>,
    #[serde(default)]
    pub maxmem: Option<f64>,
    #[serde(default)]
    pub netin: Option<f64>,
    #[serde(default)]
    pub netout: Option<f64>,
    #[serde(default)]
    pub diskread: Option<f64>,
    #[serde(default)]
    pub diskwrite: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vps_deserializes_with_unknown_power_state() {
        let vps: VpsInstance = serde_json::from_value(serde_json::json!({
            "id": 7,
            "user_id": 3,
            "plan_id": 2,
            "vm": {
                "hostname": "web-1",
                "ip_address": "203.0.113.10",
                "vcpu": 2,
                "ram_mb": 4096,
                "storage_gb": 80,
                "power_status": "paused"
            },
            "status": "active",
            "created_at": "2026-01-02T03:04:05Z"
        }))
        .unwrap();

        assert_eq!(vps.vm.power_status, PowerStatus::Unknown);
        assert_eq!(vps.status, VpsStatus::Active);
        assert!(vps.expires_at.is_none());
    }

    #[test]
    fn test_power_action_parsing() {
        assert_eq!("reboot".parse::<PowerAction>().unwrap(), PowerAction::Reboot);
        assert!("shutdown".parse::<PowerAction>().is_err());
    }

    #[test]
    fn test_rrd_query_values() {
        assert_eq!("max".parse::<ConsolidationFn>().unwrap().as_str(), "MAX");
        assert_eq!("week".parse::<Timeframe>().unwrap(), Timeframe::Week);
        assert!("decade".parse::<Timeframe>().is_err());
    }
}
