//! Activation of a paid order: provision the VPS, then tell the customer.

use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::{ApiError, VpsApi};
use crate::models::VpsInstance;
use crate::notifications::Notifier;

/// Webhook body; values are filled in as JSON string literals.
pub const SETUP_NOTICE_TEMPLATE: &str = r#"{"event": "vps_provisioned", "order_number": {{ order_number }}, "email": {{ email }}, "hostname": {{ hostname }}, "ip_address": {{ ip_address }} }"#;

/// Result of a setup whose primary action succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupOutcome {
    Provisioned(VpsInstance),
    /// The VPS exists but the confirmation could not be delivered.
    ProvisionedWithoutNotice { vps: VpsInstance, reason: String },
}

pub async fn setup_vps(
    vps_api: &VpsApi,
    notifier: Option<&dyn Notifier>,
    token: Option<&str>,
    order_number: &str,
    recipient_email: &str,
    cancel: &CancellationToken,
) -> Result<SetupOutcome, ApiError> {
    let vps = vps_api.setup(token, order_number, cancel).await?;
    info!(order_number, vps_id = vps.id, hostname = %vps.vm.hostname, "VPS provisioned.");

    let Some(notifier) = notifier else {
        return Ok(SetupOutcome::Provisioned(vps));
    };

    let mut context = HashMap::new();
    context.insert("order_number".to_string(), order_number.to_string());
    context.insert("email".to_string(), recipient_email.to_string());
    context.insert("hostname".to_string(), vps.vm.hostname.clone());
    context.insert(
        "ip_address".to_string(),
        vps.vm.ip_address.clone().unwrap_or_default(),
    );

    match notifier.send(SETUP_NOTICE_TEMPLATE, &context).await {
        Ok(()) => Ok(SetupOutcome::Provisioned(vps)),
        Err(e) => {
            error!(order_number, vps_id = vps.id, error = %e, "VPS provisioned but the confirmation was not delivered.");
            Ok(SetupOutcome::ProvisionedWithoutNotice {
                vps,
                reason: e.to_string(),
            })
        }
    }
}
