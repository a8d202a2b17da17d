use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{ActionAck, ApiClient, ApiError, Call};
use crate::models::{
    ConsolidationFn, CreateSnapshotRequest, PowerAction, PowerRequest, RestoreSnapshotRequest,
    RrdPoint, SetupRequest, Snapshot, Timeframe, VpsInstance,
};

/// VPS endpoints: listing, live info, metrics, power and snapshots.
#[derive(Clone)]
pub struct VpsApi {
    client: ApiClient,
}

impl VpsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Lists the caller's instances in backend order, at most `limit` of them.
    pub async fn list_my_vps(
        &self,
        token: Option<&str>,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<VpsInstance>, ApiError> {
        let mut call = Call::get("/vps/my-vps").bearer(token);
        if let Some(limit) = limit {
            call = call.query("limit", limit);
        }
        let mut instances: Vec<VpsInstance> = self.client.execute(call, cancel).await?;
        if let Some(limit) = limit {
            instances.truncate(limit);
        }
        Ok(instances)
    }

    pub async fn get_info(
        &self,
        token: Option<&str>,
        vps_id: i64,
        cancel: &CancellationToken,
    ) -> Result<VpsInstance, ApiError> {
        self.client
            .execute(Call::get(format!("/vps/{vps_id}/info")).bearer(token), cancel)
            .await
    }

    pub async fn get_rrd(
        &self,
        token: Option<&str>,
        vps_id: i64,
        timeframe: Timeframe,
        cf: ConsolidationFn,
        cancel: &CancellationToken,
    ) -> Result<Vec<RrdPoint>, ApiError> {
        let call = Call::get(format!("/vps/{vps_id}/rrd"))
            .bearer(token)
            .query("timeframe", timeframe.as_str())
            .query("cf", cf.as_str());
        self.client.execute(call, cancel).await
    }

    pub async fn power(
        &self,
        token: Option<&str>,
        vps_id: i64,
        action: PowerAction,
        cancel: &CancellationToken,
    ) -> Result<ActionAck, ApiError> {
        let call = Call::post(format!("/vps/{vps_id}/power"))
            .bearer(token)
            .json(&PowerRequest { action });
        let ack = self.client.execute(call, cancel).await?;
        info!(vps_id, action = %action, "Power action accepted.");
        Ok(ack)
    }

    pub async fn list_snapshots(
        &self,
        token: Option<&str>,
        vps_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Snapshot>, ApiError> {
        self.client
            .execute(Call::get(format!("/vps/{vps_id}/snapshots")).bearer(token), cancel)
            .await
    }

    pub async fn create_snapshot(
        &self,
        token: Option<&str>,
        vps_id: i64,
        request: &CreateSnapshotRequest,
        cancel: &CancellationToken,
    ) -> Result<ActionAck, ApiError> {
        let call = Call::post(format!("/vps/{vps_id}/snapshots"))
            .bearer(token)
            .json(request);
        self.client.execute(call, cancel).await
    }

    pub async fn restore_snapshot(
        &self,
        token: Option<&str>,
        vps_id: i64,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<ActionAck, ApiError> {
        let call = Call::post(format!("/vps/{vps_id}/snapshots/restore"))
            .bearer(token)
            .json(&RestoreSnapshotRequest {
                name: name.to_string(),
            });
        self.client.execute(call, cancel).await
    }

    pub async fn delete_snapshot(
        &self,
        token: Option<&str>,
        vps_id: i64,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let path = format!("/vps/{vps_id}/snapshots/{}", urlencoding::encode(name));
        let _: IgnoredAny = self
            .client
            .execute(Call::delete(path).bearer(token), cancel)
            .await?;
        Ok(())
    }

    /// Provisions the VPS bought with a paid order.
    pub async fn setup(
        &self,
        token: Option<&str>,
        order_number: &str,
        cancel: &CancellationToken,
    ) -> Result<VpsInstance, ApiError> {
        let call = Call::post("/vps/setup").bearer(token).json(&SetupRequest {
            order_number: order_number.to_string(),
        });
        self.client.execute(call, cancel).await
    }
}
