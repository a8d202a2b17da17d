use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;

use super::{ApiClient, ApiError, Call};
use crate::models::{Plan, PlanInput};

#[derive(Clone)]
pub struct PlanApi {
    client: ApiClient,
}

impl PlanApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Full catalogue; filtering happens in [`crate::catalog`].
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Plan>, ApiError> {
        self.client.execute(Call::get("/plans"), cancel).await
    }

    pub async fn get(&self, plan_id: i64, cancel: &CancellationToken) -> Result<Plan, ApiError> {
        self.client
            .execute(Call::get(format!("/plans/{plan_id}")), cancel)
            .await
    }

    pub async fn create(
        &self,
        token: Option<&str>,
        input: &PlanInput,
        cancel: &CancellationToken,
    ) -> Result<Plan, ApiError> {
        self.client
            .execute(Call::post("/plans").bearer(token).json(input), cancel)
            .await
    }

    pub async fn update(
        &self,
        token: Option<&str>,
        plan_id: i64,
        input: &PlanInput,
        cancel: &CancellationToken,
    ) -> Result<Plan, ApiError> {
        let call = Call::put(format!("/plans/{plan_id}")).bearer(token).json(input);
        self.client.execute(call, cancel).await
    }

    pub async fn delete(
        &self,
        token: Option<&str>,
        plan_id: i64,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .execute(Call::delete(format!("/plans/{plan_id}")).bearer(token), cancel)
            .await?;
        Ok(())
    }
}
