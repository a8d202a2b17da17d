use tokio_util::sync::CancellationToken;

use super::{ApiClient, ApiError, Call};
use crate::models::{CheckoutRequest, Order, OrderStatus, OrderStatusUpdate};

#[derive(Clone)]
pub struct OrderApi {
    client: ApiClient,
}

impl OrderApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn checkout(
        &self,
        token: Option<&str>,
        request: &CheckoutRequest,
        cancel: &CancellationToken,
    ) -> Result<Order, ApiError> {
        self.client
            .execute(Call::post("/orders").bearer(token).json(request), cancel)
            .await
    }

    pub async fn my_orders(
        &self,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, ApiError> {
        self.client
            .execute(Call::get("/orders/my-orders").bearer(token), cancel)
            .await
    }

    /// Every order, for the admin console.
    pub async fn list_all(
        &self,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>, ApiError> {
        self.client
            .execute(Call::get("/orders").bearer(token), cancel)
            .await
    }

    pub async fn update_status(
        &self,
        token: Option<&str>,
        order_number: &str,
        status: OrderStatus,
        cancel: &CancellationToken,
    ) -> Result<Order, ApiError> {
        let call = Call::put(format!(
            "/orders/{}/status",
            urlencoding::encode(order_number)
        ))
        .bearer(token)
        .json(&OrderStatusUpdate { status });
        self.client.execute(call, cancel).await
    }
}
