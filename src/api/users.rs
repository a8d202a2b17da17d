use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;

use super::{ActionAck, ApiClient, ApiError, Call};
use crate::models::{PasswordChange, ProfileUpdate, User, UserUpdate};

#[derive(Clone)]
pub struct UserApi {
    client: ApiClient,
}

impl UserApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn me(&self, token: Option<&str>, cancel: &CancellationToken) -> Result<User, ApiError> {
        self.client
            .execute(Call::get("/auth/me").bearer(token), cancel)
            .await
    }

    pub async fn update_me(
        &self,
        token: Option<&str>,
        update: &ProfileUpdate,
        cancel: &CancellationToken,
    ) -> Result<User, ApiError> {
        self.client
            .execute(Call::put("/users/me").bearer(token).json(update), cancel)
            .await
    }

    pub async fn change_password(
        &self,
        token: Option<&str>,
        change: &PasswordChange,
        cancel: &CancellationToken,
    ) -> Result<ActionAck, ApiError> {
        self.client
            .execute(
                Call::put("/users/me/password").bearer(token).json(change),
                cancel,
            )
            .await
    }

    pub async fn list(
        &self,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<User>, ApiError> {
        self.client
            .execute(Call::get("/users").bearer(token), cancel)
            .await
    }

    pub async fn update(
        &self,
        token: Option<&str>,
        user_id: i64,
        update: &UserUpdate,
        cancel: &CancellationToken,
    ) -> Result<User, ApiError> {
        let call = Call::put(format!("/users/{user_id}")).bearer(token).json(update);
        self.client.execute(call, cancel).await
    }

    pub async fn delete(
        &self,
        token: Option<&str>,
        user_id: i64,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .execute(Call::delete(format!("/users/{user_id}")).bearer(token), cancel)
            .await?;
        Ok(())
    }
}
