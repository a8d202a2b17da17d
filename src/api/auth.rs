use tokio_util::sync::CancellationToken;

use super::{ActionAck, ApiClient, ApiError, Call};
use crate::models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    ResetTokenRecord, User,
};

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(
        &self,
        request: &LoginRequest,
        cancel: &CancellationToken,
    ) -> Result<LoginResponse, ApiError> {
        self.client
            .execute(Call::post("/auth/login").json(request), cancel)
            .await
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
        cancel: &CancellationToken,
    ) -> Result<User, ApiError> {
        self.client
            .execute(Call::post("/auth/register").json(request), cancel)
            .await
    }

    pub async fn forgot_password(
        &self,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<ActionAck, ApiError> {
        let call = Call::post("/auth/forgot-password").json(&ForgotPasswordRequest {
            email: email.to_string(),
        });
        self.client.execute(call, cancel).await
    }

    /// Looks up a reset token. A 404 means the backend never issued it.
    pub async fn verify_reset_token(
        &self,
        token: &str,
        email: &str,
        cancel: &CancellationToken,
    ) -> Result<ResetTokenRecord, ApiError> {
        let call = Call::get("/auth/reset-password/verify")
            .query("token", token)
            .query("email", email);
        self.client.execute(call, cancel).await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
        cancel: &CancellationToken,
    ) -> Result<ActionAck, ApiError> {
        self.client
            .execute(Call::post("/auth/reset-password").json(request), cancel)
            .await
    }
}
