use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;

use super::{ApiClient, ApiError, Call};
use crate::models::{Article, ArticleInput};

#[derive(Clone)]
pub struct ArticleApi {
    client: ApiClient,
}

impl ArticleApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Article>, ApiError> {
        self.client.execute(Call::get("/articles"), cancel).await
    }

    pub async fn get_by_slug(
        &self,
        slug: &str,
        cancel: &CancellationToken,
    ) -> Result<Article, ApiError> {
        self.client
            .execute(
                Call::get(format!("/articles/{}", urlencoding::encode(slug))),
                cancel,
            )
            .await
    }

    pub async fn create(
        &self,
        token: Option<&str>,
        input: &ArticleInput,
        cancel: &CancellationToken,
    ) -> Result<Article, ApiError> {
        self.client
            .execute(Call::post("/articles").bearer(token).json(input), cancel)
            .await
    }

    pub async fn update(
        &self,
        token: Option<&str>,
        article_id: i64,
        input: &ArticleInput,
        cancel: &CancellationToken,
    ) -> Result<Article, ApiError> {
        let call = Call::put(format!("/articles/{article_id}"))
            .bearer(token)
            .json(input);
        self.client.execute(call, cancel).await
    }

    pub async fn delete(
        &self,
        token: Option<&str>,
        article_id: i64,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .execute(
                Call::delete(format!("/articles/{article_id}")).bearer(token),
                cancel,
            )
            .await?;
        Ok(())
    }
}
