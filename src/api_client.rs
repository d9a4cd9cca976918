//! HTTP client for the AgriFund REST API.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Farmland, FarmlandPayload, FarmerInvestment, InvestmentPayload, UploadedImage};
use crate::session::Session;
use crate::uploads::StagedImage;

/// Typed client for the AgriFund backend. Cheap to share behind an `Arc`;
/// the underlying connection pool is reused across calls.
pub struct ApiClient {
    base_url: String,
    request_timeout: Duration,
    session: Arc<Session>,
    http: Client,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<Session>) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            session,
            http: Client::new(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Farmlands of the signed-in farmer, for the farmland selector.
    pub async fn list_farmlands(&self) -> Result<Vec<Farmland>, ApiError> {
        let response = self
            .authorized(self.http.get(self.url("/farmlands")))
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn create_farmland(&self, payload: &FarmlandPayload) -> Result<Farmland, ApiError> {
        let response = self
            .authorized(self.http.post(self.url("/farmlands")))
            .json(payload)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let farmland: Farmland = Self::decode(response).await?;
        info!(id = %farmland.id, "farmland registered");
        Ok(farmland)
    }

    pub async fn get_investment(&self, id: Uuid) -> Result<FarmerInvestment, ApiError> {
        let response = self
            .authorized(
                self.http
                    .get(self.url(&format!("/farmer-investments/{id}"))),
            )
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn create_investment(
        &self,
        payload: &InvestmentPayload,
    ) -> Result<FarmerInvestment, ApiError> {
        let response = self
            .authorized(self.http.post(self.url("/farmer-investments")))
            .json(payload)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let investment: FarmerInvestment = Self::decode(response).await?;
        info!(id = %investment.id, "funding request created");
        Ok(investment)
    }

    pub async fn update_investment(
        &self,
        id: Uuid,
        payload: &InvestmentPayload,
    ) -> Result<FarmerInvestment, ApiError> {
        let response = self
            .authorized(
                self.http
                    .patch(self.url(&format!("/farmer-investments/{id}"))),
            )
            .json(payload)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let investment: FarmerInvestment = Self::decode(response).await?;
        info!(id = %investment.id, "funding request updated");
        Ok(investment)
    }

    /// Uploads one staged image as a multipart form.
    pub async fn upload_image(&self, image: &StagedImage) -> Result<UploadedImage, ApiError> {
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorized(self.http.post(self.url("/upload/image")))
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Uploads every staged image concurrently. The returned URLs keep the
    /// input order; any single failure fails the whole batch.
    pub async fn upload_images(&self, images: &[StagedImage]) -> Result<Vec<String>, ApiError> {
        info!(count = images.len(), "uploading staged images");
        let uploads = images.iter().map(|image| self.upload_image(image));
        let uploaded = try_join_all(uploads).await?;
        Ok(uploaded.into_iter().map(|image| image.url).collect())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "AgriFund API rejected the request");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_server_message(&body),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Pulls the human-readable message out of an error body. The backend sends
/// either `{ "message": "..." }` or `{ "message": ["...", "..."] }`.
fn extract_server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.pointer("/message") {
        Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            if joined.is_empty() {
                None
            } else {
                Some(joined)
            }
        }
        _ => None,
    }
}
