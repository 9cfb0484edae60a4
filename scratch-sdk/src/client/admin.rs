//! Admin API client.
//!
//! All requests carry the plaintext admin secret in the
//! `Scratch-Admin-Authorization` header.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{InitializePoolRequest, PoolEpochResponse, PoolStatusResponse};
use crate::signature::ADMIN_AUTH_HEADER;

/// Typed HTTP client for the **Admin API**.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    admin_secret: String,
}

impl AdminClient {
    /// * `base_url` – root URL of the Scratch Match server.
    /// * `admin_secret` – the plaintext admin secret.
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            admin_secret: admin_secret.into(),
        }
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/v1/admin/pool/initialize` – create a new pool of
    /// `count` codes (two cards each).
    pub async fn initialize_pool(&self, count: u32) -> Result<PoolEpochResponse, ClientError> {
        let url = self.base_url.join("/api/v1/admin/pool/initialize")?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&InitializePoolRequest { count })
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/pool/deactivate` – retire the active pool.
    pub async fn deactivate_pool(&self) -> Result<Option<PoolEpochResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/admin/pool/deactivate")?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/pool` – active pool and its claim counters.
    pub async fn pool_status(&self) -> Result<PoolStatusResponse, ClientError> {
        let url = self.base_url.join("/api/v1/admin/pool")?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }
}
