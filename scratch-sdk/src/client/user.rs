//! User API client.
//!
//! Every request carries a freshly signed identity assertion in the
//! `Scratch-Identity` / `Scratch-Signature` headers. This client is meant
//! for trusted backends and test harnesses that hold the identity
//! provider's secret; browsers receive pre-signed headers instead.

use reqwest::{Client, RequestBuilder};
use url::Url;
use uuid::Uuid;

use super::{ClientError, RealtimeStream, parse_response};
use crate::objects::{
    AckResponse, AvailableCard, ClaimCardRequest, ClaimCardResponse, CreateNotificationRequest,
    Identity, Notification, UnreadCountResponse,
};
use crate::signature::{IDENTITY_HEADER, SIGNATURE_HEADER, sign_identity};

/// Typed HTTP client acting on behalf of one user.
#[derive(Debug, Clone)]
pub struct UserClient {
    http: Client,
    base_url: Url,
    identity: Identity,
    secret: Vec<u8>,
}

impl UserClient {
    /// * `base_url` – root URL of the Scratch Match server.
    /// * `identity` – the user this client acts for.
    /// * `identity_secret` – the identity provider's HMAC secret.
    pub fn new(base_url: Url, identity: Identity, identity_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            identity,
            secret: identity_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    fn signed(&self, builder: RequestBuilder) -> RequestBuilder {
        let signed = sign_identity(&self.identity, &self.secret);
        builder
            .header(IDENTITY_HEADER, signed.identity)
            .header(SIGNATURE_HEADER, signed.signature)
    }

    /// `GET /api/v1/cards/available`
    pub async fn available_cards(&self) -> Result<Vec<AvailableCard>, ClientError> {
        let url = self.base_url.join("/api/v1/cards/available")?;
        let resp = self.signed(self.http.get(url)).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/cards/claim`
    pub async fn claim_card(&self, card_id: Uuid) -> Result<ClaimCardResponse, ClientError> {
        let url = self.base_url.join("/api/v1/cards/claim")?;
        let resp = self
            .signed(self.http.post(url))
            .json(&ClaimCardRequest { card_id })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/notifications`
    pub async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        let url = self.base_url.join("/api/v1/notifications")?;
        let resp = self.signed(self.http.get(url)).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/notifications`
    pub async fn create_notification(
        &self,
        request: &CreateNotificationRequest,
    ) -> Result<Notification, ClientError> {
        let url = self.base_url.join("/api/v1/notifications")?;
        let resp = self
            .signed(self.http.post(url))
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/notifications/unread-count`
    pub async fn unread_count(&self) -> Result<UnreadCountResponse, ClientError> {
        let url = self.base_url.join("/api/v1/notifications/unread-count")?;
        let resp = self.signed(self.http.get(url)).send().await?;
        parse_response(resp).await
    }

    /// `PUT /api/v1/notifications/mark-all-read`
    pub async fn mark_all_read(&self) -> Result<AckResponse, ClientError> {
        let url = self.base_url.join("/api/v1/notifications/mark-all-read")?;
        let resp = self.signed(self.http.put(url)).send().await?;
        parse_response(resp).await
    }

    /// `PUT /api/v1/notifications/{id}/read`
    pub async fn mark_read(&self, notification_id: Uuid) -> Result<Notification, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/notifications/{notification_id}/read"))?;
        let resp = self.signed(self.http.put(url)).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/ws` – open the realtime stream for this user.
    pub async fn realtime(&self) -> Result<RealtimeStream, ClientError> {
        RealtimeStream::connect(&self.base_url, &self.identity, &self.secret).await
    }
}
