//! Profile Store: read-only public profiles used in match payloads.

use async_trait::async_trait;
use dashmap::DashMap;
use scratch_sdk::objects::{Profile, UserId};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const PROFILE_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("profile service responded with status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("base URL cannot carry a path: {0}")]
    InvalidBaseUrl(Url),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the user has no profile.
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError>;
}

/// Fetches profiles from `GET {base_url}/users/{id}/profile`.
pub struct HttpProfileStore {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpProfileStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http_client: reqwest::Client::builder()
                .timeout(PROFILE_REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    fn profile_url(&self, user_id: &UserId) -> Result<Url, ProfileError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProfileError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["users", user_id.as_str(), "profile"]);
        Ok(url)
    }
}

#[async_trait]
impl ProfileStore for HttpProfileStore {
    #[tracing::instrument(skip_all, err, fields(user_id = %user_id))]
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError> {
        let url = self.profile_url(user_id)?;
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProfileError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        Ok(Some(response.json::<Profile>().await?))
    }
}

/// Profiles held in memory, from inline config or set up by tests.
#[derive(Default)]
pub struct StaticProfileStore {
    profiles: DashMap<UserId, Profile>,
}

impl StaticProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }
}

impl FromIterator<Profile> for StaticProfileStore {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let store = Self::new();
        for profile in iter {
            store.insert(profile);
        }
        store
    }
}

#[async_trait]
impl ProfileStore for StaticProfileStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, ProfileError> {
        Ok(self.profiles.get(user_id).map(|profile| profile.clone()))
    }
}
