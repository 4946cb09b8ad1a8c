//! Remote Client - HTTP access to the quote server.
//!
//! The server speaks a posts API: a list of items with a `title` and a
//! `userId`. Items are mapped into records on the way in and re-encoded as
//! posts on the way out. Neither direction ever returns an error to the
//! caller; failures are logged and collapse to "nothing fetched" / `false`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::error::{QuoteError, Result};
use crate::models::Record;

/// Best-effort access to the remote source of truth
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch the server's records; empty on any transport or format error
    async fn fetch(&self) -> Vec<Record>;

    /// Offer one record to the server; `true` if it was accepted
    async fn create(&self, record: &Record) -> bool;
}

/// A post as served by the remote API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub user_id: u64,
}

/// Body sent when creating a post
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub user_id: u64,
}

impl Post {
    /// Map into a record, skipping posts without a usable title
    pub fn into_record(self) -> Option<Record> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Record::remote(title, format!("Server-{}", self.user_id)))
    }
}

impl NewPost {
    pub fn from_record(record: &Record, user_id: u64) -> Self {
        Self {
            title: record.text.clone(),
            body: format!("Category: {}", record.category),
            user_id,
        }
    }
}

/// `RemoteClient` over HTTP
pub struct HttpRemoteClient {
    client: Client,
    base_url: String,
    fetch_limit: usize,
    user_id: u64,
}

impl HttpRemoteClient {
    /// Create a new client
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fetch_limit: config.fetch_limit,
            user_id: config.user_id,
        })
    }

    fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }

    /// Fetch posts, surfacing errors
    pub async fn try_fetch(&self) -> Result<Vec<Record>> {
        let response = self
            .client
            .get(self.posts_url())
            .query(&[("_limit", self.fetch_limit)])
            .send()
            .await?
            .error_for_status()?;

        let posts: Vec<Post> = response.json().await?;
        let total = posts.len();
        let records: Vec<Record> = posts.into_iter().filter_map(Post::into_record).collect();
        debug!("Fetched {} posts ({} usable)", total, records.len());
        Ok(records)
    }

    /// Create a post, surfacing errors
    pub async fn try_create(&self, record: &Record) -> Result<()> {
        let body = NewPost::from_record(record, self.user_id);
        let response = self
            .client
            .post(self.posts_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::RemoteStatus {
                status: status.as_u16(),
            });
        }

        // The echoed post is not reflected back into the local record
        let echoed: serde_json::Value = response.json().await.unwrap_or_default();
        debug!("Server POST response: {}", echoed);
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn fetch(&self) -> Vec<Record> {
        match self.try_fetch().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to fetch from server: {}", e);
                Vec::new()
            }
        }
    }

    async fn create(&self, record: &Record) -> bool {
        match self.try_create(record).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to post to server: {}", e);
                false
            }
        }
    }
}
