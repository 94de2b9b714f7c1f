//! HTTP gateway for the notification REST endpoints.
//!
//! The pull half of the reconciliation contract: the one-shot bulk fetch is
//! the authoritative baseline, and the command endpoints are the mirror path
//! used whenever the live channel is down.

use std::time::Duration;

use async_trait::async_trait;
use livefeed::Notification;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Server-side notification operations.
///
/// Seam for tests; the production implementation is [`HttpGateway`].
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Fetch the full notification list for the current session.
    async fn fetch_all(&self) -> Result<Vec<Notification>>;

    /// Mark one notification as read. Idempotent.
    async fn mark_read(&self, id: &str) -> Result<()>;

    /// Mark every notification as read. Idempotent.
    async fn mark_all_read(&self) -> Result<()>;

    /// Delete one notification.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Bulk-fetch responses arrive either as a bare array or wrapped in a
/// `data` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListPayload {
    Plain(Vec<Notification>),
    Envelope { data: Vec<Notification> },
}

impl ListPayload {
    fn into_items(self) -> Vec<Notification> {
        match self {
            Self::Plain(items) => items,
            Self::Envelope { data } => data,
        }
    }
}

/// reqwest-backed gateway with bearer auth and a uniform request timeout.
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::config("Token is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn expect_success(response: &reqwest::Response, endpoint: &str) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            })
        }
    }
}

#[async_trait]
impl NotificationGateway for HttpGateway {
    async fn fetch_all(&self) -> Result<Vec<Notification>> {
        let endpoint = self.url("/notifications");
        let response = self.client.get(&endpoint).send().await?;
        Self::expect_success(&response, &endpoint)?;

        let payload: ListPayload = response.json().await?;
        Ok(payload.into_items())
    }

    async fn mark_read(&self, id: &str) -> Result<()> {
        let endpoint = self.url(&format!("/notifications/{id}/read"));
        let response = self.client.post(&endpoint).send().await?;
        Self::expect_success(&response, &endpoint)
    }

    async fn mark_all_read(&self) -> Result<()> {
        let endpoint = self.url("/notifications/read-all");
        let response = self.client.post(&endpoint).send().await?;
        Self::expect_success(&response, &endpoint)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let endpoint = self.url(&format!("/notifications/{id}"));
        let response = self.client.delete(&endpoint).send().await?;
        Self::expect_success(&response, &endpoint)
    }
}
