//! Bundled `reqwest`-based [`SessionApi`] implementation
//!
//! Thin plumbing: request construction, JSON field mapping, and the
//! status-code classifier that maps transport outcomes onto the error
//! taxonomy. Enabled with the `http` feature.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::{ActivityPage, PageFetcher, PageRequest, SessionApi};
use crate::error::{AgentError, Result};
use crate::types::Session;

/// Longest response body excerpt carried in an API error
const ERROR_BODY_LIMIT: usize = 512;

/// Connection settings for the remote sessions API
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the API, without a trailing slash
    pub base_url: String,
    /// Bearer token presented on every request
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpConfig {
    /// Create a config with the default 30 second request timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// `reqwest`-backed session API client
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: Client,
    config: HttpConfig,
}

impl HttpSessionApi {
    /// Build a client from the given config
    ///
    /// # Errors
    /// Returns [`AgentError::InvalidConfig`] for an empty base URL and a
    /// network error if the underlying client cannot be constructed.
    pub fn new(config: HttpConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(AgentError::invalid_config("base_url must not be empty"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.api_key)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        let body = check(path, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        check(path, response).await?;
        Ok(())
    }
}

/// Map a response onto the error taxonomy, returning the body on success
async fn check(endpoint: &str, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    if status.is_success() {
        return response.text().await.map_err(transport_error);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AgentError::auth(format!("status {status} at {endpoint}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AgentError::rate_limited(format!("status {status} at {endpoint}"))
        }
        _ => {
            let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            AgentError::api(status.as_u16(), endpoint, message)
        }
    })
}

fn transport_error(err: reqwest::Error) -> AgentError {
    AgentError::network(err.to_string())
}

impl PageFetcher for HttpSessionApi {
    async fn fetch_page(&self, request: PageRequest) -> Result<ActivityPage> {
        let mut query: Vec<(&str, String)> = vec![("pageSize", request.page_size.to_string())];
        if let Some(token) = request.page_token {
            query.push(("pageToken", token));
        }
        if let Some(after) = request.after {
            query.push(("createTimeAfter", after));
        }
        self.get_json(&format!("{}/activities", request.session_id), &query)
            .await
    }
}

impl SessionApi for HttpSessionApi {
    async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.get_json(session_id, &[]).await
    }

    async fn approve_plan(&self, session_id: &str) -> Result<()> {
        self.post_json(&format!("{session_id}:approvePlan"), serde_json::json!({}))
            .await
    }

    async fn send_message(&self, session_id: &str, message: &str) -> Result<()> {
        self.post_json(
            &format!("{session_id}:sendMessage"),
            serde_json::json!({ "prompt": message }),
        )
        .await
    }
}
