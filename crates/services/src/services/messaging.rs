//! LINE Messaging API push client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const PUSH_API_URL: &str = "https://api.line.me/v2/bot/message/push";

#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    #[error("missing channel access token")]
    MissingToken,
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid channel access token")]
    InvalidToken,
}

/// Outbound message-push seam. Production sends over HTTP; tests record.
#[async_trait]
pub trait MessagePush: Send + Sync {
    async fn push(&self, to: &str, messages: Vec<Value>) -> Result<(), MessagingError>;
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: &'a [Value],
}

/// Push client for the LINE Messaging API.
#[derive(Debug, Clone)]
pub struct LineClient {
    http: Client,
    token: Option<String>,
    endpoint: String,
}

impl LineClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(token: Option<String>) -> Result<Self, MessagingError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("beehive-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MessagingError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            token,
            endpoint: PUSH_API_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_endpoint(token: Option<String>, endpoint: String) -> Self {
        let mut client = Self::new(token).unwrap();
        client.endpoint = endpoint;
        client
    }
}

#[async_trait]
impl MessagePush for LineClient {
    async fn push(&self, to: &str, messages: Vec<Value>) -> Result<(), MessagingError> {
        // Checked before any network I/O: an untokened deployment degrades to
        // local failures instead of hitting the API.
        let token = self.token.as_deref().ok_or(MessagingError::MissingToken)?;

        let request = PushRequest {
            to,
            messages: &messages,
        };

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(MessagingError::InvalidToken),
            StatusCode::TOO_MANY_REQUESTS => Err(MessagingError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(MessagingError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> MessagingError {
    if e.is_timeout() {
        MessagingError::Timeout
    } else {
        MessagingError::Transport(e.to_string())
    }
}
