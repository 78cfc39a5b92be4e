use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::messages::{OutboundMessage, MAX_REPLY_MESSAGES};

const REPLY_PATH: &str = "/v2/bot/message/reply";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("reply request failed: {0}")]
    Request(String),
    #[error("reply endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("reply client could not be built: {0}")]
    Client(String),
}

#[async_trait]
pub trait ReplyTransport: Send + Sync {
    async fn reply(
        &self,
        reply_token: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), TransportError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [OutboundMessage],
}

/// Posts replies to the Messaging API using the channel access token.
pub struct HttpReplyTransport {
    client: Client,
    endpoint: String,
    access_token: SecretString,
}

impl HttpReplyTransport {
    pub fn new(
        api_base_url: &str,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| TransportError::Client(error.to_string()))?;
        let endpoint = format!("{}{REPLY_PATH}", api_base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint, access_token })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyTransport for HttpReplyTransport {
    async fn reply(
        &self,
        reply_token: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), TransportError> {
        if messages.is_empty() {
            return Ok(());
        }
        if messages.len() > MAX_REPLY_MESSAGES {
            warn!(
                event_name = "ingress.line.reply_truncated",
                count = messages.len(),
                "reply exceeds platform message limit; extra messages dropped"
            );
        }
        let messages = &messages[..messages.len().min(MAX_REPLY_MESSAGES)];

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.access_token.expose_secret())
            .json(&ReplyRequest { reply_token, messages })
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        debug!(event_name = "ingress.line.reply_sent", count = messages.len(), "reply delivered");
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopReplyTransport;

#[async_trait]
impl ReplyTransport for NoopReplyTransport {
    async fn reply(
        &self,
        _reply_token: &str,
        _messages: &[OutboundMessage],
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SentReply {
    pub reply_token: String,
    pub messages: Vec<OutboundMessage>,
}

/// Keeps every reply in memory; used by tests and the local simulator.
#[derive(Clone, Default)]
pub struct InMemoryReplyTransport {
    sent: Arc<Mutex<Vec<SentReply>>>,
}

impl InMemoryReplyTransport {
    pub fn sent(&self) -> Vec<SentReply> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ReplyTransport for InMemoryReplyTransport {
    async fn reply(
        &self,
        reply_token: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), TransportError> {
        let reply = SentReply { reply_token: reply_token.to_owned(), messages: messages.to_vec() };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(reply),
            Err(poisoned) => poisoned.into_inner().push(reply),
        }
        Ok(())
    }
}
