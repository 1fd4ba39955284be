//! The text transformation service: `POST {"text": ...}`, reply
//! `{"message": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use polish_ai_config::Config;
use polish_ai_engine::PolishError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service responded {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("malformed response ({0})")]
    Malformed(String),

    #[error("{0}")]
    Network(String),
}

impl From<ServiceError> for PolishError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Status { status_text, .. } => PolishError::Service {
                status: status_text,
            },
            ServiceError::Malformed(detail) => PolishError::Service {
                status: format!("malformed response ({detail})"),
            },
            ServiceError::Network(detail) => PolishError::Network(detail),
        }
    }
}

/// Anything that can turn selected text into its polished form.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, text: &str) -> Result<String, ServiceError>;
}

#[derive(Serialize)]
struct TransformRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TransformResponse {
    #[serde(default)]
    message: Option<String>,
}

/// `Transformer` backed by the HTTP service.
#[derive(Debug, Clone)]
pub struct HttpTransformer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransformer {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transformer for HttpTransformer {
    async fn transform(&self, text: &str) -> Result<String, ServiceError> {
        log::info!("Sending {} bytes to {}", text.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&TransformRequest { text })
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Failed to send text: {status} {body}");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .map_or_else(|| status.as_str().to_string(), str::to_string),
            });
        }

        let body: TransformResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        // An empty or missing message means "keep the text as it was"
        match body.message {
            Some(message) if !message.is_empty() => {
                log::debug!("Received {} bytes of processed text", message.len());
                Ok(message)
            }
            _ => {
                log::debug!("Service returned no message, keeping original text");
                Ok(text.to_string())
            }
        }
    }
}
