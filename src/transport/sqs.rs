//! SQS transport implementation
//!
//! Endpoint, credentials and region come from the standard AWS
//! configuration chain (`AWS_REGION`, `AWS_ENDPOINT_URL_SQS`, profiles, ...).
//! The region hint from the request wins when it is non-empty.

use crate::transport::traits::{PublishError, PublishRequest, SignalPublisher};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::{Credentials, Region};
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::MessageAttributeValue;
use std::collections::HashMap;
use tcsignal_shared::{attributes, codec, SignalMessage, MESSAGE_BODY};
use tracing::{debug, info, warn};

/// Publishes signals with `SendMessage`
#[derive(Debug, Clone, Default)]
pub struct SqsPublisher {
    /// Fixed endpoint; `None` defers to the SDK's endpoint resolution
    endpoint_url: Option<String>,
    /// Fixed credentials; `None` uses the default provider chain
    credentials: Option<Credentials>,
}

impl SqsPublisher {
    /// Create a new SQS publisher
    pub fn new() -> Self {
        Self::default()
    }

    async fn load_sdk_config(&self, retries: u32, region: &str) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::standard().with_max_attempts(max_attempts(retries)));

        if !region.is_empty() {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        if let Some(credentials) = &self.credentials {
            loader = loader.credentials_provider(credentials.clone());
        }

        loader.load().await
    }

    async fn send(&self, request: &PublishRequest) -> Result<Option<String>, PublishError> {
        let sdk_config = self.load_sdk_config(request.retries, &request.region).await;
        let client = aws_sdk_sqs::Client::new(&sdk_config);

        let output = client
            .send_message()
            .queue_url(&request.queue_url)
            .message_body(MESSAGE_BODY)
            .set_message_attributes(Some(message_attributes(&request.signal)?))
            .send()
            .await
            .map_err(|e| PublishError::Send(DisplayErrorContext(&e).to_string()))?;

        Ok(output.message_id().map(str::to_string))
    }
}

#[async_trait]
impl SignalPublisher for SqsPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<(), PublishError> {
        debug!(
            "Sending to {} (max attempts {}, timeout {:?})",
            request.queue_url,
            max_attempts(request.retries),
            request.publish_timeout
        );

        // Config loading can itself hit the network, so it shares the budget
        match tokio::time::timeout(request.publish_timeout, self.send(request)).await {
            Ok(Ok(message_id)) => {
                info!(
                    "SQS message sent, message_id={}",
                    message_id.as_deref().unwrap_or("<none>")
                );
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(
                    "Failed to send SQS message after {} retries: {}",
                    request.retries, e
                );
                Err(e)
            }
            Err(_) => Err(PublishError::Timeout(request.publish_timeout)),
        }
    }

    fn name(&self) -> &'static str {
        "SQS"
    }
}

/// Total attempts the SDK may make; the first attempt is not a retry
pub fn max_attempts(retries: u32) -> u32 {
    retries.saturating_add(1)
}

/// Build the SQS attribute map for a signal
fn message_attributes(
    signal: &SignalMessage,
) -> Result<HashMap<String, MessageAttributeValue>, PublishError> {
    codec::encode_attributes(signal)
        .into_iter()
        .map(|(name, value)| -> Result<(String, MessageAttributeValue), PublishError> {
            let attr = MessageAttributeValue::builder()
                .data_type(attributes::DATA_TYPE)
                .string_value(value)
                .build()
                .map_err(|e| PublishError::Attribute(format!("{}: {}", name, e)))?;
            Ok((name, attr))
        })
        .collect()
}
