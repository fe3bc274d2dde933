//! Publisher trait abstraction for pluggable queue backends

use async_trait::async_trait;
use std::time::Duration;
use tcsignal_shared::SignalMessage;
use thiserror::Error;

/// Everything a publisher needs to send one signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Destination queue
    pub queue_url: String,
    /// The signal itself
    pub signal: SignalMessage,
    /// Region hint; empty means use the ambient default
    pub region: String,
    /// Budget for the whole call, internal retries included
    pub publish_timeout: Duration,
    /// Transient-error retries; the transport makes up to `retries + 1` attempts
    pub retries: u32,
}

/// Errors from a publish call
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid message attribute: {0}")]
    Attribute(String),

    #[error("send failed: {0}")]
    Send(String),
}

/// Sends a single signal to a queue
#[async_trait]
pub trait SignalPublisher: Send + Sync {
    /// Publish the signal, honoring the request's timeout and retry budget
    async fn publish(&self, request: &PublishRequest) -> Result<(), PublishError>;

    /// Human-readable name for this publisher
    fn name(&self) -> &'static str;
}
