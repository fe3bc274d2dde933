//! Instance identity resolution
//!
//! This module handles:
//! - Looking up instance ID and region from the instance metadata service
//! - Serving fixed values when both are known up front

mod fixed;
mod imds;

pub use fixed::StaticResolver;
pub use imds::{ImdsConfig, ImdsResolver};

use async_trait::async_trait;
use aws_config::imds::client::error::ImdsError;
use thiserror::Error;

/// Errors from identity lookups
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("instance metadata lookups are disabled")]
    Disabled,

    #[error("invalid metadata endpoint {endpoint}: {reason}")]
    Endpoint { endpoint: String, reason: String },

    #[error("metadata request for {path} failed: {source}")]
    Imds {
        path: String,
        #[source]
        source: ImdsError,
    },

    #[error("metadata response for {path} was empty")]
    EmptyResponse { path: String },

    #[error("no {0} configured")]
    NotConfigured(&'static str),
}

/// Supplies the identity of the instance we are running on
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Instance identifier, e.g. `i-0123456789abcdef0`
    async fn instance_id(&self) -> Result<String, IdentityError>;

    /// Region the instance runs in, e.g. `us-east-1`
    async fn region(&self) -> Result<String, IdentityError>;
}
