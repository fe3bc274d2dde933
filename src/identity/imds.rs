//! Instance metadata service client
//!
//! Wraps the SDK's IMDS client. Token handling, retries and endpoint
//! selection (`AWS_EC2_METADATA_SERVICE_ENDPOINT`,
//! `AWS_EC2_METADATA_SERVICE_ENDPOINT_MODE`, profile settings) all follow
//! the SDK.

use super::{IdentityError, IdentityResolver};
use async_trait::async_trait;
use aws_config::imds;
use std::time::Duration;
use tcsignal_shared::defaults;
use tracing::debug;

const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";
const REGION_PATH: &str = "/latest/meta-data/placement/region";

/// Environment variable disabling metadata lookups when `true`
pub const DISABLED_ENV: &str = "AWS_EC2_METADATA_DISABLED";

/// Configuration for the metadata client
#[derive(Debug, Clone)]
pub struct ImdsConfig {
    /// Explicit base URL; `None` lets the SDK resolve it
    pub endpoint: Option<String>,
    /// Session token lifetime
    pub token_ttl: Duration,
    /// Connect and read timeout for each HTTP request
    pub request_timeout: Duration,
    /// Attempts per lookup, first try included
    pub max_attempts: u32,
    /// Refuse all lookups
    pub disabled: bool,
}

impl Default for ImdsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token_ttl: Duration::from_secs(u64::from(defaults::METADATA_TOKEN_TTL_SECS)),
            request_timeout: defaults::METADATA_REQUEST_TIMEOUT,
            max_attempts: defaults::METADATA_MAX_ATTEMPTS,
            disabled: false,
        }
    }
}

impl ImdsConfig {
    /// Default configuration honouring `AWS_EC2_METADATA_DISABLED`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(disabled) = std::env::var(DISABLED_ENV) {
            config.disabled = disabled.eq_ignore_ascii_case("true");
        }
        config
    }
}

/// Resolves identity from the instance metadata service
pub struct ImdsResolver {
    client: imds::Client,
    config: ImdsConfig,
}

impl std::fmt::Debug for ImdsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImdsResolver")
            .field("endpoint", &self.config.endpoint)
            .field("disabled", &self.config.disabled)
            .finish()
    }
}

impl ImdsResolver {
    /// Create a new metadata resolver
    pub fn new(config: ImdsConfig) -> Result<Self, IdentityError> {
        let mut builder = imds::Client::builder()
            .max_attempts(config.max_attempts)
            .token_ttl(config.token_ttl)
            .connect_timeout(config.request_timeout)
            .read_timeout(config.request_timeout);

        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .endpoint(endpoint)
                .map_err(|e| IdentityError::Endpoint {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(Self {
            client: builder.build(),
            config,
        })
    }

    /// Read a metadata value, trimmed
    async fn get_metadata(&self, path: &str) -> Result<String, IdentityError> {
        if self.config.disabled {
            return Err(IdentityError::Disabled);
        }

        let body = self
            .client
            .get(path)
            .await
            .map_err(|source| IdentityError::Imds {
                path: path.into(),
                source,
            })?;
        let body = String::from(body);

        let value = body.trim();
        if value.is_empty() {
            return Err(IdentityError::EmptyResponse { path: path.into() });
        }

        debug!("Metadata {} = {}", path, value);
        Ok(value.to_string())
    }
}

#[async_trait]
impl IdentityResolver for ImdsResolver {
    async fn instance_id(&self) -> Result<String, IdentityError> {
        self.get_metadata(INSTANCE_ID_PATH).await
    }

    async fn region(&self) -> Result<String, IdentityError> {
        self.get_metadata(REGION_PATH).await
    }
}
