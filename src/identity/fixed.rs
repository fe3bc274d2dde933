//! Identity resolver returning fixed values

use super::{IdentityError, IdentityResolver};
use async_trait::async_trait;

/// Resolver that never leaves the process
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    instance_id: Option<String>,
    region: Option<String>,
}

impl StaticResolver {
    /// Create a resolver with the given values. `None` answers with an error.
    pub fn new(instance_id: Option<String>, region: Option<String>) -> Self {
        Self {
            instance_id,
            region,
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticResolver {
    async fn instance_id(&self) -> Result<String, IdentityError> {
        self.instance_id
            .clone()
            .ok_or(IdentityError::NotConfigured("instance ID"))
    }

    async fn region(&self) -> Result<String, IdentityError> {
        self.region
            .clone()
            .ok_or(IdentityError::NotConfigured("region"))
    }
}
