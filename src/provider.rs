//! The provider: configuration, bootstrap and the resource catalogue.
//!
//! A configured provider owns one connected session and hands a clone of it
//! to every resource it builds.

use tracing::info;

use crate::config::ProviderConfig;
use crate::connect::{connect, Connector, RetryPolicy};
use crate::resource::{NodeResource, RelationshipResource, PROVIDER_NAME};
use crate::session::SharedSession;
use crate::Result;

/// A configured provider instance.
#[derive(Clone)]
pub struct Provider {
    session: SharedSession,
    version: String,
}

impl Provider {
    /// Resolve `config`, connect through `connector` and verify connectivity.
    pub async fn configure(
        config: ProviderConfig,
        connector: &dyn Connector,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let settings = config.resolve()?;
        Self::configure_with(settings, connector, policy).await
    }

    /// Like [`Provider::configure`] with already resolved settings.
    pub async fn configure_with(
        settings: crate::config::ConnectionSettings,
        connector: &dyn Connector,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let session = connect(&settings, connector, policy).await?;
        info!(uri = %settings.uri, database = %settings.database, "provider configured");
        Ok(Self::with_session(session))
    }

    /// Wrap an already connected session.
    pub fn with_session(session: SharedSession) -> Self {
        Self { session, version: env!("CARGO_PKG_VERSION").to_owned() }
    }

    /// Override the reported provider version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resource type names this provider serves.
    pub fn resource_types(&self) -> [&'static str; 2] {
        [NodeResource::TYPE_NAME, RelationshipResource::TYPE_NAME]
    }

    pub fn node_resource(&self) -> NodeResource {
        NodeResource::new(self.session.clone())
    }

    pub fn relationship_resource(&self) -> RelationshipResource {
        RelationshipResource::new(self.session.clone())
    }
}
