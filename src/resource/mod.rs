//! # Resources
//!
//! Capability traits the hosting framework dispatches on, plus the two
//! reconcilers. A resource implements [`Resource`] for plan/create/read/
//! update/delete and [`ImportState`] when it can be adopted from a bare id.
//!
//! Models are built fresh for every call from the framework's plan or prior
//! state; nothing is cached between calls. Each operation issues exactly one
//! statement through the shared session.

pub mod schema;
pub mod node;
pub mod relationship;

use async_trait::async_trait;

use crate::Result;

pub use schema::{plan_change, Attribute, AttributeType, PlannedChange, Schema};
pub use node::{NodeModel, NodeResource};
pub use relationship::{RelationshipModel, RelationshipResource};

/// Name prefix of every resource type.
pub const PROVIDER_NAME: &str = "neo4j";

/// Declared state of one resource instance.
pub trait ResourceModel: Clone + Send + Sync + 'static {
    /// Names of the attributes whose declared values differ from `other`.
    fn changed_attributes(&self, other: &Self) -> Vec<&'static str>;
}

/// Lifecycle operations of a managed resource.
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: ResourceModel;

    /// Fully qualified type name, e.g. `neo4j_node`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Classify the change between two declared states.
    fn plan(&self, prior: Option<&Self::Model>, desired: Option<&Self::Model>) -> PlannedChange {
        plan_change(&self.schema(), prior, desired)
    }

    /// Create from a plan; returns the new state with `id` assigned.
    async fn create(&self, plan: Self::Model) -> Result<Self::Model>;

    /// Refresh prior state from the backend. Fails with `NotFound` if gone.
    async fn read(&self, state: Self::Model) -> Result<Self::Model>;

    /// Apply a plan to an existing resource identified by its `id`.
    async fn update(&self, plan: Self::Model) -> Result<Self::Model>;

    /// Remove the resource; returns the emptied state.
    async fn delete(&self, state: Self::Model) -> Result<Self::Model>;
}

/// Adoption of an existing backend entity by its `id`.
#[async_trait]
pub trait ImportState: Resource {
    async fn import_state(&self, id: &str) -> Result<Self::Model>;
}
