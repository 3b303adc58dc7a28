//! # neo4j-resources: Declarative Neo4j Resources
//!
//! Exposes graph entities (nodes and relationships) as declaratively managed
//! resources. A caller states the desired labels, properties and
//! connectivity; the reconcilers bring the live store in line and track each
//! entity by a stable external `id` that is stored on the entity as the hidden
//! `uuid` property.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphSession` is the only contract with the backend
//! 2. **One statement per operation**: every lifecycle call issues exactly one query
//! 3. **Null is not empty**: `Attr` keeps absent, unknown and known values apart
//! 4. **Replace, don't diff**: updates overwrite labels/properties wholesale
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neo4j_resources::{MemorySession, NodeModel, NodeResource, Resource};
//!
//! # async fn example() -> neo4j_resources::Result<()> {
//! let session = Arc::new(MemorySession::new());
//! let nodes = NodeResource::new(session);
//!
//! let planned = NodeModel::new()
//!     .with_labels(["Person"])
//!     .with_properties([("name", "Ada"), ("age", "36")]);
//! let state = nodes.create(planned).await?;
//! let state = nodes.read(state).await?;
//! println!("{state:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Session Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | (default) | In-process graph for testing/embedding |
//! | Bolt | `bolt` | External Neo4j via the Bolt protocol |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod codec;
pub mod identity;
pub mod cypher;
pub mod session;
pub mod resource;
pub mod config;
pub mod connect;
pub mod provider;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Attr, Node, Relationship, Value, PropertyMap,
    NodeId, RelId,
};

// ============================================================================
// Re-exports: Sessions
// ============================================================================

pub use session::{GraphSession, MemorySession, Record, SharedSession};
#[cfg(feature = "bolt")]
pub use session::BoltSession;

// ============================================================================
// Re-exports: Resources
// ============================================================================

pub use resource::{
    ImportState, Resource, ResourceModel, Schema, PlannedChange, plan_change,
    NodeModel, NodeResource, RelationshipModel, RelationshipResource,
};

// ============================================================================
// Re-exports: Configuration & bootstrap
// ============================================================================

pub use config::{ConnectionSettings, ProviderConfig};
pub use connect::{connect, Connector, MemoryConnector, RetryPolicy};
#[cfg(feature = "bolt")]
pub use connect::BoltConnector;
pub use provider::Provider;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection failed after {attempts} attempt(s): {message}")]
    Connection { attempts: u32, message: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },
}

pub type Result<T> = std::result::Result<T, Error>;
