//! # Graph Session
//!
//! This is THE contract between the reconcilers and any graph backend: run
//! one statement, get its records back. Connection pooling, routing and
//! transactions belong to the implementation.
//!
//! ## Implementations
//!
//! | Session | Module | Description |
//! |---------|--------|-------------|
//! | `MemorySession` | `memory` | In-process graph for testing/embedding |
//! | `BoltSession` | `bolt` | External Neo4j via Bolt protocol |
//!
//! Cancellation follows the future: dropping an in-flight `run` abandons
//! the query.

pub mod memory;
#[cfg(feature = "bolt")]
pub mod bolt;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cypher::Statement;
use crate::model::*;
use crate::{Error, Result};

pub use memory::MemorySession;
#[cfg(feature = "bolt")]
pub use bolt::BoltSession;

// ============================================================================
// Records
// ============================================================================

/// A single row returned by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub values: HashMap<String, Value>,
}

impl Record {
    pub fn new<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self { values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }

    /// Get a typed value from the row.
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T> {
        let val = self.values.get(key)
            .ok_or_else(|| Error::NotFound(format!("Column '{key}'")))?;
        T::from_value(val)
    }
}

/// Convert from Value to concrete types.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

impl FromValue for Node {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Node(n) => Ok(*n.clone()),
            _ => Err(Error::TypeError {
                expected: "Node".into(),
                got: val.type_name().into(),
            }),
        }
    }
}

impl FromValue for Relationship {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Relationship(r) => Ok(*r.clone()),
            _ => Err(Error::TypeError {
                expected: "Relationship".into(),
                got: val.type_name().into(),
            }),
        }
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::String(s) => Ok(s.clone()),
            _ => Err(Error::TypeError {
                expected: "String".into(),
                got: val.type_name().into(),
            }),
        }
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_int().ok_or_else(|| Error::TypeError {
            expected: "Integer".into(),
            got: val.type_name().into(),
        })
    }
}

// ============================================================================
// GraphSession Trait
// ============================================================================

/// A backend session shared by every resource of one provider.
///
/// Implementations must be safe to call concurrently; each `run` is one
/// atomic statement.
#[async_trait]
pub trait GraphSession: Send + Sync + 'static {
    /// Execute a statement and collect its records.
    async fn run(&self, statement: &Statement) -> Result<Vec<Record>>;

    /// Check that the backend answers.
    ///
    /// Default: run a `Ping` round trip.
    async fn verify_connectivity(&self) -> Result<()> {
        self.run(&Statement::Ping).await.map(|_| ())
    }
}

/// Session handle injected into every resource.
pub type SharedSession = Arc<dyn GraphSession>;
