//! # Property Graph Model
//!
//! Two families of types live here:
//!
//! - Backend DTOs (`Node`, `Relationship`, `Value`, `PropertyMap`) as they
//!   come back from a graph session.
//! - `Attr`, the declared-side attribute wrapper that keeps absent, unknown
//!   and known values apart.
//!
//! This module is pure data: no I/O, no async.

pub mod attr;
pub mod node;
pub mod relationship;
pub mod value;
pub mod property_map;

pub use attr::Attr;
pub use node::{Node, NodeId};
pub use relationship::{Relationship, RelId};
pub use value::Value;
pub use property_map::{property_map, PropertyMap};
