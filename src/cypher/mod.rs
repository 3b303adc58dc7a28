//! # Cypher statements
//!
//! The reconcilers speak a small, fixed vocabulary of graph mutations and
//! lookups. Each [`Statement`] renders to one parameterized Cypher query, so
//! a wire backend only has to forward `text` and `params`. Structured
//! backends (the in-memory session) match on the variant instead.
//!
//! Every pattern is keyed by the hidden `uuid` property; backend-internal
//! identifiers never appear in a query.

use crate::model::{PropertyMap, Value};

/// A rendered query: Cypher text plus its parameter bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: &'static str,
    pub params: PropertyMap,
}

/// Every query the reconcilers issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Match-or-create a vertex by `uuid`, add labels, merge properties.
    /// Returns column `n`.
    MergeNode { uuid: String, labels: Vec<String>, properties: PropertyMap },
    /// Fetch a vertex by `uuid`. Returns column `n`.
    MatchNode { uuid: String },
    /// Drop every label and property of a vertex, then apply the given ones
    /// and re-assert `uuid`. Returns column `n`.
    ReplaceNode { uuid: String, labels: Vec<String>, properties: PropertyMap },
    /// Delete a vertex and its incident edges.
    DetachDeleteNode { uuid: String },
    /// Create a typed edge between two vertices located by `uuid`.
    /// Returns columns `r`, `start_node_id`, `end_node_id`; no row when
    /// either endpoint is missing.
    CreateRelationship {
        uuid: String,
        rel_type: String,
        start_uuid: String,
        end_uuid: String,
        properties: PropertyMap,
    },
    /// Fetch an edge by `uuid`, constrained to the given endpoints.
    MatchRelationship { uuid: String, start_uuid: String, end_uuid: String },
    /// Fetch an edge by `uuid` alone, recovering its endpoints.
    MatchRelationshipEndpoints { uuid: String },
    /// Replace the edge's whole property set and re-assert `uuid`.
    /// Returns the same columns as `CreateRelationship`.
    ReplaceRelationshipProperties { uuid: String, properties: PropertyMap },
    /// Delete an edge, leaving its endpoints in place.
    DeleteRelationship { uuid: String },
    /// Round trip used to verify connectivity.
    Ping,
}

const MERGE_NODE: &str = "\
MERGE (n {uuid: $uuid})
FOREACH (l IN $labels | SET n:$(l))
SET n += $properties
RETURN n";

const MATCH_NODE: &str = "\
MATCH (n {uuid: $uuid})
RETURN n
LIMIT 1";

const REPLACE_NODE: &str = "\
MATCH (n {uuid: $uuid})
FOREACH (l IN labels(n) | REMOVE n:$(l))
FOREACH (l IN $labels | SET n:$(l))
SET n = $properties, n.uuid = $uuid
RETURN n";

const DETACH_DELETE_NODE: &str = "\
MATCH (n {uuid: $uuid})
DETACH DELETE n";

const CREATE_RELATIONSHIP: &str = "\
MATCH (s {uuid: $start_uuid})
MATCH (e {uuid: $end_uuid})
CREATE (s)-[r:$($type)]->(e)
SET r = $properties, r.uuid = $uuid
RETURN r, s.uuid AS start_node_id, e.uuid AS end_node_id";

const MATCH_RELATIONSHIP: &str = "\
MATCH (s {uuid: $start_uuid})-[r {uuid: $uuid}]->(e {uuid: $end_uuid})
RETURN r, s.uuid AS start_node_id, e.uuid AS end_node_id
LIMIT 1";

const MATCH_RELATIONSHIP_ENDPOINTS: &str = "\
MATCH (s)-[r {uuid: $uuid}]->(e)
RETURN r, s.uuid AS start_node_id, e.uuid AS end_node_id
LIMIT 1";

const REPLACE_RELATIONSHIP_PROPERTIES: &str = "\
MATCH (s)-[r {uuid: $uuid}]->(e)
SET r = $properties, r.uuid = $uuid
RETURN r, s.uuid AS start_node_id, e.uuid AS end_node_id";

const DELETE_RELATIONSHIP: &str = "\
MATCH ()-[r {uuid: $uuid}]->()
DELETE r";

const PING: &str = "RETURN 1 AS ok";

impl Statement {
    /// Columns of every returned row.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Statement::MergeNode { .. }
            | Statement::MatchNode { .. }
            | Statement::ReplaceNode { .. } => &["n"],
            Statement::CreateRelationship { .. }
            | Statement::MatchRelationship { .. }
            | Statement::MatchRelationshipEndpoints { .. }
            | Statement::ReplaceRelationshipProperties { .. } => &["r", "start_node_id", "end_node_id"],
            Statement::DetachDeleteNode { .. } | Statement::DeleteRelationship { .. } => &[],
            Statement::Ping => &["ok"],
        }
    }

    /// Render to Cypher text and parameters.
    pub fn query(&self) -> Query {
        let mut params = PropertyMap::new();
        let text = match self {
            Statement::MergeNode { uuid, labels, properties } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                params.insert("labels".into(), Value::from(labels.clone()));
                params.insert("properties".into(), Value::Map(properties.clone()));
                MERGE_NODE
            }
            Statement::MatchNode { uuid } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                MATCH_NODE
            }
            Statement::ReplaceNode { uuid, labels, properties } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                params.insert("labels".into(), Value::from(labels.clone()));
                params.insert("properties".into(), Value::Map(properties.clone()));
                REPLACE_NODE
            }
            Statement::DetachDeleteNode { uuid } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                DETACH_DELETE_NODE
            }
            Statement::CreateRelationship { uuid, rel_type, start_uuid, end_uuid, properties } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                params.insert("type".into(), Value::from(rel_type.as_str()));
                params.insert("start_uuid".into(), Value::from(start_uuid.as_str()));
                params.insert("end_uuid".into(), Value::from(end_uuid.as_str()));
                params.insert("properties".into(), Value::Map(properties.clone()));
                CREATE_RELATIONSHIP
            }
            Statement::MatchRelationship { uuid, start_uuid, end_uuid } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                params.insert("start_uuid".into(), Value::from(start_uuid.as_str()));
                params.insert("end_uuid".into(), Value::from(end_uuid.as_str()));
                MATCH_RELATIONSHIP
            }
            Statement::MatchRelationshipEndpoints { uuid } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                MATCH_RELATIONSHIP_ENDPOINTS
            }
            Statement::ReplaceRelationshipProperties { uuid, properties } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                params.insert("properties".into(), Value::Map(properties.clone()));
                REPLACE_RELATIONSHIP_PROPERTIES
            }
            Statement::DeleteRelationship { uuid } => {
                params.insert("uuid".into(), Value::from(uuid.as_str()));
                DELETE_RELATIONSHIP
            }
            Statement::Ping => PING,
        };
        Query { text, params }
    }
}
