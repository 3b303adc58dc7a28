//! In-memory graph session.
//!
//! The reference implementation of `GraphSession`. It keeps a property
//! graph in HashMaps behind a single `RwLock` and executes each
//! [`Statement`] with the semantics of its Cypher text.
//!
//! ## Limitations
//!
//! - **No persistence**: the graph lives as long as the last clone.
//! - **Linear lookups**: `uuid` matches scan every node or relationship.
//!
//! Use this session for:
//! - Testing the reconcilers without a server
//! - Embedding the resources in applications that don't need Neo4j

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::codec::RESERVED_KEY;
use crate::cypher::Statement;
use crate::model::*;
use crate::{Error, Result};
use super::{GraphSession, Record};

// ============================================================================
// MemorySession
// ============================================================================

/// In-memory property graph session. Clones share the same graph.
#[derive(Clone, Default)]
pub struct MemorySession {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    graph: RwLock<GraphState>,
    /// Messages of injected failures, consumed one per `run`.
    failures: Mutex<VecDeque<String>>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
}

#[derive(Default)]
struct GraphState {
    nodes: HashMap<NodeId, Node>,
    relationships: HashMap<RelId, Relationship>,
    /// node_id → list of relationship IDs
    adjacency: HashMap<NodeId, Vec<RelId>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `run` fail with a backend error carrying `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.inner.failures.lock().push_back(message.into());
    }

    pub fn node_count(&self) -> usize {
        self.inner.graph.read().nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.inner.graph.read().relationships.len()
    }

    /// The vertex carrying `uuid`, if any.
    pub fn find_node(&self, uuid: &str) -> Option<Node> {
        let graph = self.inner.graph.read();
        graph.node_by_uuid(uuid).and_then(|id| graph.nodes.get(&id).cloned())
    }

    /// The edge carrying `uuid`, if any.
    pub fn find_relationship(&self, uuid: &str) -> Option<Relationship> {
        let graph = self.inner.graph.read();
        graph.rel_by_uuid(uuid).and_then(|id| graph.relationships.get(&id).cloned())
    }

    fn next_node_id(&self) -> NodeId {
        NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn next_rel_id(&self) -> RelId {
        RelId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn execute(&self, statement: &Statement) -> Vec<Record> {
        let mut graph = self.inner.graph.write();
        match statement {
            Statement::MergeNode { uuid, labels, properties } => {
                let id = match graph.node_by_uuid(uuid) {
                    Some(id) => id,
                    None => {
                        let id = self.next_node_id();
                        let node = Node::new(id).with_property(RESERVED_KEY, uuid.as_str());
                        graph.nodes.insert(id, node);
                        graph.adjacency.insert(id, Vec::new());
                        id
                    }
                };
                let Some(node) = graph.nodes.get_mut(&id) else { return Vec::new() };
                for label in labels {
                    if !node.has_label(label) {
                        node.labels.push(label.clone());
                    }
                }
                node.properties.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
                vec![node_record(node)]
            }

            Statement::MatchNode { uuid } => graph
                .node_by_uuid(uuid)
                .and_then(|id| graph.nodes.get(&id))
                .map(node_record)
                .into_iter()
                .collect(),

            Statement::ReplaceNode { uuid, labels, properties } => {
                let Some(id) = graph.node_by_uuid(uuid) else { return Vec::new() };
                let Some(node) = graph.nodes.get_mut(&id) else { return Vec::new() };
                node.labels.clear();
                for label in labels {
                    if !node.has_label(label) {
                        node.labels.push(label.clone());
                    }
                }
                node.properties = properties.clone();
                node.properties.insert(RESERVED_KEY.into(), Value::from(uuid.as_str()));
                vec![node_record(node)]
            }

            Statement::DetachDeleteNode { uuid } => {
                if let Some(id) = graph.node_by_uuid(uuid) {
                    let rels = graph.adjacency.remove(&id).unwrap_or_default();
                    for rid in rels {
                        graph.remove_relationship(rid);
                    }
                    graph.nodes.remove(&id);
                }
                Vec::new()
            }

            Statement::CreateRelationship { uuid, rel_type, start_uuid, end_uuid, properties } => {
                let (Some(src), Some(dst)) = (graph.node_by_uuid(start_uuid), graph.node_by_uuid(end_uuid)) else {
                    return Vec::new();
                };
                let id = self.next_rel_id();
                let mut rel = Relationship::new(id, src, dst, rel_type.as_str());
                rel.properties = properties.clone();
                rel.properties.insert(RESERVED_KEY.into(), Value::from(uuid.as_str()));

                graph.adjacency.entry(src).or_default().push(id);
                if src != dst {
                    graph.adjacency.entry(dst).or_default().push(id);
                }
                let record = graph.rel_record(&rel);
                graph.relationships.insert(id, rel);
                vec![record]
            }

            Statement::MatchRelationship { uuid, start_uuid, end_uuid } => graph
                .rel_by_uuid(uuid)
                .and_then(|id| graph.relationships.get(&id))
                .filter(|rel| {
                    graph.uuid_of(rel.src).as_deref() == Some(start_uuid.as_str())
                        && graph.uuid_of(rel.dst).as_deref() == Some(end_uuid.as_str())
                })
                .map(|rel| graph.rel_record(rel))
                .into_iter()
                .collect(),

            Statement::MatchRelationshipEndpoints { uuid } => graph
                .rel_by_uuid(uuid)
                .and_then(|id| graph.relationships.get(&id))
                .map(|rel| graph.rel_record(rel))
                .into_iter()
                .collect(),

            Statement::ReplaceRelationshipProperties { uuid, properties } => {
                let Some(id) = graph.rel_by_uuid(uuid) else { return Vec::new() };
                let Some(rel) = graph.relationships.get_mut(&id) else { return Vec::new() };
                rel.properties = properties.clone();
                rel.properties.insert(RESERVED_KEY.into(), Value::from(uuid.as_str()));
                let rel = rel.clone();
                vec![graph.rel_record(&rel)]
            }

            Statement::DeleteRelationship { uuid } => {
                if let Some(id) = graph.rel_by_uuid(uuid) {
                    graph.remove_relationship(id);
                }
                Vec::new()
            }

            Statement::Ping => vec![Record::new([("ok", Value::Int(1))])],
        }
    }
}

impl GraphState {
    /// Lowest-id vertex whose `uuid` property equals `uuid`.
    fn node_by_uuid(&self, uuid: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.get(RESERVED_KEY).and_then(Value::as_str) == Some(uuid))
            .map(|n| n.id)
            .min_by_key(|id| id.0)
    }

    /// Lowest-id edge whose `uuid` property equals `uuid`.
    fn rel_by_uuid(&self, uuid: &str) -> Option<RelId> {
        self.relationships
            .values()
            .filter(|r| r.get(RESERVED_KEY).and_then(Value::as_str) == Some(uuid))
            .map(|r| r.id)
            .min_by_key(|id| id.0)
    }

    fn uuid_of(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(&node)
            .and_then(|n| n.get(RESERVED_KEY))
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    fn remove_relationship(&mut self, id: RelId) {
        if let Some(rel) = self.relationships.remove(&id) {
            for end in [rel.src, rel.dst] {
                if let Some(rels) = self.adjacency.get_mut(&end) {
                    rels.retain(|rid| *rid != id);
                }
            }
        }
    }

    fn rel_record(&self, rel: &Relationship) -> Record {
        Record::new([
            ("r", Value::Relationship(Box::new(rel.clone()))),
            ("start_node_id", Value::from(self.uuid_of(rel.src))),
            ("end_node_id", Value::from(self.uuid_of(rel.dst))),
        ])
    }
}

fn node_record(node: &Node) -> Record {
    Record::new([("n", Value::Node(Box::new(node.clone())))])
}

// ============================================================================
// GraphSession impl
// ============================================================================

#[async_trait]
impl GraphSession for MemorySession {
    async fn run(&self, statement: &Statement) -> Result<Vec<Record>> {
        if let Some(message) = self.inner.failures.lock().pop_front() {
            return Err(Error::Backend(message));
        }
        Ok(self.execute(statement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(uuid: &str, labels: &[&str]) -> Statement {
        Statement::MergeNode {
            uuid: uuid.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: property_map([("k", 1)]),
        }
    }

    #[tokio::test]
    async fn test_merge_is_idempotent_per_uuid() {
        let session = MemorySession::new();
        session.run(&merge("a", &["X"])).await.unwrap();
        session.run(&merge("a", &["X", "Y"])).await.unwrap();
        assert_eq!(session.node_count(), 1);
        let node = session.find_node("a").unwrap();
        assert_eq!(node.labels, vec!["X", "Y"]);
        assert_eq!(node.get("k"), Some(&Value::Int(1)));
    }

    #[tokio::test]
    async fn test_detach_delete_removes_incident_edges() {
        let session = MemorySession::new();
        session.run(&merge("a", &[])).await.unwrap();
        session.run(&merge("b", &[])).await.unwrap();
        let rows = session.run(&Statement::CreateRelationship {
            uuid: "r".into(),
            rel_type: "T".into(),
            start_uuid: "a".into(),
            end_uuid: "b".into(),
            properties: PropertyMap::new(),
        }).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(session.relationship_count(), 1);

        session.run(&Statement::DetachDeleteNode { uuid: "a".into() }).await.unwrap();
        assert_eq!(session.node_count(), 1);
        assert_eq!(session.relationship_count(), 0);
    }

    #[tokio::test]
    async fn test_create_relationship_without_endpoint_yields_no_row() {
        let session = MemorySession::new();
        session.run(&merge("a", &[])).await.unwrap();
        let rows = session.run(&Statement::CreateRelationship {
            uuid: "r".into(),
            rel_type: "T".into(),
            start_uuid: "a".into(),
            end_uuid: "missing".into(),
            properties: PropertyMap::new(),
        }).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(session.relationship_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let session = MemorySession::new();
        session.fail_next("boom");
        assert!(matches!(session.run(&Statement::Ping).await, Err(Error::Backend(m)) if m == "boom"));
        assert!(session.verify_connectivity().await.is_ok());
    }
}
