//! `neo4j_node`: a labeled, propertied vertex.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::{self, DeclaredLabels, DeclaredProperties};
use crate::cypher::Statement;
use crate::identity::{self, UUID_V4_PATTERN};
use crate::model::{Attr, Node};
use crate::session::SharedSession;
use crate::Result;
use super::{Attribute, AttributeType, ImportState, Resource, ResourceModel, Schema};

/// Declared state of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeModel {
    pub labels: DeclaredLabels,
    pub properties: DeclaredProperties,
    pub id: Attr<String>,
}

impl NodeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Attr::Known(id.into());
        self
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels = Attr::Known(labels.into_iter().map(|l| Attr::Known(l.into())).collect());
        self
    }

    pub fn with_properties<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties = Attr::Known(
            pairs.into_iter().map(|(k, v)| (k.into(), Attr::Known(v.into()))).collect(),
        );
        self
    }

    /// Known label values; null or unknown elements are skipped.
    pub fn label_set(&self) -> Option<BTreeSet<&str>> {
        self.labels
            .as_known()
            .map(|ls| ls.iter().filter_map(Attr::as_known).map(String::as_str).collect())
    }

    /// The label set, if every element is known and none repeats.
    fn distinct_labels(&self) -> Option<BTreeSet<&str>> {
        let labels = self.labels.as_known()?;
        let mut set = BTreeSet::new();
        for label in labels {
            if !set.insert(label.as_known()?.as_str()) {
                return None;
            }
        }
        Some(set)
    }

    /// Known property values; null or unknown values are skipped.
    pub fn property_values(&self) -> Option<BTreeMap<&str, &str>> {
        self.properties.as_known().map(|ps| {
            ps.iter()
                .filter_map(|(k, v)| v.as_known().map(|v| (k.as_str(), v.as_str())))
                .collect()
        })
    }
}

impl ResourceModel for NodeModel {
    fn changed_attributes(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        // Labels compare as sets; declared order is cosmetic. A list that
        // would fail validation always counts as changed.
        let labels_equal = match (&self.labels, &other.labels) {
            (Attr::Known(_), Attr::Known(_)) => match (self.distinct_labels(), other.distinct_labels()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            (a, b) => a == b,
        };
        if !labels_equal {
            changed.push("labels");
        }
        if self.properties != other.properties {
            changed.push("properties");
        }
        changed
    }
}

/// Reconciler for `neo4j_node`.
pub struct NodeResource {
    session: SharedSession,
}

impl NodeResource {
    pub const TYPE_NAME: &'static str = "neo4j_node";

    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Resource for NodeResource {
    type Model = NodeModel;

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema {
            description: "Neo4j Node.",
            attributes: vec![
                Attribute::optional("labels", AttributeType::StringList)
                    .describe("Node labels."),
                Attribute::computed("id", AttributeType::String)
                    .describe("Node unique identifier.")
                    .use_state_for_unknown()
                    .pattern(UUID_V4_PATTERN),
                Attribute::optional("properties", AttributeType::StringMap)
                    .describe("Node properties."),
            ],
        }
    }

    async fn create(&self, mut plan: NodeModel) -> Result<NodeModel> {
        trace!("create a node");
        let labels = codec::encode_labels(&plan.labels)
            .inspect_err(|e| debug!(error = %e, "faulty labels provided"))?;
        let properties = codec::encode(&plan.properties)
            .inspect_err(|e| debug!(error = %e, "faulty properties provided"))?;

        let id = identity::new_id();
        let statement = Statement::MergeNode { uuid: id.clone(), labels, properties };
        self.session
            .run(&statement)
            .await
            .inspect_err(|e| debug!(id = %id, error = %e, "failed to create the node"))?;

        trace!(id = %id, "created a node");
        plan.id = Attr::Known(id);
        Ok(plan)
    }

    async fn read(&self, mut state: NodeModel) -> Result<NodeModel> {
        let id = identity::require_id(&state.id)?.to_owned();
        trace!(id = %id, "reading the node");

        let record = identity::lookup(
            &*self.session,
            &Statement::MatchNode { uuid: id.clone() },
            &format!("node {id}"),
        )
        .await
        .inspect_err(|e| debug!(id = %id, error = %e, "failed to read the node"))?;
        let node: Node = record.get("n")?;

        state.labels = codec::decode_labels(&node.labels, &state.labels);
        state.properties = codec::decode(&node.properties, codec::SYSTEM_KEYS, &state.properties);
        trace!(id = %id, "read the node");
        Ok(state)
    }

    async fn update(&self, plan: NodeModel) -> Result<NodeModel> {
        let id = identity::require_id(&plan.id)?.to_owned();
        trace!(id = %id, "updating the node");

        let labels = codec::encode_labels(&plan.labels)
            .inspect_err(|e| debug!(error = %e, "faulty labels provided"))?;
        let properties = codec::encode(&plan.properties)
            .inspect_err(|e| debug!(error = %e, "faulty properties provided"))?;

        identity::lookup(
            &*self.session,
            &Statement::ReplaceNode { uuid: id.clone(), labels, properties },
            &format!("node {id}"),
        )
        .await
        .inspect_err(|e| debug!(id = %id, error = %e, "failed to update the node"))?;

        trace!(id = %id, "updated the node");
        Ok(plan)
    }

    async fn delete(&self, state: NodeModel) -> Result<NodeModel> {
        let id = identity::require_id(&state.id)?.to_owned();
        trace!(id = %id, "delete the node");

        self.session
            .run(&Statement::DetachDeleteNode { uuid: id.clone() })
            .await
            .inspect_err(|e| debug!(id = %id, error = %e, "failed to delete the node"))?;

        trace!(id = %id, "deleted the node");
        Ok(NodeModel::default())
    }
}

#[async_trait]
impl ImportState for NodeResource {
    async fn import_state(&self, id: &str) -> Result<NodeModel> {
        let id = identity::parse_import_id(id)?;
        trace!(id = %id, "importing the node");
        self.read(NodeModel::new().with_id(id)).await
    }
}
