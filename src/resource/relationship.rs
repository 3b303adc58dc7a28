//! `neo4j_relationship`: a typed, propertied, directed edge between two
//! managed nodes.
//!
//! `type`, `start_node_id` and `end_node_id` are immutable: a change to any
//! of them plans a replacement, never an in-place update. Only `properties`
//! is ever updated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::{self, DeclaredProperties};
use crate::cypher::Statement;
use crate::identity::{self, UUID_V4_PATTERN};
use crate::model::{Attr, Relationship};
use crate::session::{Record, SharedSession};
use crate::{Error, Result};
use super::{Attribute, AttributeType, ImportState, Resource, ResourceModel, Schema};

/// Declared state of a relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipModel {
    #[serde(rename = "type")]
    pub rel_type: Attr<String>,
    pub start_node_id: Attr<String>,
    pub end_node_id: Attr<String>,
    pub properties: DeclaredProperties,
    pub id: Attr<String>,
}

impl RelationshipModel {
    pub fn new(
        rel_type: impl Into<String>,
        start_node_id: impl Into<String>,
        end_node_id: impl Into<String>,
    ) -> Self {
        Self {
            rel_type: Attr::Known(rel_type.into()),
            start_node_id: Attr::Known(start_node_id.into()),
            end_node_id: Attr::Known(end_node_id.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Attr::Known(id.into());
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
}

impl ResourceModel for RelationshipModel {
    fn changed_attributes(&self, other: &Self) -> Vec<&'static str> {
        [
            ("type", self.rel_type != other.rel_type),
            ("start_node_id", self.start_node_id != other.start_node_id),
            ("end_node_id", self.end_node_id != other.end_node_id),
            ("properties", self.properties != other.properties),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

/// A required string attribute that must be known and non-empty.
fn required<'a>(attr: &'a Attr<String>, name: &str) -> Result<&'a str> {
    match attr {
        Attr::Known(v) if !v.is_empty() => Ok(v.as_str()),
        Attr::Known(_) => Err(Error::Validation(format!("{name} is empty"))),
        Attr::Null => Err(Error::Validation(format!("{name} is null"))),
        Attr::Unknown => Err(Error::Validation(format!("{name} is unknown"))),
    }
}

/// The edge and its endpoint ids from a relationship row.
fn edge_from(record: &Record) -> Result<(Relationship, String, String)> {
    Ok((
        record.get("r")?,
        record.get("start_node_id")?,
        record.get("end_node_id")?,
    ))
}

/// Reconciler for `neo4j_relationship`.
pub struct RelationshipResource {
    session: SharedSession,
}

impl RelationshipResource {
    pub const TYPE_NAME: &'static str = "neo4j_relationship";

    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Resource for RelationshipResource {
    type Model = RelationshipModel;

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema {
            description: "Neo4j Relationship.",
            attributes: vec![
                Attribute::computed("id", AttributeType::String)
                    .describe("Relationship unique identifier.")
                    .use_state_for_unknown()
                    .pattern(UUID_V4_PATTERN),
                Attribute::required("type", AttributeType::String)
                    .describe("Relationship type.")
                    .requires_replace(),
                Attribute::required("start_node_id", AttributeType::String)
                    .describe("The ID of the Node where the Relationship starts from.")
                    .requires_replace(),
                Attribute::required("end_node_id", AttributeType::String)
                    .describe("The ID of the Node where the Relationship ends at.")
                    .requires_replace(),
                Attribute::optional("properties", AttributeType::StringMap)
                    .describe("Relationship properties."),
            ],
        }
    }

    async fn create(&self, mut plan: RelationshipModel) -> Result<RelationshipModel> {
        trace!("create a relationship");
        let rel_type = required(&plan.rel_type, "type")?.to_owned();
        let start_uuid = required(&plan.start_node_id, "start_node_id")?.to_owned();
        let end_uuid = required(&plan.end_node_id, "end_node_id")?.to_owned();
        let properties = codec::encode(&plan.properties)
            .inspect_err(|e| debug!(error = %e, "faulty properties provided"))?;

        let id = identity::new_id();
        let what = format!("start node {start_uuid} or end node {end_uuid}");
        let statement = Statement::CreateRelationship {
            uuid: id.clone(),
            rel_type,
            start_uuid,
            end_uuid,
            properties,
        };
        identity::lookup(&*self.session, &statement, &what)
            .await
            .inspect_err(|e| debug!(id = %id, error = %e, "failed to create the relationship"))?;

        trace!(id = %id, "created a relationship");
        plan.id = Attr::Known(id);
        Ok(plan)
    }

    async fn read(&self, mut state: RelationshipModel) -> Result<RelationshipModel> {
        let id = identity::require_id(&state.id)?.to_owned();
        trace!(id = %id, "reading the relationship");

        let statement = Statement::MatchRelationship {
            uuid: id.clone(),
            start_uuid: required(&state.start_node_id, "start_node_id")?.to_owned(),
            end_uuid: required(&state.end_node_id, "end_node_id")?.to_owned(),
        };
        let record = identity::lookup(&*self.session, &statement, &format!("relationship {id}"))
            .await
            .inspect_err(|e| debug!(id = %id, error = %e, "failed to read the relationship"))?;
        let (rel, _, _) = edge_from(&record)?;

        state.rel_type = Attr::Known(rel.rel_type);
        state.properties = codec::decode(&rel.properties, codec::SYSTEM_KEYS, &state.properties);
        trace!(id = %id, "read the relationship");
        Ok(state)
    }

    async fn update(&self, plan: RelationshipModel) -> Result<RelationshipModel> {
        let id = identity::require_id(&plan.id)?.to_owned();
        trace!(id = %id, "updating the relationship");

        let properties = codec::encode(&plan.properties)
            .inspect_err(|e| debug!(error = %e, "faulty properties provided"))?;

        identity::lookup(
            &*self.session,
            &Statement::ReplaceRelationshipProperties { uuid: id.clone(), properties },
            &format!("relationship {id}"),
        )
        .await
        .inspect_err(|e| debug!(id = %id, error = %e, "failed to update the relationship"))?;

        trace!(id = %id, "updated the relationship");
        Ok(plan)
    }

    async fn delete(&self, state: RelationshipModel) -> Result<RelationshipModel> {
        let id = identity::require_id(&state.id)?.to_owned();
        trace!(id = %id, "delete the relationship");

        self.session
            .run(&Statement::DeleteRelationship { uuid: id.clone() })
            .await
            .inspect_err(|e| debug!(id = %id, error = %e, "failed to delete the relationship"))?;

        trace!(id = %id, "deleted the relationship");
        Ok(RelationshipModel::default())
    }
}

#[async_trait]
impl ImportState for RelationshipResource {
    async fn import_state(&self, id: &str) -> Result<RelationshipModel> {
        let id = identity::parse_import_id(id)?;
        trace!(id = %id, "importing the relationship");

        let record = identity::lookup(
            &*self.session,
            &Statement::MatchRelationshipEndpoints { uuid: id.clone() },
            &format!("relationship {id}"),
        )
        .await
        .inspect_err(|e| debug!(id = %id, error = %e, "failed to import the relationship"))?;
        let (rel, start_node_id, end_node_id) = edge_from(&record)?;

        trace!(id = %id, "imported the relationship");
        Ok(RelationshipModel {
            properties: codec::decode(&rel.properties, codec::SYSTEM_KEYS, &Attr::Null),
            rel_type: Attr::Known(rel.rel_type),
            start_node_id: Attr::Known(start_node_id),
            end_node_id: Attr::Known(end_node_id),
            id: Attr::Known(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PlannedChange;

    fn resource() -> RelationshipResource {
        RelationshipResource::new(std::sync::Arc::new(crate::session::MemorySession::new()))
    }

    #[test]
    fn test_endpoint_change_forces_replacement() {
        let r = resource();
        let prior = RelationshipModel::new("foo", "a", "b").with_id("x");
        let desired = RelationshipModel::new("foo", "c", "b").with_id("x");
        assert_eq!(
            r.plan(Some(&prior), Some(&desired)),
            PlannedChange::Replace { attributes: vec!["start_node_id"] }
        );
    }

    #[test]
    fn test_type_change_forces_replacement_even_with_properties() {
        let r = resource();
        let prior = RelationshipModel::new("foo", "a", "b");
        let desired = RelationshipModel::new("bar", "a", "b").with_properties([("k", "v")]);
        assert_eq!(
            r.plan(Some(&prior), Some(&desired)),
            PlannedChange::Replace { attributes: vec!["type"] }
        );
    }

    #[test]
    fn test_property_change_updates_in_place() {
        let r = resource();
        let prior = RelationshipModel::new("foo", "a", "b").with_id("x");
        let desired = prior.clone().with_properties([("k", "v")]);
        assert_eq!(
            r.plan(Some(&prior), Some(&desired)),
            PlannedChange::Update { attributes: vec!["properties"] }
        );
    }

    #[test]
    fn test_unknown_id_is_not_a_change() {
        let r = resource();
        let prior = RelationshipModel::new("foo", "a", "b").with_id("x");
        let mut desired = prior.clone();
        desired.id = Attr::Unknown;
        assert_eq!(r.plan(Some(&prior), Some(&desired)), PlannedChange::NoOp);
    }

    #[test]
    fn test_required_attributes() {
        assert!(matches!(required(&Attr::Null, "type"), Err(Error::Validation(m)) if m == "type is null"));
        assert!(matches!(required(&Attr::known(""), "type"), Err(Error::Validation(m)) if m == "type is empty"));
        assert_eq!(required(&Attr::known("T"), "type").unwrap(), "T");
    }

    #[test]
    fn test_model_serializes_type_key() {
        let m = RelationshipModel::new("foo", "a", "b");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["type"], "foo");
        assert!(json["properties"].is_null());
        let back: RelationshipModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }
}
