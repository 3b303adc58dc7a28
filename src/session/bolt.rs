//! Bolt session: forwards rendered statements to an external Neo4j server.

use async_trait::async_trait;
use neo4rs::{BoltType, ConfigBuilder, Graph};

use crate::config::ConnectionSettings;
use crate::cypher::Statement;
use crate::model::*;
use crate::{Error, Result};
use super::{GraphSession, Record};

/// Session backed by a `neo4rs` connection pool.
pub struct BoltSession {
    graph: Graph,
}

impl BoltSession {
    /// Open a pool for the configured database.
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let config = ConfigBuilder::default()
            .uri(settings.uri.clone())
            .user(settings.user.clone())
            .password(settings.password.clone())
            .db(settings.database.clone())
            .build()
            .map_err(backend)?;
        let graph = Graph::connect(config).await.map_err(backend)?;
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphSession for BoltSession {
    async fn run(&self, statement: &Statement) -> Result<Vec<Record>> {
        let rendered = statement.query();
        let mut query = neo4rs::query(rendered.text);
        for (key, value) in &rendered.params {
            query = query.param(key, to_bolt(value)?);
        }

        let mut stream = self.graph.execute(query).await.map_err(backend)?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await.map_err(backend)? {
            let mut record = Record::default();
            for column in statement.columns() {
                let value: BoltType = row.get(column).map_err(backend)?;
                record.values.insert((*column).to_owned(), from_bolt(value));
            }
            records.push(record);
        }
        Ok(records)
    }
}

fn backend(err: impl std::fmt::Display) -> Error {
    Error::Backend(err.to_string())
}

fn to_bolt(value: &Value) -> Result<BoltType> {
    let bolt = match value {
        Value::Null => BoltType::Null(neo4rs::BoltNull),
        Value::Bool(b) => BoltType::Boolean(neo4rs::BoltBoolean::new(*b)),
        Value::Int(i) => BoltType::Integer(neo4rs::BoltInteger::new(*i)),
        Value::Float(f) => BoltType::Float(neo4rs::BoltFloat::new(*f)),
        Value::String(s) => BoltType::String(neo4rs::BoltString::new(s)),
        Value::List(items) => BoltType::List(neo4rs::BoltList {
            value: items.iter().map(to_bolt).collect::<Result<_>>()?,
        }),
        Value::Map(m) => BoltType::Map(neo4rs::BoltMap {
            value: m
                .iter()
                .map(|(k, v)| Ok((neo4rs::BoltString::new(k), to_bolt(v)?)))
                .collect::<Result<_>>()?,
        }),
        Value::Node(_) | Value::Relationship(_) => {
            return Err(Error::Validation(format!(
                "{} cannot be sent as a query parameter",
                value.type_name()
            )));
        }
    };
    Ok(bolt)
}

fn from_bolt(value: BoltType) -> Value {
    match value {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::Int(i.value),
        BoltType::Float(f) => Value::Float(f.value),
        BoltType::String(s) => Value::String(s.value),
        BoltType::List(l) => Value::List(l.value.into_iter().map(from_bolt).collect()),
        BoltType::Map(m) => Value::Map(map_from_bolt(m)),
        BoltType::Node(n) => Value::Node(Box::new(Node {
            id: NodeId(n.id.value as u64),
            labels: n
                .labels
                .value
                .into_iter()
                .filter_map(|l| match l {
                    BoltType::String(s) => Some(s.value),
                    _ => None,
                })
                .collect(),
            properties: map_from_bolt(n.properties),
        })),
        BoltType::Relation(r) => Value::Relationship(Box::new(Relationship {
            id: RelId(r.id.value as u64),
            src: NodeId(r.start_node_id.value as u64),
            dst: NodeId(r.end_node_id.value as u64),
            rel_type: r.typ.value,
            properties: map_from_bolt(r.properties),
        })),
        // Temporal, spatial and byte values keep their debug rendering.
        other => Value::String(format!("{other:?}")),
    }
}

fn map_from_bolt(map: neo4rs::BoltMap) -> PropertyMap {
    map.value
        .into_iter()
        .map(|(k, v)| (k.value, from_bolt(v)))
        .collect()
}
