//! Provider configuration and connection bootstrap.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use neo4j_resources::{
    ConnectionSettings, Connector, Error, MemoryConnector, MemorySession, NodeModel, Provider,
    ProviderConfig, RelationshipModel, Resource, RetryPolicy, SharedSession,
};

const NO_DELAY: RetryPolicy = RetryPolicy { max_attempts: 3, delay: Duration::ZERO };

fn full_config() -> ProviderConfig {
    ProviderConfig::from_json(
        r#"{
            "db_uri": "bolt://localhost:7687",
            "db_user": "neo4j",
            "db_password": "password",
            "db_name": "neo4j"
        }"#,
    )
    .unwrap()
}

/// Counts opens; every open before `healthy_from` yields a dead session.
struct Flaky {
    graph: MemorySession,
    healthy_from: u32,
    opened: AtomicU32,
}

#[async_trait]
impl Connector for Flaky {
    async fn open(&self, settings: &ConnectionSettings) -> neo4j_resources::Result<SharedSession> {
        assert_eq!(settings.uri, "bolt://localhost:7687");
        let n = self.opened.fetch_add(1, Ordering::SeqCst);
        if n < self.healthy_from {
            // Fails the verification round trip.
            self.graph.fail_next(format!("no route to host ({n})"));
        }
        Ok(Arc::new(self.graph.clone()))
    }
}

#[tokio::test]
async fn test_configured_provider_manages_resources() {
    let graph = MemorySession::new();
    let provider = Provider::configure(full_config(), &MemoryConnector::new(graph.clone()), NO_DELAY)
        .await
        .unwrap();

    let nodes = provider.node_resource();
    let rels = provider.relationship_resource();
    let a = nodes.create(NodeModel::new().with_labels(["A"])).await.unwrap();
    let a_id = a.id.as_known().cloned().unwrap();
    rels.create(RelationshipModel::new("SELF", &a_id, &a_id)).await.unwrap();

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.relationship_count(), 1);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let flaky = Flaky { graph: MemorySession::new(), healthy_from: 2, opened: AtomicU32::new(0) };
    let provider = Provider::configure(full_config(), &flaky, NO_DELAY).await;
    assert!(provider.is_ok());
    assert_eq!(flaky.opened.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_persistent_failure_is_connection_error() {
    let flaky = Flaky { graph: MemorySession::new(), healthy_from: u32::MAX, opened: AtomicU32::new(0) };
    let err = Provider::configure(full_config(), &flaky, NO_DELAY).await.err().unwrap();
    match err {
        Error::Connection { attempts, message } => {
            assert_eq!(attempts, 3);
            assert!(message.contains("no route to host (2)"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(flaky.opened.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_waits_between_attempts() {
    let flaky = Flaky { graph: MemorySession::new(), healthy_from: u32::MAX, opened: AtomicU32::new(0) };
    let policy = RetryPolicy { max_attempts: 3, delay: Duration::from_millis(20) };
    let started = std::time::Instant::now();
    assert!(Provider::configure(full_config(), &flaky, policy).await.is_err());
    // Two waits: none after the last attempt.
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_unknown_configuration_key_is_rejected() {
    let err = ProviderConfig::from_json(r#"{"db_url": "bolt://x"}"#).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}
