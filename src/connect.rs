//! Connection bootstrap.
//!
//! Opens the single session a provider shares with all of its resources and
//! verifies it answers, retrying with a fixed delay up to a fixed number of
//! attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::ConnectionSettings;
use crate::session::{MemorySession, SharedSession};
use crate::{Error, Result};

/// Opens sessions for resolved connection settings.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, settings: &ConnectionSettings) -> Result<SharedSession>;
}

/// Retry schedule for connectivity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(1) }
    }
}

/// Open a session and verify connectivity.
///
/// Each attempt opens through `connector` and verifies; after a failure the
/// bootstrap sleeps `policy.delay` unless attempts are exhausted, in which
/// case the last failure is reported as `Error::Connection`.
pub async fn connect(
    settings: &ConnectionSettings,
    connector: &dyn Connector,
    policy: RetryPolicy,
) -> Result<SharedSession> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let outcome = match connector.open(settings).await {
            Ok(session) => session.verify_connectivity().await.map(|_| session),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(session) => {
                debug!(uri = %settings.uri, database = %settings.database, attempt, "connected");
                return Ok(session);
            }
            Err(e) => {
                warn!(uri = %settings.uri, attempt, error = %e, "connectivity check failed");
                last_error = e.to_string();
            }
        }
        if attempt < attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(Error::Connection { attempts, message: last_error })
}

/// Connector handing out one shared in-memory graph.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    session: MemorySession,
}

impl MemoryConnector {
    pub fn new(session: MemorySession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, _settings: &ConnectionSettings) -> Result<SharedSession> {
        Ok(Arc::new(self.session.clone()))
    }
}

/// Connector opening Bolt sessions against a Neo4j server.
#[cfg(feature = "bolt")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BoltConnector;

#[cfg(feature = "bolt")]
#[async_trait]
impl Connector for BoltConnector {
    async fn open(&self, settings: &ConnectionSettings) -> Result<SharedSession> {
        let session = crate::session::BoltSession::connect(settings).await?;
        Ok(Arc::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            uri: "memory://".into(),
            user: "neo4j".into(),
            password: "secret".into(),
            database: "neo4j".into(),
        }
    }

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, delay: Duration::ZERO }
    }

    /// Refuses to open the first `failures` sessions.
    struct Refusing {
        failures: u32,
        opened: AtomicU32,
    }

    #[async_trait]
    impl Connector for Refusing {
        async fn open(&self, _settings: &ConnectionSettings) -> Result<SharedSession> {
            let n = self.opened.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(Error::Backend(format!("refused #{n}")));
            }
            Ok(Arc::new(MemorySession::new()))
        }
    }

    #[test]
    fn test_default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_recovers_within_attempts() {
        let c = Refusing { failures: 2, opened: AtomicU32::new(0) };
        assert!(connect(&settings(), &c, fast(3)).await.is_ok());
        assert_eq!(c.opened.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_is_connection_error() {
        let c = Refusing { failures: 5, opened: AtomicU32::new(0) };
        let err = connect(&settings(), &c, fast(3)).await.err().unwrap();
        assert!(matches!(err, Error::Connection { attempts: 3, ref message } if message.contains("refused #2")));
        assert_eq!(c.opened.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_verification_failure_is_retried() {
        let session = MemorySession::new();
        session.fail_next("unavailable");
        let c = MemoryConnector::new(session);
        assert!(connect(&settings(), &c, fast(3)).await.is_ok());
    }
}
