//! Provider configuration.
//!
//! Every field may be left out of the configuration payload and supplied
//! through the environment instead (`DB_URI`, `DB_USER`, `DB_PASSWORD`,
//! `DB_NAME`). Empty strings count as unset.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Database used when neither the payload nor `DB_NAME` names one.
pub const DEFAULT_DATABASE: &str = "neo4j";

pub const ENV_URI: &str = "DB_URI";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_NAME: &str = "DB_NAME";

/// Provider configuration as declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Database access URI.
    pub db_uri: Option<String>,
    /// User to authenticate as.
    pub db_user: Option<String>,
    /// Password of `db_user`.
    pub db_password: Option<String>,
    /// Database name.
    pub db_name: Option<String>,
}

/// Fully resolved connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl ProviderConfig {
    /// Parse the configuration payload handed over by the framework.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| Error::Validation(format!("invalid provider configuration: {e}")))
    }

    /// Resolve against the process environment.
    pub fn resolve(self) -> Result<ConnectionSettings> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with a custom variable lookup.
    pub fn resolve_with(self, lookup: impl Fn(&str) -> Option<String>) -> Result<ConnectionSettings> {
        let pick = |declared: Option<String>, env: &str| {
            declared
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(env).filter(|v| !v.is_empty()))
        };
        let require = |value: Option<String>, field: &str, env: &str| {
            value.ok_or_else(|| {
                Error::Validation(format!("{field} is not set; set it in the configuration or via {env}"))
            })
        };

        let uri = require(pick(self.db_uri, ENV_URI), "db_uri", ENV_URI)?;
        let user = require(pick(self.db_user, ENV_USER), "db_user", ENV_USER)?;
        let password = require(pick(self.db_password, ENV_PASSWORD), "db_password", ENV_PASSWORD)?;
        let database = pick(self.db_name, ENV_NAME).unwrap_or_else(|| DEFAULT_DATABASE.to_owned());

        Ok(ConnectionSettings { uri, user, password, database })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_declared_values_win_over_environment() {
        let cfg = ProviderConfig {
            db_uri: Some("bolt://declared:7687".into()),
            db_user: Some("neo4j".into()),
            db_password: Some("secret".into()),
            db_name: Some("graph".into()),
        };
        let s = cfg.resolve_with(env(&[("DB_URI", "bolt://env:7687")])).unwrap();
        assert_eq!(s.uri, "bolt://declared:7687");
        assert_eq!(s.database, "graph");
    }

    #[test]
    fn test_environment_fills_unset_and_empty_fields() {
        let cfg = ProviderConfig { db_uri: Some(String::new()), ..Default::default() };
        let s = cfg
            .resolve_with(env(&[("DB_URI", "bolt://env:7687"), ("DB_USER", "u"), ("DB_PASSWORD", "p")]))
            .unwrap();
        assert_eq!(s.uri, "bolt://env:7687");
        assert_eq!(s.user, "u");
        assert_eq!(s.database, DEFAULT_DATABASE);
    }

    #[test]
    fn test_missing_required_field() {
        let err = ProviderConfig::default()
            .resolve_with(env(&[("DB_URI", "bolt://x"), ("DB_USER", "u")]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(m) if m.contains("db_password") && m.contains("DB_PASSWORD")));
    }

    #[test]
    fn test_password_is_redacted() {
        let s = ConnectionSettings {
            uri: "bolt://x".into(),
            user: "u".into(),
            password: "hunter2".into(),
            database: "neo4j".into(),
        };
        assert!(!format!("{s:?}").contains("hunter2"));
    }

    #[test]
    fn test_from_json() {
        let cfg = ProviderConfig::from_json(r#"{"db_uri": "bolt://x", "db_name": null}"#).unwrap();
        assert_eq!(cfg.db_uri.as_deref(), Some("bolt://x"));
        assert!(ProviderConfig::from_json(r#"{"db_url": "bolt://x"}"#).is_err());
    }
}
