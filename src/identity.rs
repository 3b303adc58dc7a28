//! Resource identity.
//!
//! Every managed vertex and edge carries a version-4 UUID twice: as the
//! declared `id` attribute and as the hidden `uuid` property in the graph.
//! The backend's own identifiers are never trusted across transactions.

use uuid::Uuid;

use crate::cypher::Statement;
use crate::model::Attr;
use crate::session::{GraphSession, Record};
use crate::{Error, Result};

/// Pattern every generated id matches.
pub const UUID_V4_PATTERN: &str =
    "^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}$";

/// Generate a fresh id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// True when `id` is a lowercase hyphenated version-4 UUID.
pub fn is_v4(id: &str) -> bool {
    match Uuid::parse_str(id) {
        Ok(uuid) => uuid.get_version_num() == 4 && uuid.hyphenated().to_string() == id,
        Err(_) => false,
    }
}

/// The known id of an existing resource.
pub fn require_id(id: &Attr<String>) -> Result<&str> {
    match id {
        Attr::Known(id) if !id.is_empty() => Ok(id.as_str()),
        Attr::Known(_) => Err(Error::Validation("id is empty".into())),
        Attr::Null => Err(Error::Validation("id is null".into())),
        Attr::Unknown => Err(Error::Validation("id is unknown".into())),
    }
}

/// Validate an import identifier: a bare UUID, no composite key.
pub fn parse_import_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    Uuid::parse_str(trimmed)
        .map(|_| trimmed.to_owned())
        .map_err(|e| Error::Validation(format!("import id {raw:?} is not a UUID: {e}")))
}

/// Run a lookup statement and return its first record.
///
/// No record means the resource is gone: `NotFound` naming `what`.
pub async fn lookup(session: &dyn GraphSession, statement: &Statement, what: &str) -> Result<Record> {
    session
        .run(statement)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(what.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;

    #[test]
    fn test_new_id_is_v4() {
        let id = new_id();
        assert!(is_v4(&id), "{id}");
        assert_ne!(id, new_id());
    }

    #[test]
    fn test_is_v4_rejects_other_shapes() {
        assert!(!is_v4("not-a-uuid"));
        assert!(!is_v4("6BA7B810-9DAD-11D1-80B4-00C04FD430C8"));
        assert!(!is_v4(&Uuid::nil().to_string()));
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(&Attr::known("abc")).unwrap(), "abc");
        assert!(matches!(require_id(&Attr::Null), Err(Error::Validation(_))));
        assert!(matches!(require_id(&Attr::Unknown), Err(Error::Validation(_))));
        assert!(matches!(require_id(&Attr::known("")), Err(Error::Validation(_))));
    }

    #[test]
    fn test_parse_import_id() {
        let id = new_id();
        assert_eq!(parse_import_id(&format!(" {id}\n")).unwrap(), id);
        assert!(matches!(parse_import_id("a,b"), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_lookup_missing_is_not_found() {
        let session = MemorySession::new();
        let err = lookup(&session, &Statement::MatchNode { uuid: new_id() }, "node").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(m) if m == "node"));
    }
}
