//! Property codec.
//!
//! Declared properties are string-typed (`map<string,string>` in the
//! resource schema) so plans diff stably. On the way to the backend each
//! string is narrowed to the richest scalar it canonically spells: integer,
//! then float, then string. On the way back every stored value is rendered
//! with [`canonical`], so `decode(encode(p)) == p` for every declared map.
//!
//! Labels get the same absent-vs-empty treatment as properties.

use std::collections::BTreeMap;

use crate::model::{Attr, PropertyMap, Value};
use crate::{Error, Result};

/// Property key holding the resource id on every managed vertex and edge.
pub const RESERVED_KEY: &str = "uuid";

/// Backend properties never surfaced as declared properties.
pub const SYSTEM_KEYS: &[&str] = &[RESERVED_KEY];

/// Declared `properties` attribute.
pub type DeclaredProperties = Attr<BTreeMap<String, Attr<String>>>;

/// Declared `labels` attribute.
pub type DeclaredLabels = Attr<Vec<Attr<String>>>;

// ============================================================================
// Properties
// ============================================================================

/// Validate declared properties and convert them into a backend map.
///
/// An absent map encodes to an empty one.
pub fn encode(declared: &DeclaredProperties) -> Result<PropertyMap> {
    let entries = match declared {
        Attr::Null => return Ok(PropertyMap::new()),
        Attr::Unknown => return Err(Error::Validation("properties are unknown".into())),
        Attr::Known(entries) => entries,
    };

    let mut problems = Vec::new();
    if entries.contains_key(RESERVED_KEY) {
        problems.push(format!("reserved key is set as property: {RESERVED_KEY}"));
    }

    let mut out = PropertyMap::with_capacity(entries.len());
    for (key, value) in entries {
        match value {
            Attr::Null => problems.push(format!("property is null: {key}")),
            Attr::Unknown => problems.push(format!("property is unknown: {key}")),
            Attr::Known(s) => {
                out.insert(key.clone(), infer(s));
            }
        }
    }

    if problems.is_empty() {
        Ok(out)
    } else {
        Err(Error::Validation(problems.join("; ")))
    }
}

/// Convert backend properties into the declared representation.
///
/// `exclude` lists system keys to drop. When nothing is left and `prior` was
/// not a known map, the result is absent rather than empty.
pub fn decode(props: &PropertyMap, exclude: &[&str], prior: &DeclaredProperties) -> DeclaredProperties {
    let declared: BTreeMap<String, Attr<String>> = props
        .iter()
        .filter(|(k, _)| !exclude.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), Attr::Known(canonical(v))))
        .collect();

    if declared.is_empty() && !prior.is_known() {
        Attr::Null
    } else {
        Attr::Known(declared)
    }
}

/// Narrow a declared string to a scalar: integer, then float, then string.
///
/// A number is only recognised when it is written in canonical form, so
/// `"007"` or `"1.0"` stay strings and survive the round trip unchanged.
pub fn infer(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        if i.to_string() == s {
            return Value::Int(i);
        }
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() && f.to_string() == s {
            return Value::Float(f);
        }
    }
    Value::String(s.to_owned())
}

/// Canonical string form of a stored value.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => s.clone(),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(canonical).collect();
            format!("[{}]", parts.join(", "))
        }
        other => other.to_string(),
    }
}

// ============================================================================
// Labels
// ============================================================================

/// Validate declared labels. An absent list encodes to no labels.
pub fn encode_labels(declared: &DeclaredLabels) -> Result<Vec<String>> {
    let items = match declared {
        Attr::Null => return Ok(Vec::new()),
        Attr::Unknown => return Err(Error::Validation("labels are unknown".into())),
        Attr::Known(items) => items,
    };

    let mut problems = Vec::new();
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Attr::Null => problems.push(format!("label {i} is null")),
            Attr::Unknown => problems.push(format!("label {i} is unknown")),
            Attr::Known(l) if l.is_empty() => problems.push(format!("label {i} is empty")),
            Attr::Known(l) if out.contains(l) => problems.push(format!("label {i} is a duplicate: {l}")),
            Attr::Known(l) => out.push(l.clone()),
        }
    }

    if problems.is_empty() {
        Ok(out)
    } else {
        Err(Error::Validation(problems.join("; ")))
    }
}

/// Convert backend labels into the declared representation.
///
/// Labels already declared in `prior` keep their declared order; the rest
/// follow sorted. No labels and no known prior list yields absent.
pub fn decode_labels(labels: &[String], prior: &DeclaredLabels) -> DeclaredLabels {
    if labels.is_empty() && !prior.is_known() {
        return Attr::Null;
    }

    let mut remaining: Vec<&String> = labels.iter().collect();
    let mut ordered = Vec::with_capacity(labels.len());
    if let Attr::Known(declared) = prior {
        for label in declared.iter().filter_map(Attr::as_known) {
            if let Some(pos) = remaining.iter().position(|r| *r == label) {
                ordered.push(Attr::Known(remaining.remove(pos).clone()));
            }
        }
    }
    remaining.sort();
    ordered.extend(remaining.into_iter().map(|l| Attr::Known(l.clone())));
    Attr::Known(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn declared(pairs: &[(&str, &str)]) -> DeclaredProperties {
        Attr::Known(pairs.iter().map(|(k, v)| (k.to_string(), Attr::known(*v))).collect())
    }

    #[test]
    fn test_encode_infers_scalars() {
        let props = encode(&declared(&[("foo", "100"), ("bar", "qux"), ("quux", "1.2")])).unwrap();
        assert_eq!(props["foo"], Value::Int(100));
        assert_eq!(props["bar"], Value::String("qux".into()));
        assert_eq!(props["quux"], Value::Float(1.2));
    }

    #[test]
    fn test_encode_rejects_reserved_key() {
        let err = encode(&declared(&[("uuid", "x")])).unwrap_err();
        assert!(matches!(err, Error::Validation(m) if m.contains("reserved")));
    }

    #[test]
    fn test_encode_rejects_null_and_unknown_values() {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), Attr::Null);
        m.insert("b".to_string(), Attr::Unknown);
        let err = encode(&Attr::Known(m)).unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("property is null: a"));
                assert!(msg.contains("property is unknown: b"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(encode(&Attr::Unknown).is_err());
    }

    #[test]
    fn test_encode_null_is_empty_map() {
        assert!(encode(&Attr::Null).unwrap().is_empty());
    }

    #[test]
    fn test_infer_keeps_non_canonical_numbers_as_strings() {
        assert_eq!(infer("007"), Value::String("007".into()));
        assert_eq!(infer("1.0"), Value::String("1.0".into()));
        assert_eq!(infer("+5"), Value::String("+5".into()));
        assert_eq!(infer("NaN"), Value::String("NaN".into()));
        assert_eq!(infer("-3"), Value::Int(-3));
        assert_eq!(infer("0.5"), Value::Float(0.5));
    }

    #[test]
    fn test_decode_strips_system_key() {
        let mut props = PropertyMap::new();
        props.insert("uuid".into(), Value::from("id"));
        props.insert("foo".into(), Value::Int(100));
        let got = decode(&props, SYSTEM_KEYS, &Attr::Null);
        assert_eq!(got, declared(&[("foo", "100")]));
    }

    #[test]
    fn test_decode_null_versus_empty() {
        let mut props = PropertyMap::new();
        props.insert("uuid".into(), Value::from("id"));
        assert_eq!(decode(&props, SYSTEM_KEYS, &Attr::Null), Attr::Null);
        assert_eq!(
            decode(&props, SYSTEM_KEYS, &Attr::Known(BTreeMap::new())),
            Attr::Known(BTreeMap::new())
        );
    }

    #[test]
    fn test_canonical_renders_lists() {
        let v = Value::List(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(canonical(&v), "[1, a]");
        assert_eq!(canonical(&Value::Bool(true)), "true");
    }

    #[test]
    fn test_labels_validation() {
        let labels: DeclaredLabels = Attr::Known(vec![Attr::known("a"), Attr::Null, Attr::known(""), Attr::known("a")]);
        let err = encode_labels(&labels).unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("label 1 is null"));
                assert!(msg.contains("label 2 is empty"));
                assert!(msg.contains("label 3 is a duplicate: a"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(encode_labels(&Attr::Null).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_decode_labels_keeps_declared_order() {
        let prior: DeclaredLabels = Attr::Known(vec![Attr::known("foo"), Attr::known("bar")]);
        let got = decode_labels(&["bar".into(), "baz".into(), "foo".into()], &prior);
        assert_eq!(
            got,
            Attr::Known(vec![Attr::known("foo"), Attr::known("bar"), Attr::known("baz")])
        );
    }

    #[test]
    fn test_decode_labels_null_versus_empty() {
        assert_eq!(decode_labels(&[], &Attr::Null), Attr::Null);
        assert_eq!(decode_labels(&[], &Attr::Known(vec![])), Attr::Known(vec![]));
    }
}
