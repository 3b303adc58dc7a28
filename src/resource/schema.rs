//! Declared resource schema and plan classification.

use super::ResourceModel;

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    StringList,
    StringMap,
}

/// One attribute of a resource schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    /// Set by the resource, never by the declarer.
    pub computed: bool,
    /// A change destroys and recreates the resource.
    pub requires_replace: bool,
    /// Keep the prior value in plans instead of marking it unknown.
    pub use_state_for_unknown: bool,
    /// Regex every value matches.
    pub pattern: Option<&'static str>,
}

impl Attribute {
    fn base(name: &'static str, kind: AttributeType) -> Self {
        Self {
            name,
            kind,
            description: "",
            required: false,
            optional: false,
            computed: false,
            requires_replace: false,
            use_state_for_unknown: false,
            pattern: None,
        }
    }

    pub fn required(name: &'static str, kind: AttributeType) -> Self {
        Self { required: true, ..Self::base(name, kind) }
    }

    pub fn optional(name: &'static str, kind: AttributeType) -> Self {
        Self { optional: true, ..Self::base(name, kind) }
    }

    pub fn computed(name: &'static str, kind: AttributeType) -> Self {
        Self { computed: true, ..Self::base(name, kind) }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn use_state_for_unknown(mut self) -> Self {
        self.use_state_for_unknown = true;
        self
    }

    pub fn pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }
}

/// Schema of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn requires_replace(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.requires_replace)
    }
}

// ============================================================================
// Plan classification
// ============================================================================

/// What applying a desired state to a prior state takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedChange {
    NoOp,
    Create,
    /// In-place update of the listed attributes.
    Update { attributes: Vec<&'static str> },
    /// Destroy-then-recreate, forced by the listed attributes.
    Replace { attributes: Vec<&'static str> },
    Delete,
}

/// Classify the change from `prior` to `desired`.
///
/// Any changed attribute flagged `requires_replace` forces a replacement;
/// in-place updates are only planned when none is involved.
pub fn plan_change<M: ResourceModel>(schema: &Schema, prior: Option<&M>, desired: Option<&M>) -> PlannedChange {
    match (prior, desired) {
        (None, None) => PlannedChange::NoOp,
        (None, Some(_)) => PlannedChange::Create,
        (Some(_), None) => PlannedChange::Delete,
        (Some(prior), Some(desired)) => {
            let changed: Vec<&'static str> = prior
                .changed_attributes(desired)
                .into_iter()
                .filter(|name| !schema.attribute(name).is_some_and(|a| a.computed))
                .collect();
            if changed.is_empty() {
                return PlannedChange::NoOp;
            }
            let forcing: Vec<&'static str> = changed
                .iter()
                .copied()
                .filter(|name| schema.requires_replace(name))
                .collect();
            if forcing.is_empty() {
                PlannedChange::Update { attributes: changed }
            } else {
                PlannedChange::Replace { attributes: forcing }
            }
        }
    }
}
