//! `GroundActionTableV1`: the immutable catalog of fully instantiated actions.
//!
//! Maps dense [`GroundActionId`]s to [`GroundActionV1`] entries. Fact lists
//! are normalized (sorted, deduplicated) when the table is built, so the
//! canonical JSON snapshot and digest do not depend on how the grounding
//! pass happened to order them.

use std::fmt;

use crate::carrier::fact::FactId;
use crate::operators::schema::{Binding, SchemaId};
use crate::proof::canon::{canonical_json_bytes, CanonError};
use crate::proof::hash::{canonical_hash, ContentHash, DOMAIN_ACTION_TABLE};

/// Dense identifier of a grounded action within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroundActionId(u32);

impl GroundActionId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The schema and binding a grounded action was instantiated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionOrigin {
    pub schema: SchemaId,
    pub binding: Binding,
}

/// A fully instantiated operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundActionV1 {
    /// Human-readable name, e.g. `move(room1, room2)`. Diagnostic only.
    pub name: String,
    /// Facts that must hold.
    pub precondition: Vec<FactId>,
    /// Facts that must not hold.
    pub negative_precondition: Vec<FactId>,
    pub add_effects: Vec<FactId>,
    pub delete_effects: Vec<FactId>,
    /// Non-negative integer cost. Defaults to 1.
    pub cost: u32,
    pub origin: Option<ActionOrigin>,
}

impl GroundActionV1 {
    /// A unit-cost action with no preconditions or effects.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            precondition: Vec::new(),
            negative_precondition: Vec::new(),
            add_effects: Vec::new(),
            delete_effects: Vec::new(),
            cost: 1,
            origin: None,
        }
    }

    #[must_use]
    pub fn with_precondition(mut self, facts: impl IntoIterator<Item = FactId>) -> Self {
        self.precondition.extend(facts);
        self
    }

    #[must_use]
    pub fn with_negative_precondition(mut self, facts: impl IntoIterator<Item = FactId>) -> Self {
        self.negative_precondition.extend(facts);
        self
    }

    #[must_use]
    pub fn with_add(mut self, facts: impl IntoIterator<Item = FactId>) -> Self {
        self.add_effects.extend(facts);
        self
    }

    #[must_use]
    pub fn with_delete(mut self, facts: impl IntoIterator<Item = FactId>) -> Self {
        self.delete_effects.extend(facts);
        self
    }

    #[must_use]
    pub const fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, schema: SchemaId, binding: Binding) -> Self {
        self.origin = Some(ActionOrigin { schema, binding });
        self
    }

    /// Every fact id the action mentions.
    pub fn mentioned_facts(&self) -> impl Iterator<Item = FactId> + '_ {
        self.precondition
            .iter()
            .chain(&self.negative_precondition)
            .chain(&self.add_effects)
            .chain(&self.delete_effects)
            .copied()
    }

    fn normalize(&mut self) {
        for list in [
            &mut self.precondition,
            &mut self.negative_precondition,
            &mut self.add_effects,
            &mut self.delete_effects,
        ] {
            list.sort_unstable();
            list.dedup();
        }
    }
}

/// Error type for action table construction and serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTableError {
    /// More than `u32::MAX` actions.
    TooManyActions { count: usize },
    /// Canonical JSON serialization failed.
    CanonicalizationError { detail: String },
}

impl fmt::Display for ActionTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyActions { count } => {
                write!(f, "action table holds {count} actions, more than u32 ids allow")
            }
            Self::CanonicalizationError { detail } => {
                write!(f, "action table canonicalization failed: {detail}")
            }
        }
    }
}

impl std::error::Error for ActionTableError {}

impl From<CanonError> for ActionTableError {
    fn from(e: CanonError) -> Self {
        Self::CanonicalizationError {
            detail: e.to_string(),
        }
    }
}

/// The grounded action catalog. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundActionTableV1 {
    actions: Vec<GroundActionV1>,
}

impl GroundActionTableV1 {
    /// Build a table; ids follow the order of `actions`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionTableError::TooManyActions`] beyond `u32::MAX` entries.
    pub fn new(mut actions: Vec<GroundActionV1>) -> Result<Self, ActionTableError> {
        if u32::try_from(actions.len()).is_err() {
            return Err(ActionTableError::TooManyActions {
                count: actions.len(),
            });
        }
        for action in &mut actions {
            action.normalize();
        }
        Ok(Self { actions })
    }

    #[must_use]
    pub fn get(&self, id: GroundActionId) -> Option<&GroundActionV1> {
        self.actions.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// `(id, action)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (GroundActionId, &GroundActionV1)> {
        self.actions
            .iter()
            .enumerate()
            .filter_map(|(i, a)| u32::try_from(i).ok().map(|raw| (GroundActionId(raw), a)))
    }

    /// Canonical JSON bytes of the whole table.
    ///
    /// # Errors
    ///
    /// Returns [`ActionTableError::CanonicalizationError`] if serialization fails.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ActionTableError> {
        let actions: Vec<serde_json::Value> = self.actions.iter().map(action_to_json).collect();
        let value = serde_json::json!({
            "actions": actions,
            "schema_version": "ground_action_table.v1",
        });
        Ok(canonical_json_bytes(&value)?)
    }

    /// Content hash of [`canonical_bytes`](Self::canonical_bytes).
    ///
    /// # Errors
    ///
    /// Same as [`canonical_bytes`](Self::canonical_bytes).
    pub fn digest(&self) -> Result<ContentHash, ActionTableError> {
        Ok(canonical_hash(DOMAIN_ACTION_TABLE, &self.canonical_bytes()?))
    }
}

fn facts_to_json(facts: &[FactId]) -> serde_json::Value {
    facts.iter().map(|f| u64::from(f.as_u32())).collect()
}

fn action_to_json(action: &GroundActionV1) -> serde_json::Value {
    serde_json::json!({
        "add_effects": facts_to_json(&action.add_effects),
        "cost": u64::from(action.cost),
        "delete_effects": facts_to_json(&action.delete_effects),
        "name": action.name,
        "negative_precondition": facts_to_json(&action.negative_precondition),
        "precondition": facts_to_json(&action.precondition),
    })
}
