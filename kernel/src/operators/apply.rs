//! `apply_effects()`: the single entry point for producing a successor fact set.
//!
//! The successor of `s` under effects `(add, delete)` is `(s ∪ add) − delete`.
//! A fact listed in both `add` and `delete` is therefore absent afterwards.
//! Both the grounded and the lifted path funnel through here, so effect
//! semantics cannot drift between modes.

use std::borrow::Cow;

use crate::carrier::fact::FactId;
use crate::carrier::state::{State, StateBuilder};

/// Ground add and delete lists of one applicable action.
///
/// Borrowed for grounded actions, owned for lifted ones (instantiated on
/// demand).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDelta<'a> {
    pub add: Cow<'a, [FactId]>,
    pub delete: Cow<'a, [FactId]>,
}

impl<'a> EffectDelta<'a> {
    #[must_use]
    pub fn borrowed(add: &'a [FactId], delete: &'a [FactId]) -> Self {
        Self {
            add: Cow::Borrowed(add),
            delete: Cow::Borrowed(delete),
        }
    }

    #[must_use]
    pub fn owned(add: Vec<FactId>, delete: Vec<FactId>) -> Self {
        Self {
            add: Cow::Owned(add),
            delete: Cow::Owned(delete),
        }
    }

    /// Whether applying the delta to `state` would leave it unchanged.
    #[must_use]
    pub fn is_noop_on(&self, state: &State) -> bool {
        let deleted = |f: &FactId| self.delete.contains(f);
        self.add.iter().all(|f| state.contains(*f) && !deleted(f))
            && self.delete.iter().all(|f| !state.contains(*f))
    }
}

/// Compute `(state ∪ add) − delete` as a builder ready for interning.
#[must_use]
pub fn apply_effects(state: &State, delta: &EffectDelta<'_>) -> StateBuilder {
    let mut builder = StateBuilder::from_state(state);
    for fact in delta.add.iter() {
        builder.insert(*fact);
    }
    for fact in delta.delete.iter() {
        builder.remove(*fact);
    }
    builder
}

/// Whether `positive ⊆ state` and `negative ∩ state = ∅`.
#[must_use]
pub fn preconditions_hold(state: &State, positive: &[FactId], negative: &[FactId]) -> bool {
    state.contains_all(positive) && state.contains_none(negative)
}
