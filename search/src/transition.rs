//! Applicable actions and the transitions built from them.

use lodestar_kernel::carrier::fact::{FactTable, GroundAtom};
use lodestar_kernel::carrier::repository::StateHandle;
use lodestar_kernel::operators::apply::EffectDelta;
use lodestar_kernel::operators::ground_action::{GroundActionId, GroundActionV1};
use lodestar_kernel::operators::schema::{ActionSchemaV1, AtomPattern, Binding, SchemaId};

use crate::error::SuccessorError;

/// Owned, hashable reference to the action behind a transition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionRefV1 {
    Grounded(GroundActionId),
    Lifted { schema: SchemaId, binding: Binding },
}

/// One outgoing edge: `action` leads to `successor` at `cost`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionV1 {
    pub action: ActionRefV1,
    pub successor: StateHandle,
    pub cost: u32,
}

/// An action found applicable in some state.
///
/// Borrows the generator's immutable action table or schema list. A lifted
/// binding lives only as long as this value unless it is turned into an
/// [`ActionRefV1`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicableActionV1<'a> {
    Grounded {
        id: GroundActionId,
        action: &'a GroundActionV1,
    },
    Lifted {
        id: SchemaId,
        schema: &'a ActionSchemaV1,
        binding: Binding,
    },
}

impl<'a> ApplicableActionV1<'a> {
    #[must_use]
    pub fn action_ref(&self) -> ActionRefV1 {
        match self {
            Self::Grounded { id, .. } => ActionRefV1::Grounded(*id),
            Self::Lifted { id, binding, .. } => ActionRefV1::Lifted {
                schema: *id,
                binding: binding.clone(),
            },
        }
    }

    #[must_use]
    pub fn into_action_ref(self) -> ActionRefV1 {
        match self {
            Self::Grounded { id, .. } => ActionRefV1::Grounded(id),
            Self::Lifted { id, binding, .. } => ActionRefV1::Lifted {
                schema: id,
                binding,
            },
        }
    }

    #[must_use]
    pub fn cost(&self) -> u32 {
        match self {
            Self::Grounded { action, .. } => action.cost,
            Self::Lifted { schema, .. } => schema.cost,
        }
    }

    /// Ground add and delete facts of this action.
    ///
    /// Grounded actions borrow their lists. Lifted add effects are interned
    /// into `facts`; lifted delete atoms that were never interned cannot be
    /// in any state and are skipped.
    ///
    /// # Errors
    ///
    /// - [`SuccessorError::MalformedSchema`] if an effect pattern does not
    ///   instantiate under the binding.
    /// - [`SuccessorError::HandleSpaceExhausted`] if the fact table is full.
    pub fn effect_delta(&self, facts: &FactTable) -> Result<EffectDelta<'a>, SuccessorError> {
        match self {
            Self::Grounded { action, .. } => {
                let action: &'a GroundActionV1 = *action;
                Ok(EffectDelta::borrowed(
                    &action.add_effects,
                    &action.delete_effects,
                ))
            }
            Self::Lifted {
                schema, binding, ..
            } => {
                let mut add = Vec::with_capacity(schema.add_effects.len());
                for pattern in &schema.add_effects {
                    add.push(facts.intern(instantiate(schema, pattern, binding)?)?);
                }
                let mut delete = Vec::with_capacity(schema.delete_effects.len());
                for pattern in &schema.delete_effects {
                    if let Some(fact) = facts.get(&instantiate(schema, pattern, binding)?) {
                        delete.push(fact);
                    }
                }
                Ok(EffectDelta::owned(add, delete))
            }
        }
    }
}

fn instantiate(
    schema: &ActionSchemaV1,
    pattern: &AtomPattern,
    binding: &Binding,
) -> Result<GroundAtom, SuccessorError> {
    pattern
        .instantiate(binding)
        .ok_or_else(|| SuccessorError::MalformedSchema {
            schema: schema.name.clone(),
            detail: format!(
                "binding of {} objects does not cover every effect parameter",
                binding.len()
            ),
        })
}
