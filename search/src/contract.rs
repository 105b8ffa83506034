//! Applicable-action generator contract trait.

use std::sync::Arc;

use lodestar_kernel::carrier::fact::{FactTable, VocabularyV1};
use lodestar_kernel::carrier::repository::{StateHandle, StateRepository};

use crate::error::SuccessorError;
use crate::transition::{ActionRefV1, ApplicableActionV1};

/// Capability shared by the grounded and lifted generators.
///
/// # Contract
///
/// - `applicable_actions` resolves the handle through [`repository`]
///   before yielding anything; a handle the repository does not own fails
///   with [`SuccessorError::InvalidHandle`].
/// - The iterator holds its own snapshot of the state and is recomputed on
///   every call. Same `(handle, generator)` → same actions in the same order.
/// - Every yielded action is applicable in the state; every applicable
///   action is yielded exactly once.
///
/// [`repository`]: ApplicableActionsV1::repository
pub trait ApplicableActionsV1 {
    type Iter<'a>: Iterator<Item = ApplicableActionV1<'a>>
    where
        Self: 'a;

    /// Repository states are resolved against and successors are interned in.
    fn repository(&self) -> &Arc<StateRepository>;

    /// Fact table shared with the task.
    fn facts(&self) -> &Arc<FactTable>;

    fn vocabulary(&self) -> &Arc<VocabularyV1>;

    /// Handle of the task's initial state (fluent facts only).
    fn initial_state(&self) -> StateHandle;

    /// Actions applicable in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`SuccessorError::InvalidHandle`] for handles not owned by
    /// [`repository`](Self::repository).
    fn applicable_actions(&self, state: StateHandle) -> Result<Self::Iter<'_>, SuccessorError>;

    /// Human-readable name of `action`, e.g. `move(room1, room2)`.
    /// `None` if the action does not belong to this generator.
    fn describe(&self, action: &ActionRefV1) -> Option<String>;
}
