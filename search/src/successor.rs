//! `SuccessorGenerator`: the interface a search loop consumes.
//!
//! # Contract
//!
//! - `successors(h)` resolves `h` first; an unknown handle fails before any
//!   transition is produced.
//! - For every applicable action, in generator order, the successor fact
//!   set is `(facts(h) ∪ add) − delete`, interned through the repository.
//!   The repository is the only place states are deduplicated: two actions
//!   reaching the same fact set get the same handle.
//! - Self-loops and previously seen states are emitted; loop detection is
//!   the caller's job.
//! - Items are `Result`s because interning can fail (capacity, id space).
//!   The iterator stops after the first error. [`expand`] collects
//!   all-or-nothing.
//!
//! Nothing is cached between calls; the repository and (in lifted mode) the
//! append-only fact table are the only shared mutable state, so distinct
//! states can be expanded from several threads at once.
//!
//! [`expand`]: SuccessorGenerator::expand

use std::sync::Arc;

use lodestar_kernel::carrier::repository::{StateHandle, StateRepository};
use lodestar_kernel::carrier::state::State;
use lodestar_kernel::operators::apply::apply_effects;
use lodestar_kernel::task::PlanningTaskV1;

use crate::config::GeneratorConfigV1;
use crate::contract::ApplicableActionsV1;
use crate::error::SuccessorError;
use crate::generator::{AnyApplicable, ApplicableActionGenerator};
use crate::transition::{ActionRefV1, ApplicableActionV1, TransitionV1};

#[derive(Debug)]
pub struct SuccessorGenerator {
    generator: ApplicableActionGenerator,
}

impl SuccessorGenerator {
    #[must_use]
    pub const fn new(generator: ApplicableActionGenerator) -> Self {
        Self { generator }
    }

    /// Build a generator and a fresh repository sized by `config`.
    ///
    /// # Errors
    ///
    /// As [`ApplicableActionGenerator::from_task`].
    pub fn from_task(
        task: impl Into<PlanningTaskV1>,
        config: &GeneratorConfigV1,
    ) -> Result<Self, SuccessorError> {
        config.validate()?;
        let repository = Arc::new(StateRepository::new(config.encoding, config.max_facts));
        Self::with_repository(task, repository, config)
    }

    /// Build a generator over an existing repository.
    ///
    /// # Errors
    ///
    /// As [`ApplicableActionGenerator::from_task`].
    pub fn with_repository(
        task: impl Into<PlanningTaskV1>,
        repository: Arc<StateRepository>,
        config: &GeneratorConfigV1,
    ) -> Result<Self, SuccessorError> {
        let generator = ApplicableActionGenerator::from_task(task.into(), repository, config)?;
        Ok(Self::new(generator))
    }

    #[must_use]
    pub fn generator(&self) -> &ApplicableActionGenerator {
        &self.generator
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<StateRepository> {
        self.generator.repository()
    }

    #[must_use]
    pub fn initial_state(&self) -> StateHandle {
        self.generator.initial_state()
    }

    /// # Errors
    ///
    /// Returns [`SuccessorError::InvalidHandle`] for foreign handles.
    pub fn applicable_actions(
        &self,
        state: StateHandle,
    ) -> Result<AnyApplicable<'_>, SuccessorError> {
        self.generator.applicable_actions(state)
    }

    /// Lazy transitions out of `state`.
    ///
    /// # Errors
    ///
    /// Returns [`SuccessorError::InvalidHandle`] for foreign handles.
    pub fn successors(&self, state: StateHandle) -> Result<Successors<'_>, SuccessorError> {
        let actions = self.generator.applicable_actions(state)?;
        let state = self.repository().resolve(state)?;
        Ok(Successors {
            owner: self,
            state,
            actions,
            failed: false,
        })
    }

    /// Every transition out of `state`, or the first error.
    ///
    /// # Errors
    ///
    /// As [`successors`](Self::successors), plus any error raised while
    /// interning a successor.
    pub fn expand(&self, state: StateHandle) -> Result<Vec<TransitionV1>, SuccessorError> {
        self.successors(state)?.collect()
    }

    /// Apply one applicable action to `state`.
    ///
    /// # Errors
    ///
    /// - [`SuccessorError::InvalidHandle`] for foreign handles.
    /// - [`SuccessorError::CapacityExceeded`] /
    ///   [`SuccessorError::HandleSpaceExhausted`] from interning.
    pub fn successor(
        &self,
        state: StateHandle,
        action: &ApplicableActionV1<'_>,
    ) -> Result<TransitionV1, SuccessorError> {
        let state = self.repository().resolve(state)?;
        self.transition(&state, action.clone())
    }

    /// Human-readable action name, e.g. `move(room1, room2)`.
    #[must_use]
    pub fn describe_action(&self, action: &ActionRefV1) -> Option<String> {
        self.generator.describe(action)
    }

    /// Rendered fluent atoms of `state`, ascending by fact id.
    ///
    /// # Errors
    ///
    /// Returns [`SuccessorError::InvalidHandle`] for foreign handles.
    pub fn describe_state(&self, state: StateHandle) -> Result<Vec<String>, SuccessorError> {
        let state = self.repository().resolve(state)?;
        let vocabulary = self.generator.vocabulary();
        Ok(self
            .generator
            .facts()
            .atoms_of(state.facts())
            .iter()
            .map(|(_, atom)| vocabulary.display_atom(atom))
            .collect())
    }

    fn transition(
        &self,
        state: &State,
        action: ApplicableActionV1<'_>,
    ) -> Result<TransitionV1, SuccessorError> {
        let delta = action.effect_delta(self.generator.facts())?;
        let successor = self
            .repository()
            .get_or_create(apply_effects(state, &delta))?;
        Ok(TransitionV1 {
            cost: action.cost(),
            action: action.into_action_ref(),
            successor,
        })
    }
}

/// Iterator returned by [`SuccessorGenerator::successors`].
pub struct Successors<'a> {
    owner: &'a SuccessorGenerator,
    state: Arc<State>,
    actions: AnyApplicable<'a>,
    failed: bool,
}

impl Iterator for Successors<'_> {
    type Item = Result<TransitionV1, SuccessorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let action = self.actions.next()?;
        let item = self.owner.transition(&self.state, action);
        self.failed = item.is_err();
        Some(item)
    }
}
