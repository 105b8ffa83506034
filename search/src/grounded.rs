//! Grounded applicable-action generator.
//!
//! Built once from a [`GroundTaskV1`]. Static facts (facts no action adds or
//! deletes) are resolved here and never reach a state: an action whose
//! static preconditions fail against the initial static facts is pruned,
//! and the static preconditions of surviving actions are dropped from the
//! per-state check.
//!
//! # Strategies
//!
//! - [`GroundedMatchV1::InvertedIndex`]: `by_fact[f]` lists the actions
//!   requiring fluent fact `f`. A query walks the state's facts, counts
//!   satisfied positive preconditions per action, and only checks negative
//!   preconditions for actions whose count is complete.
//! - [`GroundedMatchV1::NaiveScan`]: tests every surviving action.
//!   O(actions × preconditions) per query.
//!
//! Both yield applicable actions in ascending [`GroundActionId`] order.

use std::collections::BTreeSet;
use std::sync::Arc;

use lodestar_kernel::carrier::fact::{FactId, FactTable, VocabularyV1};
use lodestar_kernel::carrier::repository::{StateHandle, StateRepository};
use lodestar_kernel::carrier::state::State;
use lodestar_kernel::operators::apply::preconditions_hold;
use lodestar_kernel::operators::ground_action::{GroundActionId, GroundActionTableV1};
use lodestar_kernel::task::GroundTaskV1;

use crate::config::GroundedMatchV1;
use crate::contract::ApplicableActionsV1;
use crate::error::SuccessorError;
use crate::transition::{ActionRefV1, ApplicableActionV1};

/// A surviving action with its static preconditions stripped.
#[derive(Debug, Clone)]
struct IndexedAction {
    id: GroundActionId,
    positive: Vec<FactId>,
    negative: Vec<FactId>,
}

#[derive(Debug)]
pub struct GroundedAag {
    task: GroundTaskV1,
    repository: Arc<StateRepository>,
    strategy: GroundedMatchV1,
    /// Ascending by action id.
    indexed: Vec<IndexedAction>,
    /// Fluent fact index → positions in `indexed` requiring it.
    by_fact: Vec<Vec<u32>>,
    /// Positions in `indexed` with no positive fluent precondition.
    unconditional: Vec<u32>,
    initial: StateHandle,
}

impl GroundedAag {
    /// Index `task` and intern its initial state into `repository`.
    ///
    /// # Errors
    ///
    /// - [`SuccessorError::CapacityExceeded`] if a fluent fact id does not
    ///   fit the repository's capacity.
    /// - [`SuccessorError::HandleSpaceExhausted`] if the repository is full.
    pub fn new(
        task: GroundTaskV1,
        repository: Arc<StateRepository>,
        strategy: GroundedMatchV1,
    ) -> Result<Self, SuccessorError> {
        let fluent = task.fluent_facts();
        if let Some(max) = fluent.last() {
            if max.index() >= repository.capacity() {
                return Err(SuccessorError::CapacityExceeded {
                    detail: format!(
                        "fluent fact {} does not fit a state capacity of {} facts",
                        max.as_u32(),
                        repository.capacity()
                    ),
                });
            }
        }
        let static_true: BTreeSet<FactId> = task
            .initial()
            .iter()
            .copied()
            .filter(|f| !fluent.contains(f))
            .collect();

        let mut indexed = Vec::with_capacity(task.actions().len());
        let mut pruned = 0usize;
        for (id, action) in task.actions().iter() {
            let statics_hold = action
                .precondition
                .iter()
                .filter(|f| !fluent.contains(f))
                .all(|f| static_true.contains(f))
                && !action
                    .negative_precondition
                    .iter()
                    .filter(|f| !fluent.contains(f))
                    .any(|f| static_true.contains(f));
            if !statics_hold {
                pruned += 1;
                continue;
            }
            let keep_fluent = |facts: &[FactId]| -> Vec<FactId> {
                facts.iter().copied().filter(|f| fluent.contains(f)).collect()
            };
            indexed.push(IndexedAction {
                id,
                positive: keep_fluent(&action.precondition),
                negative: keep_fluent(&action.negative_precondition),
            });
        }

        let width = fluent.last().map_or(0, |f| f.index() + 1);
        let mut by_fact: Vec<Vec<u32>> = vec![Vec::new(); width];
        let mut unconditional = Vec::new();
        for (pos, entry) in indexed.iter().enumerate() {
            let pos = u32::try_from(pos).map_err(|_| SuccessorError::HandleSpaceExhausted)?;
            if entry.positive.is_empty() {
                unconditional.push(pos);
            }
            for fact in &entry.positive {
                by_fact[fact.index()].push(pos);
            }
        }

        let initial = repository.get_or_create_from_facts(
            task.initial().iter().copied().filter(|f| fluent.contains(f)),
        )?;

        tracing::debug!(
            actions = task.actions().len(),
            pruned,
            fluent_facts = fluent.len(),
            static_facts = static_true.len(),
            strategy = strategy.as_str(),
            "grounded applicable-action index built"
        );

        Ok(Self {
            task,
            repository,
            strategy,
            indexed,
            by_fact,
            unconditional,
            initial,
        })
    }

    #[must_use]
    pub const fn strategy(&self) -> GroundedMatchV1 {
        self.strategy
    }

    #[must_use]
    pub fn actions(&self) -> &GroundActionTableV1 {
        self.task.actions()
    }

    /// Number of actions that survived static pruning.
    #[must_use]
    pub fn indexed_len(&self) -> usize {
        self.indexed.len()
    }

    /// Positions in `indexed` whose positive preconditions all hold.
    fn positive_matches(&self, state: &State) -> Vec<u32> {
        let mut counts = vec![0u32; self.indexed.len()];
        let mut hits = self.unconditional.clone();
        for fact in state.facts() {
            let Some(requiring) = self.by_fact.get(fact.index()) else {
                continue;
            };
            for &pos in requiring {
                let count = &mut counts[pos as usize];
                *count += 1;
                if *count as usize == self.indexed[pos as usize].positive.len() {
                    hits.push(pos);
                }
            }
        }
        hits.sort_unstable();
        hits
    }
}

enum Candidates {
    Matched(std::vec::IntoIter<u32>),
    Scan(std::ops::Range<usize>),
}

/// Lazy iterator over the grounded actions applicable in one state.
pub struct GroundedApplicable<'a> {
    aag: &'a GroundedAag,
    state: Arc<State>,
    candidates: Candidates,
}

impl<'a> Iterator for GroundedApplicable<'a> {
    type Item = ApplicableActionV1<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let aag = self.aag;
        loop {
            let hit = match &mut self.candidates {
                Candidates::Matched(iter) => {
                    let entry = aag.indexed.get(iter.next()? as usize)?;
                    self.state.contains_none(&entry.negative).then_some(entry)
                }
                Candidates::Scan(range) => {
                    let entry = aag.indexed.get(range.next()?)?;
                    preconditions_hold(&self.state, &entry.positive, &entry.negative)
                        .then_some(entry)
                }
            };
            if let Some(entry) = hit {
                return Some(ApplicableActionV1::Grounded {
                    id: entry.id,
                    action: aag.task.actions().get(entry.id)?,
                });
            }
        }
    }
}

impl ApplicableActionsV1 for GroundedAag {
    type Iter<'a> = GroundedApplicable<'a>;

    fn repository(&self) -> &Arc<StateRepository> {
        &self.repository
    }

    fn facts(&self) -> &Arc<FactTable> {
        self.task.facts()
    }

    fn vocabulary(&self) -> &Arc<VocabularyV1> {
        self.task.vocabulary()
    }

    fn initial_state(&self) -> StateHandle {
        self.initial
    }

    fn applicable_actions(&self, state: StateHandle) -> Result<GroundedApplicable<'_>, SuccessorError> {
        let state = self.repository.resolve(state)?;
        let candidates = match self.strategy {
            GroundedMatchV1::InvertedIndex => {
                Candidates::Matched(self.positive_matches(&state).into_iter())
            }
            GroundedMatchV1::NaiveScan => Candidates::Scan(0..self.indexed.len()),
        };
        Ok(GroundedApplicable {
            aag: self,
            state,
            candidates,
        })
    }

    fn describe(&self, action: &ActionRefV1) -> Option<String> {
        match action {
            ActionRefV1::Grounded(id) => self.actions().get(*id).map(|a| a.name.clone()),
            ActionRefV1::Lifted { .. } => None,
        }
    }
}
