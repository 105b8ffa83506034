//! Closed dispatch over the two applicable-action generators.
//!
//! The variant is chosen at runtime from [`GeneratorConfigV1::mode`]:
//!
//! | task \ mode | `Grounded` | `Lifted` |
//! |-------------|------------|----------|
//! | grounded    | as is      | `UnsupportedConfig` |
//! | lifted      | grounding pass, then grounded | as is |

use std::sync::Arc;

use lodestar_kernel::carrier::fact::{FactTable, VocabularyV1};
use lodestar_kernel::carrier::repository::{StateHandle, StateRepository};
use lodestar_kernel::task::PlanningTaskV1;

use crate::config::{GeneratorConfigV1, GeneratorModeV1};
use crate::contract::ApplicableActionsV1;
use crate::error::SuccessorError;
use crate::grounded::{GroundedAag, GroundedApplicable};
use crate::grounding::ground_task;
use crate::lifted::{LiftedAag, LiftedApplicable};
use crate::transition::{ActionRefV1, ApplicableActionV1};

#[derive(Debug)]
pub enum ApplicableActionGenerator {
    Grounded(GroundedAag),
    Lifted(LiftedAag),
}

impl ApplicableActionGenerator {
    /// Build the generator `config` selects for `task`.
    ///
    /// # Errors
    ///
    /// - [`SuccessorError::UnsupportedConfig`] if `config` is invalid, if a
    ///   grounded task is run in lifted mode, or if `repository` uses a
    ///   different encoding than `config`.
    /// - Any construction error of the selected generator.
    pub fn from_task(
        task: PlanningTaskV1,
        repository: Arc<StateRepository>,
        config: &GeneratorConfigV1,
    ) -> Result<Self, SuccessorError> {
        config.validate()?;
        if repository.encoding() != config.encoding {
            return Err(SuccessorError::UnsupportedConfig {
                detail: format!(
                    "repository stores {} states, config asks for {}",
                    repository.encoding().as_str(),
                    config.encoding.as_str()
                ),
            });
        }
        match (config.mode, task) {
            (GeneratorModeV1::Grounded, PlanningTaskV1::Grounded(task)) => Ok(Self::Grounded(
                GroundedAag::new(task, repository, config.grounded_match)?,
            )),
            (GeneratorModeV1::Grounded, PlanningTaskV1::Lifted(task)) => {
                let grounded = ground_task(&task)?;
                Ok(Self::Grounded(GroundedAag::new(
                    grounded,
                    repository,
                    config.grounded_match,
                )?))
            }
            (GeneratorModeV1::Lifted, PlanningTaskV1::Lifted(task)) => {
                Ok(Self::Lifted(LiftedAag::new(task, repository)?))
            }
            (GeneratorModeV1::Lifted, PlanningTaskV1::Grounded(_)) => {
                Err(SuccessorError::UnsupportedConfig {
                    detail: "a grounded task has no schemas to match in lifted mode".into(),
                })
            }
        }
    }

    #[must_use]
    pub const fn mode(&self) -> GeneratorModeV1 {
        match self {
            Self::Grounded(_) => GeneratorModeV1::Grounded,
            Self::Lifted(_) => GeneratorModeV1::Lifted,
        }
    }
}

/// Iterator returned by [`ApplicableActionGenerator::applicable_actions`].
pub enum AnyApplicable<'a> {
    Grounded(GroundedApplicable<'a>),
    Lifted(LiftedApplicable<'a>),
}

impl<'a> Iterator for AnyApplicable<'a> {
    type Item = ApplicableActionV1<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Grounded(iter) => iter.next(),
            Self::Lifted(iter) => iter.next(),
        }
    }
}

impl ApplicableActionsV1 for ApplicableActionGenerator {
    type Iter<'a> = AnyApplicable<'a>;

    fn repository(&self) -> &Arc<StateRepository> {
        match self {
            Self::Grounded(aag) => aag.repository(),
            Self::Lifted(aag) => aag.repository(),
        }
    }

    fn facts(&self) -> &Arc<FactTable> {
        match self {
            Self::Grounded(aag) => aag.facts(),
            Self::Lifted(aag) => aag.facts(),
        }
    }

    fn vocabulary(&self) -> &Arc<VocabularyV1> {
        match self {
            Self::Grounded(aag) => aag.vocabulary(),
            Self::Lifted(aag) => aag.vocabulary(),
        }
    }

    fn initial_state(&self) -> StateHandle {
        match self {
            Self::Grounded(aag) => aag.initial_state(),
            Self::Lifted(aag) => aag.initial_state(),
        }
    }

    fn applicable_actions(&self, state: StateHandle) -> Result<AnyApplicable<'_>, SuccessorError> {
        Ok(match self {
            Self::Grounded(aag) => AnyApplicable::Grounded(aag.applicable_actions(state)?),
            Self::Lifted(aag) => AnyApplicable::Lifted(aag.applicable_actions(state)?),
        })
    }

    fn describe(&self, action: &ActionRefV1) -> Option<String> {
        match self {
            Self::Grounded(aag) => aag.describe(action),
            Self::Lifted(aag) => aag.describe(action),
        }
    }
}
