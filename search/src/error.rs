//! Typed successor-generation errors.
//!
//! Every variant is a programmer or configuration error detected close to
//! its source. None is retried; a failing `expand` produces no transitions.

use lodestar_kernel::carrier::fact::FactTableError;
use lodestar_kernel::carrier::repository::{RepositoryError, StateHandle};
use lodestar_kernel::carrier::state::StateError;
use lodestar_kernel::operators::ground_action::ActionTableError;
use lodestar_kernel::operators::schema::SchemaError;
use lodestar_kernel::task::TaskError;

use crate::config::ConfigError;

/// Typed failure for generator construction and successor queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessorError {
    /// The handle was not issued by the repository this generator uses.
    InvalidHandle { handle: StateHandle },
    /// A lifted schema references something it does not declare.
    MalformedSchema { schema: String, detail: String },
    /// A state (or the worst case of the task) needs more facts than
    /// `max_facts` allows.
    CapacityExceeded { detail: String },
    /// The repository or fact table ran out of `u32` ids.
    HandleSpaceExhausted,
    /// The configuration cannot be honored for this task.
    UnsupportedConfig { detail: String },
    /// The task input is inconsistent.
    InvalidTask { detail: String },
}

impl std::fmt::Display for SuccessorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHandle { handle } => {
                write!(f, "invalid state handle {handle}")
            }
            Self::MalformedSchema { schema, detail } => {
                write!(f, "malformed action schema `{schema}`: {detail}")
            }
            Self::CapacityExceeded { detail } => write!(f, "capacity exceeded: {detail}"),
            Self::HandleSpaceExhausted => write!(f, "id space exhausted"),
            Self::UnsupportedConfig { detail } => write!(f, "unsupported configuration: {detail}"),
            Self::InvalidTask { detail } => write!(f, "invalid task: {detail}"),
        }
    }
}

impl std::error::Error for SuccessorError {}

impl From<RepositoryError> for SuccessorError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::InvalidHandle { handle } => Self::InvalidHandle { handle },
            RepositoryError::CapacityExceeded { .. } => Self::CapacityExceeded {
                detail: e.to_string(),
            },
            RepositoryError::HandleSpaceExhausted => Self::HandleSpaceExhausted,
        }
    }
}

impl From<StateError> for SuccessorError {
    fn from(e: StateError) -> Self {
        RepositoryError::from(e).into()
    }
}

impl From<SchemaError> for SuccessorError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::MalformedSchema { schema, detail } => {
                Self::MalformedSchema { schema, detail }
            }
        }
    }
}

impl From<FactTableError> for SuccessorError {
    fn from(e: FactTableError) -> Self {
        match e {
            FactTableError::IdSpaceExhausted => Self::HandleSpaceExhausted,
        }
    }
}

impl From<TaskError> for SuccessorError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::FactSpaceExhausted => Self::HandleSpaceExhausted,
            other => Self::InvalidTask {
                detail: other.to_string(),
            },
        }
    }
}

impl From<ActionTableError> for SuccessorError {
    fn from(e: ActionTableError) -> Self {
        Self::InvalidTask {
            detail: e.to_string(),
        }
    }
}

impl From<ConfigError> for SuccessorError {
    fn from(e: ConfigError) -> Self {
        Self::UnsupportedConfig {
            detail: e.to_string(),
        }
    }
}
