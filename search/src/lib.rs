//! Lodestar Search: applicable-action and successor generation.
//!
//! This crate turns a [`PlanningTaskV1`](lodestar_kernel::task::PlanningTaskV1)
//! into transitions over interned states. It depends only on
//! `lodestar_kernel`.
//!
//! # Crate dependency graph
//!
//! ```text
//! lodestar_kernel  ←  lodestar_search
//! (facts, states,     (generators, grounding,
//!  actions, tasks)     successor iteration)
//! ```
//!
//! # Key types
//!
//! - [`SuccessorGenerator`]: successors of a state handle
//! - [`ApplicableActionGenerator`]: grounded or lifted matching, chosen by config
//! - [`ApplicableActionsV1`]: the trait both generators implement
//! - [`GeneratorConfigV1`]: mode, state encoding and fact capacity
//! - [`TransitionV1`]: one `(action, successor, cost)` triple

#![forbid(unsafe_code)]

pub mod config;
pub mod contract;
pub mod error;
pub mod generator;
pub mod grounded;
pub mod grounding;
pub mod lifted;
mod matcher;
pub mod successor;
pub mod transition;

pub use config::{GeneratorConfigV1, GeneratorModeV1, GroundedMatchV1};
pub use contract::ApplicableActionsV1;
pub use error::SuccessorError;
pub use generator::{AnyApplicable, ApplicableActionGenerator};
pub use grounding::ground_task;
pub use successor::{SuccessorGenerator, Successors};
pub use transition::{ActionRefV1, ApplicableActionV1, TransitionV1};
