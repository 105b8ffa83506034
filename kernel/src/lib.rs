//! Lodestar Kernel: facts, canonical states, and action representations.
//!
//! # API Surface
//!
//! - [`carrier::repository::StateRepository`] -- canonical, deduplicating
//!   state pool handing out copyable [`carrier::repository::StateHandle`]s
//! - [`operators::apply::apply_effects`] -- the single effect-application
//!   entry point, `(s ∪ add) − delete`
//! - [`task::PlanningTaskV1`] -- grounded or lifted task input
//!
//! # Module Dependency Direction
//!
//! `proof` ← `carrier` ← `operators` ← `task`
//!
//! One-way only. No cycles. `proof` depends on nothing internal.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod carrier;
pub mod operators;
pub mod proof;
pub mod task;
