//! Shared fixtures for the lock tests, the fixture binary and the
//! benchmarks.
//!
//! - [`fixtures`]: planning tasks with known state spaces
//! - [`state_space`]: breadth-first exploration and a process-independent
//!   digest of the explored graph

pub mod fixtures;
pub mod state_space;
