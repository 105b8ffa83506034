//! Carrier module: facts, the concurrent interner, states and the state
//! repository.
//!
//! Depends on `proof` for fingerprints. `operators` builds on this layer.

pub mod fact;
pub mod interner;
pub mod repository;
pub mod state;
