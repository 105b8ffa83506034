//! Operators module: grounded actions, lifted schemas, and `apply_effects()`.
//!
//! Depends on `carrier` and `proof`. Does not import from `task`.
pub mod apply;
pub mod ground_action;
pub mod schema;
