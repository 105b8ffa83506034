//! Proof module: canonical JSON and domain-separated hashing.
//!
//! Depends on nothing internal. `carrier` and `operators` use it for
//! fingerprints and digests.

pub mod canon;
pub mod hash;
