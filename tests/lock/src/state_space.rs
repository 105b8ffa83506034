//! Breadth-first exploration over a [`SuccessorGenerator`].
//!
//! The digest covers state fingerprints (fact-id content) and action names
//! in discovery order, never handles: handles carry a process-local
//! repository id, fingerprints do not.

use std::collections::{HashMap, VecDeque};

use lodestar_kernel::carrier::repository::StateHandle;
use lodestar_kernel::proof::canon::canonical_json_bytes;
use lodestar_kernel::proof::hash::{canonical_hash, ContentHash};
use lodestar_search::{SuccessorError, SuccessorGenerator, TransitionV1};

/// Domain prefix for explored state-space digests.
pub const DOMAIN_STATE_SPACE: &[u8] = b"LODESTAR::TEST::STATE_SPACE::V1\0";

/// Every state reachable from the initial state, with its out-edges.
#[derive(Debug, Clone)]
pub struct StateSpace {
    /// Handles in discovery order; index 0 is the initial state.
    pub states: Vec<StateHandle>,
    /// `(source index, transition)` in expansion order.
    pub transitions: Vec<(usize, TransitionV1)>,
}

impl StateSpace {
    #[must_use]
    pub fn index_of(&self, handle: StateHandle) -> Option<usize> {
        self.states.iter().position(|h| *h == handle)
    }
}

/// Explore until no new state appears or `limit` states are known.
///
/// # Errors
///
/// Propagates the first [`SuccessorError`] raised by an expansion.
pub fn explore(generator: &SuccessorGenerator, limit: usize) -> Result<StateSpace, SuccessorError> {
    let initial = generator.initial_state();
    let mut seen: HashMap<StateHandle, usize> = HashMap::from([(initial, 0)]);
    let mut states = vec![initial];
    let mut transitions = Vec::new();
    let mut queue = VecDeque::from([initial]);

    while let Some(handle) = queue.pop_front() {
        let source = seen[&handle];
        for transition in generator.successors(handle)? {
            let transition = transition?;
            if !seen.contains_key(&transition.successor) && states.len() < limit {
                seen.insert(transition.successor, states.len());
                states.push(transition.successor);
                queue.push_back(transition.successor);
            }
            transitions.push((source, transition));
        }
    }
    Ok(StateSpace {
        states,
        transitions,
    })
}

/// Rendered fact sets of every explored state, sorted per state.
///
/// # Errors
///
/// Returns [`SuccessorError::InvalidHandle`] if `space` came from another
/// generator.
pub fn rendered_states(
    generator: &SuccessorGenerator,
    space: &StateSpace,
) -> Result<Vec<Vec<String>>, SuccessorError> {
    space
        .states
        .iter()
        .map(|h| {
            let mut atoms = generator.describe_state(*h)?;
            atoms.sort();
            Ok(atoms)
        })
        .collect()
}

/// Content hash of the explored graph.
///
/// # Errors
///
/// Returns [`SuccessorError::InvalidHandle`] if `space` came from another
/// generator.
///
/// # Panics
///
/// Panics if the assembled JSON cannot be canonicalized, which would mean a
/// float slipped into it.
pub fn space_digest(
    generator: &SuccessorGenerator,
    space: &StateSpace,
) -> Result<ContentHash, SuccessorError> {
    let mut fingerprints = Vec::with_capacity(space.states.len());
    for handle in &space.states {
        let state = generator.repository().resolve(*handle)?;
        fingerprints.push(serde_json::json!(state.fingerprint().as_str()));
    }
    let edges: Vec<serde_json::Value> = space
        .transitions
        .iter()
        .map(|(source, t)| {
            serde_json::json!({
                "action": generator.describe_action(&t.action),
                "cost": t.cost,
                "source": source,
                "target": space.index_of(t.successor),
            })
        })
        .collect();
    let value = serde_json::json!({
        "states": fingerprints,
        "transitions": edges,
    });
    let bytes = canonical_json_bytes(&value).expect("integers and strings only");
    Ok(canonical_hash(DOMAIN_STATE_SPACE, &bytes))
}
