//! Shared helpers for lodestar benchmark suites.

use lock_tests::state_space::explore;
use lodestar_kernel::carrier::repository::StateHandle;
use lodestar_kernel::task::LiftedTaskV1;
use lodestar_search::{GeneratorConfigV1, GeneratorModeV1, SuccessorGenerator};

/// A generator plus the states reachable from its initial state.
pub struct ExpansionSetup {
    pub generator: SuccessorGenerator,
    /// Every reachable state, in breadth-first discovery order.
    pub states: Vec<StateHandle>,
}

/// Build a generator for `task` in `mode` and explore its state space once,
/// so benchmarks time only the expansions themselves.
///
/// # Panics
///
/// Panics if construction or exploration fails. Benchmark setup failures
/// are fatal.
#[must_use]
pub fn prepare_expansion_setup(task: LiftedTaskV1, mode: GeneratorModeV1) -> ExpansionSetup {
    let config = GeneratorConfigV1 {
        mode,
        ..GeneratorConfigV1::default()
    };
    let generator = SuccessorGenerator::from_task(task, &config).expect("generator construction");
    let states = explore(&generator, usize::MAX)
        .expect("exploration should succeed in benchmarks")
        .states;
    ExpansionSetup { generator, states }
}

/// Expand every state in `setup` and return the number of transitions.
///
/// # Panics
///
/// Panics if an expansion fails. Benchmark runs are expected to succeed.
#[must_use]
pub fn expand_all(setup: &ExpansionSetup) -> usize {
    setup
        .states
        .iter()
        .map(|h| {
            setup
                .generator
                .expand(*h)
                .expect("expansion should succeed in benchmarks")
                .len()
        })
        .sum()
}
