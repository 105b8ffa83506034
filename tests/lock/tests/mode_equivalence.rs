//! Cross-mode equivalence lock tests.
//!
//! - INDEX-EQ-SCAN: the inverted index and the naive scan yield the same
//!   actions in the same order.
//! - GROUNDED-EQ-LIFTED: grounding a lifted task and matching it lifted
//!   explore the same graph in the same order.
//! - DENSE-EQ-SPARSE: state encoding never changes fingerprints.

use lock_tests::fixtures::{grounded_config, gripper, lifted_config, robot_rooms};
use lock_tests::state_space::{explore, rendered_states, space_digest, StateSpace};
use lodestar_kernel::carrier::state::StateEncodingV1;
use lodestar_kernel::task::LiftedTaskV1;
use lodestar_search::{ground_task, GeneratorModeV1, GroundedMatchV1, SuccessorGenerator};

/// `(source, action name, target, cost)` per explored transition.
fn transcript(
    generator: &SuccessorGenerator,
    space: &StateSpace,
) -> Vec<(usize, String, Option<usize>, u32)> {
    space
        .transitions
        .iter()
        .map(|(source, t)| {
            (
                *source,
                generator.describe_action(&t.action).unwrap(),
                space.index_of(t.successor),
                t.cost,
            )
        })
        .collect()
}

fn tasks() -> Vec<(&'static str, LiftedTaskV1)> {
    vec![
        // One room: `at(robot, room1)` is fluent but no grounded action
        // changes it.
        ("robot_rooms(1)", robot_rooms(1)),
        ("robot_rooms(4)", robot_rooms(4)),
        ("gripper(2)", gripper(2)),
        ("gripper(3)", gripper(3)),
    ]
}

// --- INDEX-EQ-SCAN ---

#[test]
fn inverted_index_matches_naive_scan() {
    for (name, lifted) in tasks() {
        let task = ground_task(&lifted).unwrap();
        let indexed = SuccessorGenerator::from_task(
            task.clone(),
            &grounded_config(GroundedMatchV1::InvertedIndex),
        )
        .unwrap();
        let scanned =
            SuccessorGenerator::from_task(task, &grounded_config(GroundedMatchV1::NaiveScan))
                .unwrap();

        let a = explore(&indexed, usize::MAX).unwrap();
        let b = explore(&scanned, usize::MAX).unwrap();
        assert_eq!(a.states.len(), b.states.len(), "{name}");
        assert_eq!(transcript(&indexed, &a), transcript(&scanned, &b), "{name}");
        assert_eq!(
            space_digest(&indexed, &a).unwrap(),
            space_digest(&scanned, &b).unwrap(),
            "{name}"
        );
    }
}

// --- GROUNDED-EQ-LIFTED ---

#[test]
fn grounded_mode_matches_lifted_mode() {
    for (name, task) in tasks() {
        let lifted =
            SuccessorGenerator::from_task(task.clone(), &lifted_config(StateEncodingV1::DenseBitset))
                .unwrap();
        let grounded =
            SuccessorGenerator::from_task(task, &grounded_config(GroundedMatchV1::InvertedIndex))
                .unwrap();
        assert_eq!(lifted.generator().mode(), GeneratorModeV1::Lifted);
        assert_eq!(grounded.generator().mode(), GeneratorModeV1::Grounded);

        let a = explore(&lifted, usize::MAX).unwrap();
        let b = explore(&grounded, usize::MAX).unwrap();
        assert_eq!(a.states.len(), b.states.len(), "{name}");
        assert_eq!(
            rendered_states(&lifted, &a).unwrap(),
            rendered_states(&grounded, &b).unwrap(),
            "{name}"
        );
        assert_eq!(transcript(&lifted, &a), transcript(&grounded, &b), "{name}");
        assert_eq!(
            space_digest(&lifted, &a).unwrap(),
            space_digest(&grounded, &b).unwrap(),
            "{name}: one fact table, so fingerprints agree"
        );
    }
}

#[test]
fn gripper_state_counts() {
    // Robot position × per ball (room a, room b, left, right) with at most
    // one ball per gripper.
    let generator =
        SuccessorGenerator::from_task(gripper(1), &lifted_config(StateEncodingV1::DenseBitset))
            .unwrap();
    assert_eq!(explore(&generator, usize::MAX).unwrap().states.len(), 8);

    let generator =
        SuccessorGenerator::from_task(gripper(2), &lifted_config(StateEncodingV1::DenseBitset))
            .unwrap();
    assert_eq!(explore(&generator, usize::MAX).unwrap().states.len(), 28);
}

// --- DENSE-EQ-SPARSE ---

#[test]
fn dense_and_sparse_repositories_agree() {
    for (name, task) in tasks() {
        let dense =
            SuccessorGenerator::from_task(task.clone(), &lifted_config(StateEncodingV1::DenseBitset))
                .unwrap();
        let sparse =
            SuccessorGenerator::from_task(task, &lifted_config(StateEncodingV1::SparseSorted))
                .unwrap();
        assert_eq!(
            dense.repository().encoding(),
            StateEncodingV1::DenseBitset
        );
        assert_eq!(
            sparse.repository().encoding(),
            StateEncodingV1::SparseSorted
        );

        let a = explore(&dense, usize::MAX).unwrap();
        let b = explore(&sparse, usize::MAX).unwrap();
        assert_eq!(transcript(&dense, &a), transcript(&sparse, &b), "{name}");
        assert_eq!(
            space_digest(&dense, &a).unwrap(),
            space_digest(&sparse, &b).unwrap(),
            "{name}"
        );
        for (x, y) in a.states.iter().zip(&b.states) {
            let x = dense.repository().resolve(*x).unwrap();
            let y = sparse.repository().resolve(*y).unwrap();
            assert_eq!(x.fingerprint(), y.fingerprint());
            assert_eq!(x.facts().collect::<Vec<_>>(), y.facts().collect::<Vec<_>>());
        }
    }
}
