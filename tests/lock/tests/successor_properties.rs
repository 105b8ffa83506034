//! Successor-generation lock tests.
//!
//! - REPOSITORY-DETERMINISM: `get_or_create(F)` twice returns one handle.
//! - REPOSITORY-CANONICAL: equal fact sets built in any order share a handle.
//! - GROUNDED-SOUNDNESS: an action is yielded iff its preconditions hold.
//! - LIFTED-COMPLETENESS: yielded bindings are exactly the satisfying ones.
//! - EFFECT-CORRECTNESS: successor facts are `(s ∪ add) − delete`.
//! - TRANSITION-MERGING: equal successor fact sets resolve to one handle.
//! - The single-move and collapsing-successor scenarios.

use std::collections::{BTreeSet, HashSet};

use lock_tests::fixtures::{
    collapsing, grounded_config, gripper, lifted_config, robot_rooms, single_move,
};
use lock_tests::state_space::explore;
use lodestar_kernel::carrier::fact::{FactId, GroundAtom, ObjectId};
use lodestar_kernel::carrier::repository::{StateHandle, StateRepository};
use lodestar_kernel::carrier::state::{StateBuilder, StateEncodingV1};
use lodestar_kernel::operators::ground_action::GroundActionTableV1;
use lodestar_kernel::operators::schema::{ActionSchemaV1, Binding, SchemaId};
use lodestar_kernel::task::{GroundTaskV1, LiftedTaskV1};
use lodestar_search::{
    ground_task, ActionRefV1, ApplicableActionGenerator, GroundedMatchV1, SuccessorGenerator,
};

fn ids(raw: &[u32]) -> Vec<FactId> {
    raw.iter().copied().map(FactId::new).collect()
}

fn facts_of(generator: &SuccessorGenerator, handle: StateHandle) -> BTreeSet<FactId> {
    generator
        .repository()
        .resolve(handle)
        .unwrap()
        .facts()
        .collect()
}

fn grounded_actions(generator: &SuccessorGenerator) -> &GroundActionTableV1 {
    match generator.generator() {
        ApplicableActionGenerator::Grounded(aag) => aag.actions(),
        ApplicableActionGenerator::Lifted(_) => panic!("expected a grounded generator"),
    }
}

// --- REPOSITORY-DETERMINISM / REPOSITORY-CANONICAL ---

#[test]
fn get_or_create_is_deterministic() {
    for encoding in [StateEncodingV1::DenseBitset, StateEncodingV1::SparseSorted] {
        let repo = StateRepository::new(encoding, 256);
        let first = repo.get_or_create_from_facts(ids(&[4, 17, 200])).unwrap();
        let second = repo.get_or_create_from_facts(ids(&[4, 17, 200])).unwrap();
        assert_eq!(first, second, "{}", encoding.as_str());
        assert_eq!(repo.len(), 1);
    }
}

#[test]
fn construction_order_does_not_matter() {
    for encoding in [StateEncodingV1::DenseBitset, StateEncodingV1::SparseSorted] {
        let repo = StateRepository::new(encoding, 64);
        let a = repo.get_or_create_from_facts(ids(&[3, 1, 2])).unwrap();
        let b = repo.get_or_create_from_facts(ids(&[2, 3, 1, 1])).unwrap();

        let mut builder = StateBuilder::new();
        for f in ids(&[1, 9, 2, 3]) {
            builder.insert(f);
        }
        builder.remove(FactId::new(9));
        let c = repo.get_or_create(builder).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(repo.len(), 1);

        let empty_a = repo.get_or_create_from_facts(Vec::new()).unwrap();
        let empty_b = repo.get_or_create(StateBuilder::new()).unwrap();
        assert_eq!(empty_a, empty_b);
        assert_ne!(empty_a, a);
    }
}

// --- Single-move scenario ---

#[test]
fn single_move_scenario() {
    let fixture = single_move();
    let generator = SuccessorGenerator::from_task(
        fixture.task,
        &grounded_config(GroundedMatchV1::InvertedIndex),
    )
    .unwrap();
    let s0 = generator.initial_state();
    assert_eq!(facts_of(&generator, s0), BTreeSet::from([fixture.at_room1]));

    let applicable: Vec<ActionRefV1> = generator
        .applicable_actions(s0)
        .unwrap()
        .map(|a| a.action_ref())
        .collect();
    assert_eq!(applicable.len(), 1);
    assert_eq!(
        generator.describe_action(&applicable[0]).as_deref(),
        Some("move(room1, room2)")
    );

    let transitions = generator.expand(s0).unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].action, applicable[0]);
    assert_eq!(transitions[0].cost, 1);
    let s1 = transitions[0].successor;
    assert_eq!(facts_of(&generator, s1), BTreeSet::from([fixture.at_room2]));
    assert_eq!(generator.describe_state(s1).unwrap(), vec!["at(robot, room2)"]);

    assert!(generator.expand(s1).unwrap().is_empty(), "dead end");
}

// --- Collapsing-successor scenario ---

#[test]
fn collapsing_successors_share_one_handle() {
    let fixture = collapsing();
    let generator = SuccessorGenerator::from_task(
        fixture.task,
        &grounded_config(GroundedMatchV1::InvertedIndex),
    )
    .unwrap();
    let s0 = generator.initial_state();
    let s1 = generator
        .repository()
        .get_or_create_from_facts([fixture.q, fixture.s])
        .unwrap();
    assert_ne!(s0, s1);

    let from_s0 = generator.expand(s0).unwrap();
    let from_s1 = generator.expand(s1).unwrap();
    assert_eq!(from_s0.len(), 1);
    assert_eq!(from_s1.len(), 1);
    assert_ne!(from_s0[0].action, from_s1[0].action);
    assert_eq!(from_s0[0].successor, from_s1[0].successor);
    assert_eq!(
        facts_of(&generator, from_s0[0].successor),
        BTreeSet::from([fixture.p, fixture.q])
    );
    assert!(!facts_of(&generator, from_s0[0].successor).contains(&fixture.r));
}

// --- GROUNDED-SOUNDNESS ---

/// `state` plus the initial facts no action ever changes.
fn full_grounded_facts(task: &GroundTaskV1, state: &BTreeSet<FactId>) -> BTreeSet<FactId> {
    let fluent = task.fluent_facts();
    let mut full = state.clone();
    full.extend(task.initial().iter().filter(|f| !fluent.contains(*f)));
    full
}

fn assert_grounded_sound(task: &GroundTaskV1, generator: &SuccessorGenerator, state: StateHandle) {
    let full = full_grounded_facts(task, &facts_of(generator, state));
    let expected: Vec<ActionRefV1> = grounded_actions(generator)
        .iter()
        .filter(|(_, a)| {
            a.precondition.iter().all(|f| full.contains(f))
                && !a.negative_precondition.iter().any(|f| full.contains(f))
        })
        .map(|(id, _)| ActionRefV1::Grounded(id))
        .collect();
    let yielded: Vec<ActionRefV1> = generator
        .applicable_actions(state)
        .unwrap()
        .map(|a| a.action_ref())
        .collect();
    assert_eq!(yielded, expected, "{:?}", generator.describe_state(state));
}

#[test]
fn grounded_generator_is_sound_on_every_subset() {
    let fixture = collapsing();
    let all = [fixture.p, fixture.q, fixture.r, fixture.s];
    for strategy in [GroundedMatchV1::InvertedIndex, GroundedMatchV1::NaiveScan] {
        let task = fixture.task.clone();
        let generator =
            SuccessorGenerator::from_task(task.clone(), &grounded_config(strategy)).unwrap();
        for mask in 0u32..16 {
            let subset = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, f)| *f);
            let state = generator
                .repository()
                .get_or_create_from_facts(subset)
                .unwrap();
            assert_grounded_sound(&task, &generator, state);
        }
    }
}

#[test]
fn grounded_generator_is_sound_on_reachable_states() {
    for lifted in [robot_rooms(4), gripper(2)] {
        let task = ground_task(&lifted).unwrap();
        for strategy in [GroundedMatchV1::InvertedIndex, GroundedMatchV1::NaiveScan] {
            let generator =
                SuccessorGenerator::from_task(task.clone(), &grounded_config(strategy)).unwrap();
            let space = explore(&generator, usize::MAX).unwrap();
            assert!(space.states.len() > 1);
            for state in &space.states {
                assert_grounded_sound(&task, &generator, *state);
            }
        }
    }
}

// --- LIFTED-COMPLETENESS ---

fn all_bindings(schema: &ActionSchemaV1, objects: &[ObjectId]) -> Vec<Binding> {
    let mut out = vec![Vec::new()];
    for parameter in &schema.parameters {
        let domain = parameter.domain.as_deref().unwrap_or(objects);
        out = out
            .into_iter()
            .flat_map(|prefix: Vec<ObjectId>| {
                domain.iter().map(move |o| {
                    let mut next = prefix.clone();
                    next.push(*o);
                    next
                })
            })
            .collect();
    }
    out.into_iter().map(Binding::new).collect()
}

/// Every `(schema, binding)` whose instantiated preconditions hold in
/// `atoms`, by brute force.
fn brute_force(task: &LiftedTaskV1, atoms: &HashSet<GroundAtom>) -> BTreeSet<ActionRefV1> {
    let objects: Vec<ObjectId> = task.vocabulary().objects().collect();
    let mut out = BTreeSet::new();
    for (position, schema) in task.schemas().iter().enumerate() {
        for binding in all_bindings(schema, &objects) {
            let distinct_ok = schema
                .distinct
                .iter()
                .all(|(a, b)| binding.get(*a) != binding.get(*b));
            let positive_ok = schema
                .precondition
                .iter()
                .all(|p| atoms.contains(&p.instantiate(&binding).unwrap()));
            let negative_ok = !schema
                .negative_precondition
                .iter()
                .any(|p| atoms.contains(&p.instantiate(&binding).unwrap()));
            if distinct_ok && positive_ok && negative_ok {
                out.insert(ActionRefV1::Lifted {
                    schema: SchemaId::new(u32::try_from(position).unwrap()),
                    binding,
                });
            }
        }
    }
    out
}

/// Atoms of `state` plus the static initial atoms.
fn full_lifted_atoms(
    task: &LiftedTaskV1,
    generator: &SuccessorGenerator,
    state: StateHandle,
) -> HashSet<GroundAtom> {
    let fluent = task.fluent_predicates();
    let mut atoms: HashSet<GroundAtom> = task
        .facts()
        .atoms_of(task.initial().iter().copied())
        .into_iter()
        .filter(|(_, a)| !fluent.contains(&a.predicate()))
        .map(|(_, a)| (*a).clone())
        .collect();
    let state = generator.repository().resolve(state).unwrap();
    atoms.extend(
        task.facts()
            .atoms_of(state.facts())
            .into_iter()
            .map(|(_, a)| (*a).clone()),
    );
    atoms
}

#[test]
fn lifted_generator_is_complete_and_duplicate_free() {
    for task in [robot_rooms(4), gripper(2)] {
        let generator = SuccessorGenerator::from_task(
            task.clone(),
            &lifted_config(StateEncodingV1::DenseBitset),
        )
        .unwrap();
        let space = explore(&generator, usize::MAX).unwrap();
        assert!(space.states.len() > 1);
        for state in &space.states {
            let yielded: Vec<ActionRefV1> = generator
                .applicable_actions(*state)
                .unwrap()
                .map(|a| a.action_ref())
                .collect();
            let unique: BTreeSet<ActionRefV1> = yielded.iter().cloned().collect();
            assert_eq!(unique.len(), yielded.len(), "duplicate binding yielded");
            let expected = brute_force(&task, &full_lifted_atoms(&task, &generator, *state));
            assert_eq!(unique, expected, "{:?}", generator.describe_state(*state));
        }
    }
}

#[test]
fn lifted_order_is_schema_then_binding() {
    let generator = SuccessorGenerator::from_task(
        gripper(2),
        &lifted_config(StateEncodingV1::DenseBitset),
    )
    .unwrap();
    let yielded: Vec<ActionRefV1> = generator
        .applicable_actions(generator.initial_state())
        .unwrap()
        .map(|a| a.action_ref())
        .collect();
    let mut sorted = yielded.clone();
    sorted.sort();
    assert_eq!(yielded, sorted);
    let names: Vec<String> = yielded
        .iter()
        .map(|a| generator.describe_action(a).unwrap())
        .collect();
    assert_eq!(names[0], "move(rooma, roomb)");
    assert!(names[1..].iter().all(|n| n.starts_with("pick(")));
    assert_eq!(names.len(), 5, "one move, four picks");
}

// --- EFFECT-CORRECTNESS ---

#[test]
fn lifted_effects_are_add_then_delete() {
    let task = gripper(2);
    let generator = SuccessorGenerator::from_task(
        task.clone(),
        &lifted_config(StateEncodingV1::SparseSorted),
    )
    .unwrap();
    let space = explore(&generator, usize::MAX).unwrap();
    for (source, transition) in &space.transitions {
        let ActionRefV1::Lifted { schema, binding } = &transition.action else {
            panic!("lifted generator yielded a grounded action");
        };
        let schema = task.schema(*schema).unwrap();
        let mut expected = facts_of(&generator, space.states[*source]);
        for pattern in &schema.add_effects {
            let atom = pattern.instantiate(binding).unwrap();
            expected.insert(task.facts().get(&atom).unwrap());
        }
        for pattern in &schema.delete_effects {
            let atom = pattern.instantiate(binding).unwrap();
            if let Some(fact) = task.facts().get(&atom) {
                expected.remove(&fact);
            }
        }
        assert_eq!(facts_of(&generator, transition.successor), expected);
        assert_eq!(transition.cost, schema.cost);
    }
}

#[test]
fn grounded_effects_are_add_then_delete() {
    let task = ground_task(&robot_rooms(4)).unwrap();
    let generator = SuccessorGenerator::from_task(
        task,
        &grounded_config(GroundedMatchV1::InvertedIndex),
    )
    .unwrap();
    let space = explore(&generator, usize::MAX).unwrap();
    let actions = grounded_actions(&generator);
    for (source, transition) in &space.transitions {
        let ActionRefV1::Grounded(id) = transition.action else {
            panic!("grounded generator yielded a lifted action");
        };
        let action = actions.get(id).unwrap();
        let mut expected = facts_of(&generator, space.states[*source]);
        expected.extend(action.add_effects.iter().copied());
        for fact in &action.delete_effects {
            expected.remove(fact);
        }
        assert_eq!(facts_of(&generator, transition.successor), expected);
        assert_eq!(transition.cost, action.cost);
    }
}

// --- TRANSITION-MERGING ---

#[test]
fn equal_successor_sets_merge_into_one_handle() {
    let generator = SuccessorGenerator::from_task(
        gripper(2),
        &lifted_config(StateEncodingV1::DenseBitset),
    )
    .unwrap();
    let space = explore(&generator, usize::MAX).unwrap();

    let distinct_sets: HashSet<BTreeSet<FactId>> = space
        .states
        .iter()
        .map(|h| facts_of(&generator, *h))
        .collect();
    assert_eq!(distinct_sets.len(), space.states.len());
    assert_eq!(generator.repository().len(), space.states.len());

    for (_, t) in &space.transitions {
        let rebuilt = generator
            .repository()
            .get_or_create_from_facts(facts_of(&generator, t.successor))
            .unwrap();
        assert_eq!(rebuilt, t.successor);
    }
}

#[test]
fn repeated_expansion_is_identical() {
    let generator = SuccessorGenerator::from_task(
        robot_rooms(4),
        &lifted_config(StateEncodingV1::DenseBitset),
    )
    .unwrap();
    let space = explore(&generator, usize::MAX).unwrap();
    let stored = generator.repository().len();
    for state in &space.states {
        let first = generator.expand(*state).unwrap();
        for _ in 0..3 {
            assert_eq!(generator.expand(*state).unwrap(), first);
        }
    }
    assert_eq!(generator.repository().len(), stored, "no new states");
}
