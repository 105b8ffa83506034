//! Planning tasks used across the lock tests.
//!
//! Every fixture is built from scratch on each call, so tests never share a
//! fact table or a repository.
//!
//! # Panics
//!
//! Builders panic if a fixture is internally inconsistent. That is a bug in
//! this file, not a usage error.

use std::sync::Arc;

use lodestar_kernel::carrier::fact::{FactId, FactTable, GroundAtom, ObjectId, VocabularyV1};
use lodestar_kernel::carrier::state::StateEncodingV1;
use lodestar_kernel::operators::ground_action::{GroundActionTableV1, GroundActionV1};
use lodestar_kernel::operators::schema::{ActionSchemaV1, Term};
use lodestar_kernel::task::{GroundTaskV1, LiftedTaskV1};
use lodestar_search::config::{GeneratorConfigV1, GeneratorModeV1, GroundedMatchV1};

/// Grounded config with the given precondition filter.
#[must_use]
pub fn grounded_config(grounded_match: GroundedMatchV1) -> GeneratorConfigV1 {
    GeneratorConfigV1 {
        mode: GeneratorModeV1::Grounded,
        grounded_match,
        ..GeneratorConfigV1::default()
    }
}

/// Lifted config storing states in `encoding`.
#[must_use]
pub fn lifted_config(encoding: StateEncodingV1) -> GeneratorConfigV1 {
    GeneratorConfigV1 {
        mode: GeneratorModeV1::Lifted,
        encoding,
        ..GeneratorConfigV1::default()
    }
}

/// One robot, two rooms, one grounded action.
///
/// `s0 = {at(robot, room1)}`; `move(room1, room2)` requires
/// `at(robot, room1)`, adds `at(robot, room2)`, deletes `at(robot, room1)`.
pub struct SingleMove {
    pub task: GroundTaskV1,
    pub at_room1: FactId,
    pub at_room2: FactId,
}

#[must_use]
pub fn single_move() -> SingleMove {
    let mut v = VocabularyV1::new();
    let at = v.add_predicate("at", 2);
    let robot = v.add_object("robot");
    let room1 = v.add_object("room1");
    let room2 = v.add_object("room2");

    let facts = Arc::new(FactTable::new());
    let at_room1 = facts.intern(GroundAtom::new(at, vec![robot, room1])).unwrap();
    let at_room2 = facts.intern(GroundAtom::new(at, vec![robot, room2])).unwrap();

    let actions = GroundActionTableV1::new(vec![GroundActionV1::new("move(room1, room2)")
        .with_precondition([at_room1])
        .with_add([at_room2])
        .with_delete([at_room1])])
    .unwrap();
    let task = GroundTaskV1::new(Arc::new(v), facts, actions, [at_room1]).unwrap();
    SingleMove {
        task,
        at_room1,
        at_room2,
    }
}

/// Two states that collapse onto `{p, q}`.
///
/// `s0 = {p, r}` and `s1 = {q, s}`. `finish_r` turns `r` into `q`;
/// `finish_s` turns `s` into `p`. Both successors are `{p, q}`.
pub struct Collapsing {
    pub task: GroundTaskV1,
    pub p: FactId,
    pub q: FactId,
    pub r: FactId,
    pub s: FactId,
}

#[must_use]
pub fn collapsing() -> Collapsing {
    let mut v = VocabularyV1::new();
    let preds: Vec<_> = ["p", "q", "r", "s"]
        .iter()
        .map(|name| v.add_predicate(*name, 0))
        .collect();
    let facts = Arc::new(FactTable::new());
    let ids: Vec<FactId> = preds
        .iter()
        .map(|p| facts.intern(GroundAtom::new(*p, Vec::new())).unwrap())
        .collect();
    let (p, q, r, s) = (ids[0], ids[1], ids[2], ids[3]);

    let actions = GroundActionTableV1::new(vec![
        GroundActionV1::new("finish_r")
            .with_precondition([r])
            .with_add([q])
            .with_delete([r]),
        GroundActionV1::new("finish_s")
            .with_precondition([s])
            .with_add([p])
            .with_delete([s]),
    ])
    .unwrap();
    let task = GroundTaskV1::new(Arc::new(v), facts, actions, [p, r]).unwrap();
    Collapsing { task, p, q, r, s }
}

/// A robot on a line of `rooms` rooms that can lock the room it stands in.
///
/// - `move(?from, ?to)`: `at(robot, ?from)`, `connected(?from, ?to)`,
///   not `locked(?to)`; moves the robot.
/// - `lock(?room)`: `at(robot, ?room)`, not `locked(?room)`; adds
///   `locked(?room)`.
///
/// `connected` is static; `at` and `locked` are fluent. The robot starts in
/// `room1`.
#[must_use]
pub fn robot_rooms(rooms: usize) -> LiftedTaskV1 {
    let mut v = VocabularyV1::new();
    let at = v.add_predicate("at", 2);
    let connected = v.add_predicate("connected", 2);
    let locked = v.add_predicate("locked", 1);
    let robot = v.add_object("robot");
    let room_ids: Vec<ObjectId> = (1..=rooms).map(|i| v.add_object(format!("room{i}"))).collect();

    let mut initial = vec![GroundAtom::new(at, vec![robot, room_ids[0]])];
    for pair in room_ids.windows(2) {
        initial.push(GroundAtom::new(connected, vec![pair[0], pair[1]]));
        initial.push(GroundAtom::new(connected, vec![pair[1], pair[0]]));
    }

    let schemas = vec![
        ActionSchemaV1::new("move")
            .with_parameter("from")
            .with_parameter("to")
            .with_precondition(at, [Term::Object(robot), Term::Parameter(0)])
            .with_precondition(connected, [Term::Parameter(0), Term::Parameter(1)])
            .with_negative_precondition(locked, [Term::Parameter(1)])
            .with_add(at, [Term::Object(robot), Term::Parameter(1)])
            .with_delete(at, [Term::Object(robot), Term::Parameter(0)]),
        ActionSchemaV1::new("lock")
            .with_parameter("room")
            .with_precondition(at, [Term::Object(robot), Term::Parameter(0)])
            .with_negative_precondition(locked, [Term::Parameter(0)])
            .with_add(locked, [Term::Parameter(0)])
            .with_cost(2),
    ];
    LiftedTaskV1::new(Arc::new(v), schemas, initial).unwrap()
}

/// Two rooms, one robot with two grippers, `balls` balls in `rooma`.
///
/// Type predicates (`room`, `ball`, `gripper`) are static; `at_robby`,
/// `at`, `free` and `carry` are fluent.
#[must_use]
pub fn gripper(balls: usize) -> LiftedTaskV1 {
    let mut v = VocabularyV1::new();
    let room = v.add_predicate("room", 1);
    let ball = v.add_predicate("ball", 1);
    let gripper = v.add_predicate("gripper", 1);
    let at_robby = v.add_predicate("at_robby", 1);
    let at = v.add_predicate("at", 2);
    let free = v.add_predicate("free", 1);
    let carry = v.add_predicate("carry", 2);

    let rooma = v.add_object("rooma");
    let roomb = v.add_object("roomb");
    let left = v.add_object("left");
    let right = v.add_object("right");
    let ball_ids: Vec<ObjectId> = (1..=balls).map(|i| v.add_object(format!("ball{i}"))).collect();

    let mut initial = vec![
        GroundAtom::new(room, vec![rooma]),
        GroundAtom::new(room, vec![roomb]),
        GroundAtom::new(gripper, vec![left]),
        GroundAtom::new(gripper, vec![right]),
        GroundAtom::new(at_robby, vec![rooma]),
        GroundAtom::new(free, vec![left]),
        GroundAtom::new(free, vec![right]),
    ];
    for b in &ball_ids {
        initial.push(GroundAtom::new(ball, vec![*b]));
        initial.push(GroundAtom::new(at, vec![*b, rooma]));
    }

    let p = Term::Parameter;
    let schemas = vec![
        ActionSchemaV1::new("move")
            .with_parameter("from")
            .with_parameter("to")
            .with_precondition(room, [p(0)])
            .with_precondition(room, [p(1)])
            .with_precondition(at_robby, [p(0)])
            .with_distinct(0, 1)
            .with_add(at_robby, [p(1)])
            .with_delete(at_robby, [p(0)]),
        ActionSchemaV1::new("pick")
            .with_parameter("ball")
            .with_parameter("room")
            .with_parameter("gripper")
            .with_precondition(ball, [p(0)])
            .with_precondition(room, [p(1)])
            .with_precondition(gripper, [p(2)])
            .with_precondition(at, [p(0), p(1)])
            .with_precondition(at_robby, [p(1)])
            .with_precondition(free, [p(2)])
            .with_add(carry, [p(0), p(2)])
            .with_delete(at, [p(0), p(1)])
            .with_delete(free, [p(2)]),
        ActionSchemaV1::new("drop")
            .with_parameter("ball")
            .with_parameter("room")
            .with_parameter("gripper")
            .with_precondition(ball, [p(0)])
            .with_precondition(room, [p(1)])
            .with_precondition(gripper, [p(2)])
            .with_precondition(carry, [p(0), p(2)])
            .with_precondition(at_robby, [p(1)])
            .with_add(at, [p(0), p(1)])
            .with_add(free, [p(2)])
            .with_delete(carry, [p(0), p(2)]),
    ];
    LiftedTaskV1::new(Arc::new(v), schemas, initial).unwrap()
}
