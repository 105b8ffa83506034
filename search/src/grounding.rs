//! Grounding pass: lifted task → grounded task.
//!
//! Every schema is instantiated over the bindings that satisfy its static
//! preconditions, static negative preconditions, parameter domains and
//! `distinct` constraints. Fluent preconditions and effects are interned
//! into the task's shared fact table, so grounded and lifted generators
//! built from one task agree on fact ids. Static preconditions are already
//! decided and are not carried into the grounded action. Fluency stays
//! per predicate: initial atoms of fluent predicates are declared fluent on
//! the grounded task.

use std::collections::BTreeSet;
use std::sync::Arc;

use lodestar_kernel::carrier::fact::{FactId, FactTable, PredicateId};
use lodestar_kernel::operators::ground_action::{GroundActionTableV1, GroundActionV1};
use lodestar_kernel::operators::schema::{ActionSchemaV1, AtomPattern, Binding, SchemaId};
use lodestar_kernel::task::{GroundTaskV1, LiftedTaskV1};

use crate::error::SuccessorError;
use crate::lifted::{compile_schemas, split_initial};
use crate::matcher::MatchContext;

/// Ground every schema of `task`.
///
/// # Errors
///
/// - [`SuccessorError::MalformedSchema`] for the first invalid schema.
/// - [`SuccessorError::HandleSpaceExhausted`] if the fact table fills up.
pub fn ground_task(task: &LiftedTaskV1) -> Result<GroundTaskV1, SuccessorError> {
    let fluent = task.fluent_predicates();
    let compiled = compile_schemas(task, &fluent)?;
    let (statics, fluent_initial) = split_initial(task, &fluent);
    let objects: Vec<_> = task.vocabulary().objects().collect();
    let ctx = MatchContext {
        objects: &objects,
        statics: &statics,
        fluent: None,
    };

    let mut actions = Vec::new();
    for plan in &compiled {
        let schema = task
            .schema(plan.id)
            .ok_or_else(|| SuccessorError::InvalidTask {
                detail: format!("schema {} disappeared during grounding", plan.id.as_u32()),
            })?;
        let bindings = plan.bindings(&ctx);
        tracing::trace!(schema = %schema.name, bindings = bindings.len(), "grounded schema");
        for binding in bindings {
            actions.push(instantiate(task, &fluent, schema, binding, plan.id)?);
        }
    }

    tracing::debug!(
        schemas = compiled.len(),
        actions = actions.len(),
        facts = task.facts().len(),
        "grounding pass finished"
    );

    // Initial atoms of fluent predicates stay fluent even when no grounded
    // action touches them, so both modes build the same states.
    let table = GroundActionTableV1::new(actions)?;
    let grounded = GroundTaskV1::new(
        Arc::clone(task.vocabulary()),
        Arc::clone(task.facts()),
        table,
        task.initial().iter().copied(),
    )?
    .with_fluent_facts(fluent_initial)?;
    Ok(grounded)
}

fn instantiate(
    task: &LiftedTaskV1,
    fluent: &BTreeSet<PredicateId>,
    schema: &ActionSchemaV1,
    binding: Binding,
    id: SchemaId,
) -> Result<GroundActionV1, SuccessorError> {
    let facts = task.facts();
    let name = task
        .vocabulary()
        .display_call(&schema.name, binding.objects());
    let action = GroundActionV1::new(name)
        .with_precondition(intern_fluent(facts, fluent, schema, &schema.precondition, &binding)?)
        .with_negative_precondition(intern_fluent(
            facts,
            fluent,
            schema,
            &schema.negative_precondition,
            &binding,
        )?)
        .with_add(intern_all(facts, schema, &schema.add_effects, &binding)?)
        .with_delete(intern_all(facts, schema, &schema.delete_effects, &binding)?)
        .with_cost(schema.cost)
        .with_origin(id, binding);
    Ok(action)
}

fn intern_fluent(
    facts: &FactTable,
    fluent: &BTreeSet<PredicateId>,
    schema: &ActionSchemaV1,
    patterns: &[AtomPattern],
    binding: &Binding,
) -> Result<Vec<FactId>, SuccessorError> {
    let fluent_only: Vec<AtomPattern> = patterns
        .iter()
        .filter(|p| fluent.contains(&p.predicate))
        .cloned()
        .collect();
    intern_all(facts, schema, &fluent_only, binding)
}

fn intern_all(
    facts: &FactTable,
    schema: &ActionSchemaV1,
    patterns: &[AtomPattern],
    binding: &Binding,
) -> Result<Vec<FactId>, SuccessorError> {
    patterns
        .iter()
        .map(|pattern| {
            let atom = pattern
                .instantiate(binding)
                .ok_or_else(|| SuccessorError::MalformedSchema {
                    schema: schema.name.clone(),
                    detail: "binding does not cover every pattern parameter".into(),
                })?;
            Ok(facts.intern(atom)?)
        })
        .collect()
}
