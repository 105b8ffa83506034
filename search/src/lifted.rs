//! Lifted applicable-action generator.
//!
//! Schemas are validated and compiled once, and every atom an add effect
//! can produce is interned up front. A predicate is fluent if some
//! schema adds or deletes it; initial atoms of every other predicate form the
//! static layer and never reach a state. Each query indexes the state's
//! atoms by predicate and resumes a binding cursor per schema, so each
//! binding is found only when the caller asks for it.
//!
//! Order: schema declaration order, then lexicographic binding order.

use std::collections::BTreeSet;
use std::sync::Arc;

use lodestar_kernel::carrier::fact::{FactId, FactTable, ObjectId, PredicateId, VocabularyV1};
use lodestar_kernel::carrier::repository::{StateHandle, StateRepository};
use lodestar_kernel::carrier::state::State;
use lodestar_kernel::operators::schema::{ActionSchemaV1, Binding, SchemaId};
use lodestar_kernel::task::LiftedTaskV1;

use crate::contract::ApplicableActionsV1;
use crate::error::SuccessorError;
use crate::matcher::{
    AtomIndex, BindingCursor, CompiledSchema, FluentView, MatchContext, StaticLayer,
};
use crate::transition::{ActionRefV1, ApplicableActionV1};

#[derive(Debug)]
pub struct LiftedAag {
    task: LiftedTaskV1,
    repository: Arc<StateRepository>,
    compiled: Vec<CompiledSchema>,
    statics: StaticLayer,
    objects: Vec<ObjectId>,
    initial: StateHandle,
}

/// Validate and compile every schema of `task`.
pub(crate) fn compile_schemas(
    task: &LiftedTaskV1,
    fluent: &BTreeSet<PredicateId>,
) -> Result<Vec<CompiledSchema>, SuccessorError> {
    let mut compiled = Vec::with_capacity(task.schemas().len());
    for (position, schema) in task.schemas().iter().enumerate() {
        schema.validate(task.vocabulary())?;
        let raw = u32::try_from(position).map_err(|_| SuccessorError::InvalidTask {
            detail: "more schemas than u32 ids allow".into(),
        })?;
        compiled.push(CompiledSchema::compile(SchemaId::new(raw), schema, fluent));
    }
    Ok(compiled)
}

/// Split the initial facts of `task` into the static layer and the fluent
/// fact ids of the initial state.
pub(crate) fn split_initial(
    task: &LiftedTaskV1,
    fluent: &BTreeSet<PredicateId>,
) -> (StaticLayer, Vec<FactId>) {
    let mut statics = Vec::new();
    let mut initial = Vec::new();
    for (fact, atom) in task.facts().atoms_of(task.initial().iter().copied()) {
        if fluent.contains(&atom.predicate()) {
            initial.push(fact);
        } else {
            statics.push(atom);
        }
    }
    (StaticLayer::new(statics), initial)
}

/// Intern every atom an add effect can produce, so the fact ids a search
/// can reach are fixed before it starts. The task's fact table may be shared
/// with other generators or a grounding pass, so ids are checked as they are
/// issued rather than estimated. Stops at the first id outside `capacity`.
/// Returns the number of add-effect instances visited.
fn reserve_effect_facts(
    task: &LiftedTaskV1,
    compiled: &[CompiledSchema],
    objects: &[ObjectId],
    capacity: usize,
) -> Result<usize, SuccessorError> {
    let facts = task.facts();
    let mut visited = 0usize;
    for (schema, plan) in task.schemas().iter().zip(compiled) {
        let mut slots = vec![ObjectId::new(0); schema.parameters.len()];
        for pattern in &schema.add_effects {
            let params: BTreeSet<usize> = pattern.parameters().collect();
            let params: Vec<usize> = params.into_iter().collect();
            let domains: Vec<&[ObjectId]> =
                params.iter().map(|p| plan.domain(*p, objects)).collect();
            if domains.iter().any(|d| d.is_empty()) {
                continue;
            }
            // Odometer over the pattern's own parameters, last one fastest.
            let mut digits = vec![0usize; params.len()];
            loop {
                for ((param, domain), digit) in params.iter().zip(&domains).zip(&digits) {
                    slots[*param] = domain[*digit];
                }
                let binding = Binding::new(slots.clone());
                let atom = pattern
                    .instantiate(&binding)
                    .ok_or_else(|| SuccessorError::MalformedSchema {
                        schema: schema.name.clone(),
                        detail: "add effect mentions an undeclared parameter".into(),
                    })?;
                let fact = facts.intern(atom)?;
                if fact.index() >= capacity {
                    return Err(SuccessorError::CapacityExceeded {
                        detail: format!(
                            "schema `{}` can add fact {}, state capacity is {capacity} facts",
                            schema.name,
                            fact.as_u32()
                        ),
                    });
                }
                visited += 1;

                let Some(pos) = (0..digits.len()).rev().find(|&i| digits[i] + 1 < domains[i].len())
                else {
                    break;
                };
                digits[pos] += 1;
                for digit in &mut digits[pos + 1..] {
                    *digit = 0;
                }
            }
        }
    }
    Ok(visited)
}

impl LiftedAag {
    /// Validate and compile `task`, build its static layer, and intern its
    /// initial state into `repository`.
    ///
    /// # Errors
    ///
    /// - [`SuccessorError::MalformedSchema`] for the first invalid schema.
    /// - [`SuccessorError::CapacityExceeded`] if an atom some add effect can
    ///   produce, or an initial fluent atom, has a fact id outside the
    ///   repository's capacity.
    /// - [`SuccessorError::HandleSpaceExhausted`] if the repository is full.
    pub fn new(
        task: LiftedTaskV1,
        repository: Arc<StateRepository>,
    ) -> Result<Self, SuccessorError> {
        let fluent = task.fluent_predicates();
        let compiled = compile_schemas(&task, &fluent)?;
        let objects: Vec<ObjectId> = task.vocabulary().objects().collect();

        let reserved = reserve_effect_facts(&task, &compiled, &objects, repository.capacity())?;
        let (statics, initial_facts) = split_initial(&task, &fluent);
        let initial = repository.get_or_create_from_facts(initial_facts)?;

        tracing::debug!(
            schemas = compiled.len(),
            fluent_predicates = fluent.len(),
            static_facts = statics.len(),
            objects = objects.len(),
            reserved_facts = reserved,
            "lifted applicable-action generator built"
        );

        Ok(Self {
            task,
            repository,
            compiled,
            statics,
            objects,
            initial,
        })
    }

    #[must_use]
    pub fn schemas(&self) -> &[ActionSchemaV1] {
        self.task.schemas()
    }

    /// Number of atoms in the static layer.
    #[must_use]
    pub fn static_fact_count(&self) -> usize {
        self.statics.len()
    }
}

/// Lazy iterator over the `(schema, binding)` pairs applicable in one state.
pub struct LiftedApplicable<'a> {
    aag: &'a LiftedAag,
    state: Arc<State>,
    index: AtomIndex,
    next_schema: usize,
    cursor: BindingCursor,
}

impl<'a> Iterator for LiftedApplicable<'a> {
    type Item = ApplicableActionV1<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let aag = self.aag;
        loop {
            let compiled = aag.compiled.get(self.next_schema)?;
            let ctx = MatchContext {
                objects: &aag.objects,
                statics: &aag.statics,
                fluent: Some(FluentView {
                    index: &self.index,
                    state: &self.state,
                    facts: aag.task.facts(),
                }),
            };
            if let Some(binding) = self.cursor.next(compiled, &ctx) {
                return Some(ApplicableActionV1::Lifted {
                    id: compiled.id,
                    schema: aag.task.schema(compiled.id)?,
                    binding,
                });
            }
            self.next_schema += 1;
            self.cursor = BindingCursor::default();
        }
    }
}

impl ApplicableActionsV1 for LiftedAag {
    type Iter<'a> = LiftedApplicable<'a>;

    fn repository(&self) -> &Arc<StateRepository> {
        &self.repository
    }

    fn facts(&self) -> &Arc<FactTable> {
        self.task.facts()
    }

    fn vocabulary(&self) -> &Arc<VocabularyV1> {
        self.task.vocabulary()
    }

    fn initial_state(&self) -> StateHandle {
        self.initial
    }

    fn applicable_actions(&self, state: StateHandle) -> Result<LiftedApplicable<'_>, SuccessorError> {
        let state = self.repository.resolve(state)?;
        let mut index = AtomIndex::default();
        for (_, atom) in self.task.facts().atoms_of(state.facts()) {
            index.insert(atom);
        }
        Ok(LiftedApplicable {
            aag: self,
            state,
            index,
            next_schema: 0,
            cursor: BindingCursor::default(),
        })
    }

    fn describe(&self, action: &ActionRefV1) -> Option<String> {
        match action {
            ActionRefV1::Lifted { schema, binding } => {
                let schema = self.task.schema(*schema)?;
                (binding.len() == schema.parameters.len())
                    .then(|| self.vocabulary().display_call(&schema.name, binding.objects()))
            }
            ActionRefV1::Grounded(_) => None,
        }
    }
}
