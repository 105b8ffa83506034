//! Planning task inputs: the grounded and lifted problem descriptions the
//! successor generator is built from.
//!
//! Tasks are built programmatically; there is no parser. Construction checks
//! that every referenced fact, predicate and object exists and that atom
//! arities match their predicate. Schemas are *not* validated here: that
//! happens when a schema is first handed to an applicable-action generator
//! or to the grounding pass, which reports `MalformedSchema` with the schema
//! name.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::carrier::fact::{
    FactId, FactTable, FactTableError, GroundAtom, ObjectId, PredicateId, VocabularyV1,
};
use crate::operators::ground_action::GroundActionTableV1;
use crate::operators::schema::{ActionSchemaV1, SchemaId};

/// Typed failure for task construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    UnknownPredicate { predicate: PredicateId },
    UnknownObject { object: ObjectId },
    ArityMismatch {
        predicate: String,
        expected: usize,
        found: usize,
    },
    /// A fact id that the task's fact table never issued.
    UnknownFact { fact: FactId },
    FactSpaceExhausted,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPredicate { predicate } => {
                write!(f, "unknown predicate id {}", predicate.as_u32())
            }
            Self::UnknownObject { object } => write!(f, "unknown object id {}", object.as_u32()),
            Self::ArityMismatch {
                predicate,
                expected,
                found,
            } => write!(
                f,
                "predicate `{predicate}` takes {expected} arguments, got {found}"
            ),
            Self::UnknownFact { fact } => write!(f, "unknown fact id {}", fact.as_u32()),
            Self::FactSpaceExhausted => write!(f, "fact id space exhausted"),
        }
    }
}

impl std::error::Error for TaskError {}

impl From<FactTableError> for TaskError {
    fn from(e: FactTableError) -> Self {
        match e {
            FactTableError::IdSpaceExhausted => Self::FactSpaceExhausted,
        }
    }
}

/// Check `atom` against `vocabulary`.
///
/// # Errors
///
/// Returns the first unknown predicate, arity mismatch or unknown object.
pub fn check_atom(vocabulary: &VocabularyV1, atom: &GroundAtom) -> Result<(), TaskError> {
    let decl = vocabulary
        .predicate(atom.predicate())
        .ok_or(TaskError::UnknownPredicate {
            predicate: atom.predicate(),
        })?;
    if decl.arity != atom.arity() {
        return Err(TaskError::ArityMismatch {
            predicate: decl.name.clone(),
            expected: decl.arity,
            found: atom.arity(),
        });
    }
    if let Some(object) = atom
        .args()
        .iter()
        .find(|o| o.index() >= vocabulary.object_count())
    {
        return Err(TaskError::UnknownObject { object: *object });
    }
    Ok(())
}

fn normalized(initial: impl IntoIterator<Item = FactId>) -> Vec<FactId> {
    let mut facts: Vec<FactId> = initial.into_iter().collect();
    facts.sort_unstable();
    facts.dedup();
    facts
}

/// A fully grounded task.
#[derive(Debug, Clone)]
pub struct GroundTaskV1 {
    vocabulary: Arc<VocabularyV1>,
    facts: Arc<FactTable>,
    actions: GroundActionTableV1,
    initial: Vec<FactId>,
    /// Facts declared fluent although no action may change them.
    declared_fluent: BTreeSet<FactId>,
}

impl GroundTaskV1 {
    /// Assemble a grounded task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UnknownFact`] if an action or the initial state
    /// references a fact id not present in `facts`.
    pub fn new(
        vocabulary: Arc<VocabularyV1>,
        facts: Arc<FactTable>,
        actions: GroundActionTableV1,
        initial: impl IntoIterator<Item = FactId>,
    ) -> Result<Self, TaskError> {
        let initial = normalized(initial);
        let known = facts.len();
        let mentioned = actions
            .iter()
            .flat_map(|(_, a)| a.mentioned_facts())
            .chain(initial.iter().copied());
        for fact in mentioned {
            if fact.index() >= known {
                return Err(TaskError::UnknownFact { fact });
            }
        }
        Ok(Self {
            vocabulary,
            facts,
            actions,
            initial,
            declared_fluent: BTreeSet::new(),
        })
    }

    /// Treat `facts` as fluent in addition to the effect facts, so they stay
    /// in states instead of moving to the static layer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UnknownFact`] for a fact id not present in the
    /// task's fact table.
    pub fn with_fluent_facts(
        mut self,
        facts: impl IntoIterator<Item = FactId>,
    ) -> Result<Self, TaskError> {
        let known = self.facts.len();
        for fact in facts {
            if fact.index() >= known {
                return Err(TaskError::UnknownFact { fact });
            }
            self.declared_fluent.insert(fact);
        }
        Ok(self)
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Arc<VocabularyV1> {
        &self.vocabulary
    }

    #[must_use]
    pub fn facts(&self) -> &Arc<FactTable> {
        &self.facts
    }

    #[must_use]
    pub fn actions(&self) -> &GroundActionTableV1 {
        &self.actions
    }

    /// Initial facts (static and fluent), ascending.
    #[must_use]
    pub fn initial(&self) -> &[FactId] {
        &self.initial
    }

    /// Facts some action adds or deletes, plus any declared with
    /// [`with_fluent_facts`](Self::with_fluent_facts). Everything else is
    /// static.
    #[must_use]
    pub fn fluent_facts(&self) -> BTreeSet<FactId> {
        self.actions
            .iter()
            .flat_map(|(_, a)| a.add_effects.iter().chain(&a.delete_effects).copied())
            .chain(self.declared_fluent.iter().copied())
            .collect()
    }
}

/// A lifted task: schemas over a vocabulary plus the initial atoms.
#[derive(Debug, Clone)]
pub struct LiftedTaskV1 {
    vocabulary: Arc<VocabularyV1>,
    facts: Arc<FactTable>,
    schemas: Vec<ActionSchemaV1>,
    initial: Vec<FactId>,
}

impl LiftedTaskV1 {
    /// Assemble a lifted task, interning `initial` into a fresh fact table.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] if an initial atom is not well-formed under
    /// `vocabulary`.
    pub fn new(
        vocabulary: Arc<VocabularyV1>,
        schemas: Vec<ActionSchemaV1>,
        initial: impl IntoIterator<Item = GroundAtom>,
    ) -> Result<Self, TaskError> {
        let facts = Arc::new(FactTable::new());
        let mut ids = Vec::new();
        for atom in initial {
            check_atom(&vocabulary, &atom)?;
            ids.push(facts.intern(atom)?);
        }
        Ok(Self {
            vocabulary,
            facts,
            schemas,
            initial: normalized(ids),
        })
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Arc<VocabularyV1> {
        &self.vocabulary
    }

    #[must_use]
    pub fn facts(&self) -> &Arc<FactTable> {
        &self.facts
    }

    /// Schemas in declaration order; position is the [`SchemaId`].
    #[must_use]
    pub fn schemas(&self) -> &[ActionSchemaV1] {
        &self.schemas
    }

    #[must_use]
    pub fn schema(&self, id: SchemaId) -> Option<&ActionSchemaV1> {
        self.schemas.get(id.index())
    }

    #[must_use]
    pub fn initial(&self) -> &[FactId] {
        &self.initial
    }

    /// Predicates occurring in some schema's add or delete effects.
    #[must_use]
    pub fn fluent_predicates(&self) -> BTreeSet<PredicateId> {
        self.schemas
            .iter()
            .flat_map(|s| s.add_effects.iter().chain(&s.delete_effects))
            .map(|p| p.predicate)
            .collect()
    }
}

/// Either kind of task.
#[derive(Debug, Clone)]
pub enum PlanningTaskV1 {
    Grounded(GroundTaskV1),
    Lifted(LiftedTaskV1),
}

impl PlanningTaskV1 {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grounded(_) => "grounded",
            Self::Lifted(_) => "lifted",
        }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Arc<VocabularyV1> {
        match self {
            Self::Grounded(t) => t.vocabulary(),
            Self::Lifted(t) => t.vocabulary(),
        }
    }

    #[must_use]
    pub fn facts(&self) -> &Arc<FactTable> {
        match self {
            Self::Grounded(t) => t.facts(),
            Self::Lifted(t) => t.facts(),
        }
    }

    #[must_use]
    pub fn initial(&self) -> &[FactId] {
        match self {
            Self::Grounded(t) => t.initial(),
            Self::Lifted(t) => t.initial(),
        }
    }
}

impl From<GroundTaskV1> for PlanningTaskV1 {
    fn from(task: GroundTaskV1) -> Self {
        Self::Grounded(task)
    }
}

impl From<LiftedTaskV1> for PlanningTaskV1 {
    fn from(task: LiftedTaskV1) -> Self {
        Self::Lifted(task)
    }
}
