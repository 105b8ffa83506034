//! `ActionSchemaV1`: parameterized operator templates for lifted mode.
//!
//! A schema declares parameters (each optionally restricted to a domain of
//! objects), precondition and effect patterns over those parameters, and
//! pairwise `distinct` constraints. A [`Binding`] assigns one object per
//! parameter and exists only for the duration of one applicable-action query.
//!
//! # Validation
//!
//! [`ActionSchemaV1::validate`] rejects undeclared parameter references,
//! unknown predicates or objects, pattern arity mismatches and out-of-range
//! `distinct` indices. Consumers validate when a schema is first handed to
//! them; nothing downstream re-checks.

use std::fmt;

use crate::carrier::fact::{GroundAtom, ObjectId, PredicateId, VocabularyV1};
use crate::proof::canon::{canonical_json_bytes, CanonError};
use crate::proof::hash::{canonical_hash, ContentHash, DOMAIN_SCHEMA_SET};

/// Identifier of a schema: its position in the task's schema list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaId(u32);

impl SchemaId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A pattern argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    /// Index into the schema's parameter list.
    Parameter(usize),
    /// A fixed object.
    Object(ObjectId),
}

/// A predicate applied to terms, e.g. `at(?r, ?from)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomPattern {
    pub predicate: PredicateId,
    pub terms: Vec<Term>,
}

impl AtomPattern {
    #[must_use]
    pub fn new(predicate: PredicateId, terms: impl Into<Vec<Term>>) -> Self {
        Self {
            predicate,
            terms: terms.into(),
        }
    }

    /// Parameters mentioned by this pattern, in term order (may repeat).
    pub fn parameters(&self) -> impl Iterator<Item = usize> + '_ {
        self.terms.iter().filter_map(|t| match t {
            Term::Parameter(i) => Some(*i),
            Term::Object(_) => None,
        })
    }

    /// Ground this pattern under `binding`.
    ///
    /// Returns `None` if a term references a parameter the binding does not
    /// cover, which cannot happen for a validated schema.
    #[must_use]
    pub fn instantiate(&self, binding: &Binding) -> Option<GroundAtom> {
        let args: Option<Vec<ObjectId>> = self
            .terms
            .iter()
            .map(|t| match t {
                Term::Parameter(i) => binding.get(*i),
                Term::Object(o) => Some(*o),
            })
            .collect();
        Some(GroundAtom::new(self.predicate, args?))
    }
}

/// A declared schema parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterV1 {
    pub name: String,
    /// Allowed objects; `None` means every object in the vocabulary.
    pub domain: Option<Vec<ObjectId>>,
}

/// Assignment of one object per schema parameter.
///
/// Ordered lexicographically, which is the order the lifted generator yields
/// bindings in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binding(Box<[ObjectId]>);

impl Binding {
    #[must_use]
    pub fn new(objects: impl Into<Box<[ObjectId]>>) -> Self {
        Self(objects.into())
    }

    #[must_use]
    pub fn objects(&self) -> &[ObjectId] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, parameter: usize) -> Option<ObjectId> {
        self.0.get(parameter).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Typed failure for schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema references something it does not declare.
    MalformedSchema { schema: String, detail: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSchema { schema, detail } => {
                write!(f, "malformed action schema `{schema}`: {detail}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// A lifted action schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSchemaV1 {
    pub name: String,
    pub parameters: Vec<ParameterV1>,
    pub precondition: Vec<AtomPattern>,
    pub negative_precondition: Vec<AtomPattern>,
    pub add_effects: Vec<AtomPattern>,
    pub delete_effects: Vec<AtomPattern>,
    /// Parameter pairs that must be bound to different objects.
    pub distinct: Vec<(usize, usize)>,
    pub cost: u32,
}

impl ActionSchemaV1 {
    /// A unit-cost schema with no parameters, preconditions or effects.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            precondition: Vec::new(),
            negative_precondition: Vec::new(),
            add_effects: Vec::new(),
            delete_effects: Vec::new(),
            distinct: Vec::new(),
            cost: 1,
        }
    }

    /// Declare an untyped parameter (ranges over every object).
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(ParameterV1 {
            name: name.into(),
            domain: None,
        });
        self
    }

    /// Declare a parameter restricted to `domain`.
    #[must_use]
    pub fn with_typed_parameter(
        mut self,
        name: impl Into<String>,
        domain: impl IntoIterator<Item = ObjectId>,
    ) -> Self {
        self.parameters.push(ParameterV1 {
            name: name.into(),
            domain: Some(domain.into_iter().collect()),
        });
        self
    }

    #[must_use]
    pub fn with_precondition(mut self, predicate: PredicateId, terms: impl Into<Vec<Term>>) -> Self {
        self.precondition.push(AtomPattern::new(predicate, terms));
        self
    }

    #[must_use]
    pub fn with_negative_precondition(
        mut self,
        predicate: PredicateId,
        terms: impl Into<Vec<Term>>,
    ) -> Self {
        self.negative_precondition
            .push(AtomPattern::new(predicate, terms));
        self
    }

    #[must_use]
    pub fn with_add(mut self, predicate: PredicateId, terms: impl Into<Vec<Term>>) -> Self {
        self.add_effects.push(AtomPattern::new(predicate, terms));
        self
    }

    #[must_use]
    pub fn with_delete(mut self, predicate: PredicateId, terms: impl Into<Vec<Term>>) -> Self {
        self.delete_effects.push(AtomPattern::new(predicate, terms));
        self
    }

    #[must_use]
    pub fn with_distinct(mut self, a: usize, b: usize) -> Self {
        self.distinct.push((a, b));
        self
    }

    #[must_use]
    pub const fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// All patterns with the section they belong to.
    fn sections(&self) -> impl Iterator<Item = (&'static str, &AtomPattern)> {
        [
            ("precondition", &self.precondition),
            ("negative precondition", &self.negative_precondition),
            ("add effect", &self.add_effects),
            ("delete effect", &self.delete_effects),
        ]
        .into_iter()
        .flat_map(|(section, list)| list.iter().map(move |p| (section, p)))
    }

    /// Check every reference in the schema against its own parameter list
    /// and `vocabulary`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MalformedSchema`] naming this schema and the
    /// first offending reference.
    pub fn validate(&self, vocabulary: &VocabularyV1) -> Result<(), SchemaError> {
        let malformed = |detail: String| SchemaError::MalformedSchema {
            schema: self.name.clone(),
            detail,
        };
        let object_known = |o: ObjectId| o.index() < vocabulary.object_count();

        for (i, param) in self.parameters.iter().enumerate() {
            if let Some(domain) = &param.domain {
                if let Some(o) = domain.iter().find(|o| !object_known(**o)) {
                    return Err(malformed(format!(
                        "parameter {i} (`{}`) lists unknown object {}",
                        param.name,
                        o.as_u32()
                    )));
                }
            }
        }

        for (section, pattern) in self.sections() {
            let Some(decl) = vocabulary.predicate(pattern.predicate) else {
                return Err(malformed(format!(
                    "{section} uses unknown predicate {}",
                    pattern.predicate.as_u32()
                )));
            };
            if decl.arity != pattern.terms.len() {
                return Err(malformed(format!(
                    "{section} `{}` has {} terms, predicate arity is {}",
                    decl.name,
                    pattern.terms.len(),
                    decl.arity
                )));
            }
            for term in &pattern.terms {
                match *term {
                    Term::Parameter(p) if p >= self.parameters.len() => {
                        return Err(malformed(format!(
                            "{section} `{}` references undeclared parameter {p}",
                            decl.name
                        )));
                    }
                    Term::Object(o) if !object_known(o) => {
                        return Err(malformed(format!(
                            "{section} `{}` references unknown object {}",
                            decl.name,
                            o.as_u32()
                        )));
                    }
                    _ => {}
                }
            }
        }

        if let Some((a, b)) = self
            .distinct
            .iter()
            .find(|(a, b)| *a >= self.parameters.len() || *b >= self.parameters.len())
        {
            return Err(malformed(format!(
                "distinct constraint ({a}, {b}) references an undeclared parameter"
            )));
        }
        Ok(())
    }

    /// Canonical JSON value of this schema (ids, not names, for patterns).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let params: Vec<serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                serde_json::json!({
                    "domain": p.domain.as_ref().map(|d| d.iter().map(|o| u64::from(o.as_u32())).collect::<Vec<_>>()),
                    "name": p.name,
                })
            })
            .collect();
        let distinct: Vec<serde_json::Value> = self
            .distinct
            .iter()
            .map(|(a, b)| serde_json::json!([*a as u64, *b as u64]))
            .collect();
        serde_json::json!({
            "add_effects": patterns_to_json(&self.add_effects),
            "cost": u64::from(self.cost),
            "delete_effects": patterns_to_json(&self.delete_effects),
            "distinct": distinct,
            "name": self.name,
            "negative_precondition": patterns_to_json(&self.negative_precondition),
            "parameters": params,
            "precondition": patterns_to_json(&self.precondition),
        })
    }
}

fn patterns_to_json(patterns: &[AtomPattern]) -> serde_json::Value {
    patterns
        .iter()
        .map(|p| {
            let terms: Vec<serde_json::Value> = p
                .terms
                .iter()
                .map(|t| match t {
                    Term::Parameter(i) => serde_json::json!({ "param": *i as u64 }),
                    Term::Object(o) => serde_json::json!({ "object": u64::from(o.as_u32()) }),
                })
                .collect();
            serde_json::json!({
                "predicate": u64::from(p.predicate.as_u32()),
                "terms": terms,
            })
        })
        .collect()
}

/// Content hash of a schema list, in declaration order.
///
/// # Errors
///
/// Returns [`CanonError`] if serialization fails.
pub fn schema_set_digest(schemas: &[ActionSchemaV1]) -> Result<ContentHash, CanonError> {
    let value = serde_json::json!({
        "schema_version": "action_schema_set.v1",
        "schemas": schemas.iter().map(ActionSchemaV1::to_json).collect::<Vec<_>>(),
    });
    Ok(canonical_hash(DOMAIN_SCHEMA_SET, &canonical_json_bytes(&value)?))
}
