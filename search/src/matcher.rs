//! Resumable backtracking search that enumerates the bindings of one schema.
//!
//! Parameters are assigned in declaration order, each over the values the
//! already-bound patterns still allow: a positive pattern mentioning the
//! parameter contributes the matching argument of every atom in its index
//! (fluent: built from the queried state; static: built once from the
//! initial state) that agrees with the earlier assignments. A pattern is
//! checked in full once its last parameter is bound, negative patterns
//! included. Candidate values are ascending, so bindings come out in
//! lexicographic order without sorting, and a [`BindingCursor`] holds only
//! one frame per parameter between calls.
//!
//! With no fluent view (the grounding pass), fluent patterns are skipped:
//! the result is every binding consistent with the static layer, domains and
//! `distinct` constraints.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use lodestar_kernel::carrier::fact::{FactTable, GroundAtom, ObjectId, PredicateId};
use lodestar_kernel::carrier::state::State;
use lodestar_kernel::operators::schema::{ActionSchemaV1, AtomPattern, Binding, SchemaId, Term};

/// Which layer a pattern is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layer {
    Fluent,
    Static,
}

/// Atoms grouped by predicate.
#[derive(Debug, Default)]
pub(crate) struct AtomIndex {
    by_predicate: BTreeMap<PredicateId, Vec<Arc<GroundAtom>>>,
}

impl AtomIndex {
    pub(crate) fn insert(&mut self, atom: Arc<GroundAtom>) {
        self.by_predicate
            .entry(atom.predicate())
            .or_default()
            .push(atom);
    }

    pub(crate) fn candidates(&self, predicate: PredicateId) -> &[Arc<GroundAtom>] {
        self.by_predicate
            .get(&predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn len(&self) -> usize {
        self.by_predicate.values().map(Vec::len).sum()
    }
}

/// Read-only static facts of a lifted task.
#[derive(Debug, Default)]
pub(crate) struct StaticLayer {
    index: AtomIndex,
    members: HashSet<Arc<GroundAtom>>,
}

impl StaticLayer {
    pub(crate) fn new(atoms: impl IntoIterator<Item = Arc<GroundAtom>>) -> Self {
        let mut layer = Self::default();
        for atom in atoms {
            if layer.members.insert(Arc::clone(&atom)) {
                layer.index.insert(atom);
            }
        }
        layer
    }

    pub(crate) fn contains(&self, atom: &GroundAtom) -> bool {
        self.members.contains(atom)
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }
}

/// The queried state, for fluent patterns.
pub(crate) struct FluentView<'a> {
    pub(crate) index: &'a AtomIndex,
    pub(crate) state: &'a State,
    pub(crate) facts: &'a FactTable,
}

impl FluentView<'_> {
    fn holds(&self, atom: &GroundAtom) -> bool {
        self.facts
            .get(atom)
            .is_some_and(|fact| self.state.contains(fact))
    }
}

pub(crate) struct MatchContext<'a> {
    /// Every object, ascending.
    pub(crate) objects: &'a [ObjectId],
    pub(crate) statics: &'a StaticLayer,
    /// `None` restricts matching to static patterns.
    pub(crate) fluent: Option<FluentView<'a>>,
}

/// A pattern with the parameter whose assignment completes it.
#[derive(Debug, Clone)]
struct PatternPlan {
    layer: Layer,
    pattern: AtomPattern,
    /// Highest parameter mentioned; `None` for a ground pattern.
    last: Option<usize>,
}

impl PatternPlan {
    fn mentions(&self, param: usize) -> bool {
        self.pattern.terms.contains(&Term::Parameter(param))
    }

    /// Atoms this pattern is matched against, or `None` when out of scope.
    fn candidates<'c>(&self, ctx: &'c MatchContext<'_>) -> Option<&'c [Arc<GroundAtom>]> {
        match (self.layer, &ctx.fluent) {
            (Layer::Static, _) => Some(ctx.statics.index.candidates(self.pattern.predicate)),
            (Layer::Fluent, Some(view)) => Some(view.index.candidates(self.pattern.predicate)),
            (Layer::Fluent, None) => None,
        }
    }

    /// Whether the instantiated pattern holds; `None` when out of scope.
    fn holds(&self, assignment: &[ObjectId], ctx: &MatchContext<'_>) -> Option<bool> {
        let atom = ground(&self.pattern, assignment)?;
        match (self.layer, &ctx.fluent) {
            (Layer::Static, _) => Some(ctx.statics.contains(&atom)),
            (Layer::Fluent, Some(view)) => Some(view.holds(&atom)),
            (Layer::Fluent, None) => None,
        }
    }
}

/// Instantiate `pattern` under a prefix assignment of the parameters.
fn ground(pattern: &AtomPattern, assignment: &[ObjectId]) -> Option<GroundAtom> {
    let args = pattern
        .terms
        .iter()
        .map(|term| match *term {
            Term::Object(o) => Some(o),
            Term::Parameter(p) => assignment.get(p).copied(),
        })
        .collect::<Option<Vec<_>>>()?;
    Some(GroundAtom::new(pattern.predicate, args))
}

/// A validated schema prepared for matching.
#[derive(Debug, Clone)]
pub(crate) struct CompiledSchema {
    pub(crate) id: SchemaId,
    /// Sorted, deduplicated; `None` is every object.
    domains: Vec<Option<Vec<ObjectId>>>,
    positive: Vec<PatternPlan>,
    negative: Vec<PatternPlan>,
    distinct: Vec<(usize, usize)>,
}

impl CompiledSchema {
    /// `schema` must already be validated.
    pub(crate) fn compile(
        id: SchemaId,
        schema: &ActionSchemaV1,
        fluent: &BTreeSet<PredicateId>,
    ) -> Self {
        let plans = |patterns: &[AtomPattern]| -> Vec<PatternPlan> {
            patterns
                .iter()
                .map(|p| PatternPlan {
                    layer: if fluent.contains(&p.predicate) {
                        Layer::Fluent
                    } else {
                        Layer::Static
                    },
                    pattern: p.clone(),
                    last: p.parameters().max(),
                })
                .collect()
        };
        let domains = schema
            .parameters
            .iter()
            .map(|param| {
                param.domain.as_ref().map(|d| {
                    let mut d = d.clone();
                    d.sort_unstable();
                    d.dedup();
                    d
                })
            })
            .collect();
        Self {
            id,
            domains,
            positive: plans(&schema.precondition),
            negative: plans(&schema.negative_precondition),
            distinct: schema.distinct.clone(),
        }
    }

    /// Objects parameter `param` ranges over, ascending.
    pub(crate) fn domain<'o>(&'o self, param: usize, objects: &'o [ObjectId]) -> &'o [ObjectId] {
        match self.domains.get(param) {
            Some(Some(domain)) => domain,
            _ => objects,
        }
    }

    /// Every binding satisfying the patterns in scope, ascending.
    pub(crate) fn bindings(&self, ctx: &MatchContext<'_>) -> Vec<Binding> {
        let mut cursor = BindingCursor::default();
        std::iter::from_fn(|| cursor.next(self, ctx)).collect()
    }

    /// Patterns completed by `last` hold (positive) or fail (negative) and
    /// the `distinct` pairs closed by `last` differ.
    fn consistent(
        &self,
        last: Option<usize>,
        assignment: &[ObjectId],
        ctx: &MatchContext<'_>,
    ) -> bool {
        let distinct_ok = self
            .distinct
            .iter()
            .filter(|(a, b)| Some(*a.max(b)) == last)
            .all(|&(a, b)| a != b && assignment[a] != assignment[b]);
        distinct_ok
            && self
                .positive
                .iter()
                .filter(|plan| plan.last == last)
                .all(|plan| plan.holds(assignment, ctx) != Some(false))
            && self
                .negative
                .iter()
                .filter(|plan| plan.last == last)
                .all(|plan| plan.holds(assignment, ctx) != Some(true))
    }

    /// Ascending values for parameter `param` given `assignment` of the
    /// earlier ones.
    fn candidates(
        &self,
        param: usize,
        assignment: &[ObjectId],
        ctx: &MatchContext<'_>,
    ) -> Vec<ObjectId> {
        let mut allowed: Option<BTreeSet<ObjectId>> = None;
        for plan in self.positive.iter().filter(|plan| plan.mentions(param)) {
            let Some(atoms) = plan.candidates(ctx) else {
                continue;
            };
            let values: BTreeSet<ObjectId> = atoms
                .iter()
                .filter_map(|atom| project(&plan.pattern, atom, param, assignment))
                .collect();
            allowed = Some(match allowed {
                Some(prev) => prev.intersection(&values).copied().collect(),
                None => values,
            });
        }
        let domain = self.domain(param, ctx.objects);
        match allowed {
            None => domain.to_vec(),
            Some(values) => match &self.domains[param] {
                Some(d) => values
                    .into_iter()
                    .filter(|o| d.binary_search(o).is_ok())
                    .collect(),
                None => values.into_iter().collect(),
            },
        }
    }
}

/// The value `atom` gives `param` if it agrees with `pattern` under the
/// assignment of the parameters before `param`.
fn project(
    pattern: &AtomPattern,
    atom: &GroundAtom,
    param: usize,
    assignment: &[ObjectId],
) -> Option<ObjectId> {
    if pattern.terms.len() != atom.arity() {
        return None;
    }
    let mut value = None;
    for (term, &object) in pattern.terms.iter().zip(atom.args()) {
        match *term {
            Term::Object(fixed) if fixed != object => return None,
            Term::Parameter(p) if p < param && assignment[p] != object => return None,
            Term::Parameter(p) if p == param => match value {
                Some(v) if v != object => return None,
                _ => value = Some(object),
            },
            _ => {}
        }
    }
    value
}

#[derive(Debug)]
struct Frame {
    values: Vec<ObjectId>,
    next: usize,
}

/// Paused enumeration of one schema's bindings. Holds one frame per bound
/// parameter; [`next`](Self::next) resumes where the last call stopped.
#[derive(Debug, Default)]
pub(crate) struct BindingCursor {
    started: bool,
    assignment: Vec<ObjectId>,
    frames: Vec<Frame>,
}

impl BindingCursor {
    /// Next binding of `schema` in lexicographic order. `schema` and the
    /// atoms behind `ctx` must be the same on every call.
    pub(crate) fn next(
        &mut self,
        schema: &CompiledSchema,
        ctx: &MatchContext<'_>,
    ) -> Option<Binding> {
        let arity = schema.domains.len();
        if !self.started {
            self.started = true;
            if !schema.consistent(None, &[], ctx) {
                return None;
            }
            if arity == 0 {
                return Some(Binding::new(Vec::new()));
            }
            let values = schema.candidates(0, &[], ctx);
            self.frames.push(Frame { values, next: 0 });
        }
        while !self.frames.is_empty() {
            let depth = self.frames.len() - 1;
            let frame = &mut self.frames[depth];
            let Some(&object) = frame.values.get(frame.next) else {
                self.frames.pop();
                continue;
            };
            frame.next += 1;
            self.assignment.truncate(depth);
            self.assignment.push(object);
            if !schema.consistent(Some(depth), &self.assignment, ctx) {
                continue;
            }
            if depth + 1 == arity {
                return Some(Binding::new(self.assignment.clone()));
            }
            let values = schema.candidates(depth + 1, &self.assignment, ctx);
            self.frames.push(Frame { values, next: 0 });
        }
        None
    }
}
