//! Facts, objects, predicates and the fact table.
//!
//! # Identity
//!
//! Every id is a dense `u32` assigned in declaration (or interning) order.
//! Ids are stable for the lifetime of the [`VocabularyV1`] / [`FactTable`]
//! that issued them and are never reused.
//!
//! A [`GroundAtom`] is a predicate applied to objects; the [`FactTable`] maps
//! each distinct ground atom to a [`FactId`]. The table is append-only and
//! safe to share between threads, because lifted successor generation interns
//! effect atoms on demand.

use std::fmt;
use std::sync::Arc;

use crate::carrier::interner::Interner;

/// Stable identifier of a ground fact.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactId(u32);

impl FactId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Index form for table lookups.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Stable identifier of a domain object (constant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
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

/// Stable identifier of a predicate symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PredicateId(u32);

impl PredicateId {
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

/// A predicate applied to objects, e.g. `at(robot, room1)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroundAtom {
    predicate: PredicateId,
    args: Box<[ObjectId]>,
}

impl GroundAtom {
    #[must_use]
    pub fn new(predicate: PredicateId, args: impl Into<Box<[ObjectId]>>) -> Self {
        Self {
            predicate,
            args: args.into(),
        }
    }

    #[must_use]
    pub const fn predicate(&self) -> PredicateId {
        self.predicate
    }

    #[must_use]
    pub fn args(&self) -> &[ObjectId] {
        &self.args
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// A declared predicate symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateDecl {
    pub name: String,
    pub arity: usize,
}

/// Names and arities of every predicate and object in a task.
///
/// Used for validation (arity, unknown ids) and for rendering atoms and
/// actions for host wrappers. Never consulted on the matching hot path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyV1 {
    predicates: Vec<PredicateDecl>,
    objects: Vec<String>,
}

impl VocabularyV1 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a predicate. Ids are assigned in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` predicates are declared.
    pub fn add_predicate(&mut self, name: impl Into<String>, arity: usize) -> PredicateId {
        let id = u32::try_from(self.predicates.len()).expect("predicate id space exhausted");
        self.predicates.push(PredicateDecl {
            name: name.into(),
            arity,
        });
        PredicateId(id)
    }

    /// Declare an object. Ids are assigned in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` objects are declared.
    pub fn add_object(&mut self, name: impl Into<String>) -> ObjectId {
        let id = u32::try_from(self.objects.len()).expect("object id space exhausted");
        self.objects.push(name.into());
        ObjectId(id)
    }

    #[must_use]
    pub fn predicate(&self, id: PredicateId) -> Option<&PredicateDecl> {
        self.predicates.get(id.index())
    }

    #[must_use]
    pub fn object_name(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(id.index()).map(String::as_str)
    }

    /// Look up a predicate by name (first declaration wins).
    #[must_use]
    pub fn find_predicate(&self, name: &str) -> Option<PredicateId> {
        self.predicates
            .iter()
            .position(|p| p.name == name)
            .and_then(|i| u32::try_from(i).ok())
            .map(PredicateId)
    }

    /// Look up an object by name (first declaration wins).
    #[must_use]
    pub fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| o == name)
            .and_then(|i| u32::try_from(i).ok())
            .map(ObjectId)
    }

    #[must_use]
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All object ids in declaration order.
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len()).filter_map(|i| u32::try_from(i).ok().map(ObjectId))
    }

    /// Render an atom as `name(arg, ...)`. Unknown ids render as `?<id>`.
    #[must_use]
    pub fn display_atom(&self, atom: &GroundAtom) -> String {
        let name = self
            .predicate(atom.predicate)
            .map_or_else(|| format!("?{}", atom.predicate.0), |p| p.name.clone());
        self.display_call(&name, atom.args())
    }

    /// Render `name(arg, ...)` with object names.
    #[must_use]
    pub fn display_call(&self, name: &str, args: &[ObjectId]) -> String {
        let rendered: Vec<String> = args
            .iter()
            .map(|o| {
                self.object_name(*o)
                    .map_or_else(|| format!("?{}", o.0), str::to_string)
            })
            .collect();
        format!("{name}({})", rendered.join(", "))
    }
}

/// Typed failure for fact interning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactTableError {
    /// More than `u32::MAX` distinct atoms were interned.
    IdSpaceExhausted,
}

impl fmt::Display for FactTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdSpaceExhausted => write!(f, "fact id space exhausted"),
        }
    }
}

impl std::error::Error for FactTableError {}

/// Append-only `GroundAtom` ↔ `FactId` table.
#[derive(Debug, Default)]
pub struct FactTable {
    atoms: Interner<GroundAtom>,
}

impl FactTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `atom`, interning it if it is new.
    ///
    /// # Errors
    ///
    /// Returns [`FactTableError::IdSpaceExhausted`] once `u32::MAX` atoms exist.
    pub fn intern(&self, atom: GroundAtom) -> Result<FactId, FactTableError> {
        self.atoms
            .get_or_insert(atom)
            .map(|(raw, _)| FactId(raw))
            .ok_or(FactTableError::IdSpaceExhausted)
    }

    /// Id of `atom` if it has been interned, without inserting.
    #[must_use]
    pub fn get(&self, atom: &GroundAtom) -> Option<FactId> {
        self.atoms.get(atom).map(FactId)
    }

    /// The atom behind `fact`.
    #[must_use]
    pub fn atom(&self, fact: FactId) -> Option<Arc<GroundAtom>> {
        self.atoms.resolve(fact.0)
    }

    /// Resolve many facts under a single lock acquisition. Unknown ids are skipped.
    pub fn atoms_of(&self, facts: impl IntoIterator<Item = FactId>) -> Vec<(FactId, Arc<GroundAtom>)> {
        self.atoms
            .resolve_many(facts.into_iter().map(|f| f.0))
            .into_iter()
            .map(|(raw, atom)| (FactId(raw), atom))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
