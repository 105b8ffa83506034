//! `State`: the canonical, immutable encoding of a set of fluent facts.
//!
//! # Encodings
//!
//! - `DenseBitset`: one bit per fact id, packed into `u64` words. Trailing
//!   zero words are trimmed, so equal sets have equal word vectors.
//! - `SparseSorted`: strictly increasing fact ids. Smaller for large fact
//!   universes where states hold few facts.
//!
//! Within one encoding, two states hold the same facts iff they are
//! bitwise identical; `Eq` and `Hash` are derived and compare raw storage.
//! A repository uses a single encoding, so states of different encodings
//! never meet in one dedup table. [`State::fingerprint`] hashes the sorted
//! fact ids and is therefore encoding-independent.
//!
//! # Construction
//!
//! States are never mutated. Successor candidates are accumulated in a
//! [`StateBuilder`] and finished into a `State` by the repository, which is
//! where the capacity check happens.

use std::collections::BTreeSet;
use std::fmt;

use crate::carrier::fact::FactId;
use crate::proof::hash::{canonical_hash, ContentHash, DOMAIN_STATE};

const WORD_BITS: usize = 64;

/// Which encoding a repository stores its states in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StateEncodingV1 {
    /// Fixed-width bitset (trimmed), one bit per fact id.
    #[default]
    DenseBitset,
    /// Sorted fact-id list.
    SparseSorted,
}

impl StateEncodingV1 {
    /// Canonical string for JSON configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DenseBitset => "dense_bitset",
            Self::SparseSorted => "sparse_sorted",
        }
    }

    /// Parse from canonical string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dense_bitset" => Some(Self::DenseBitset),
            "sparse_sorted" => Some(Self::SparseSorted),
            _ => None,
        }
    }
}

/// Typed failure for finishing a [`StateBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A fact id does not fit the configured capacity.
    CapacityExceeded { fact: FactId, capacity: usize },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { fact, capacity } => write!(
                f,
                "fact {} exceeds state capacity of {capacity} facts",
                fact.as_u32()
            ),
        }
    }
}

impl std::error::Error for StateError {}

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr {
    Dense(Box<[u64]>),
    Sparse(Box<[FactId]>),
}

/// Immutable canonical fact set.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct State {
    repr: Repr,
}

impl State {
    /// The empty state in `encoding`.
    #[must_use]
    pub fn empty(encoding: StateEncodingV1) -> Self {
        let repr = match encoding {
            StateEncodingV1::DenseBitset => Repr::Dense(Box::new([])),
            StateEncodingV1::SparseSorted => Repr::Sparse(Box::new([])),
        };
        Self { repr }
    }

    #[must_use]
    pub fn encoding(&self) -> StateEncodingV1 {
        match self.repr {
            Repr::Dense(_) => StateEncodingV1::DenseBitset,
            Repr::Sparse(_) => StateEncodingV1::SparseSorted,
        }
    }

    #[must_use]
    pub fn contains(&self, fact: FactId) -> bool {
        match &self.repr {
            Repr::Dense(words) => {
                let i = fact.index();
                words
                    .get(i / WORD_BITS)
                    .is_some_and(|w| w & (1u64 << (i % WORD_BITS)) != 0)
            }
            Repr::Sparse(ids) => ids.binary_search(&fact).is_ok(),
        }
    }

    /// Number of facts in the state.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Dense(words) => words.iter().map(|w| w.count_ones() as usize).sum(),
            Repr::Sparse(ids) => ids.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Dense(words) => words.is_empty(),
            Repr::Sparse(ids) => ids.is_empty(),
        }
    }

    /// Facts in ascending id order.
    #[must_use]
    pub fn facts(&self) -> Facts<'_> {
        match &self.repr {
            Repr::Dense(words) => Facts(FactsInner::Dense {
                words,
                word: 0,
                bits: words.first().copied().unwrap_or(0),
            }),
            Repr::Sparse(ids) => Facts(FactsInner::Sparse(ids.iter())),
        }
    }

    /// Whether every fact in `facts` is present.
    #[must_use]
    pub fn contains_all(&self, facts: &[FactId]) -> bool {
        facts.iter().all(|f| self.contains(*f))
    }

    /// Whether no fact in `facts` is present.
    #[must_use]
    pub fn contains_none(&self, facts: &[FactId]) -> bool {
        !facts.iter().any(|f| self.contains(*f))
    }

    /// Bytes of raw storage (diagnostic; excludes the enum header).
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match &self.repr {
            Repr::Dense(words) => words.len() * 8,
            Repr::Sparse(ids) => ids.len() * 4,
        }
    }

    /// Encoding-independent bytes: fact ids ascending, `u32` little-endian.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len() * 4);
        for fact in self.facts() {
            buf.extend_from_slice(&fact.as_u32().to_le_bytes());
        }
        buf
    }

    /// Content hash of [`canonical_bytes`](Self::canonical_bytes).
    #[must_use]
    pub fn fingerprint(&self) -> ContentHash {
        canonical_hash(DOMAIN_STATE, &self.canonical_bytes())
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.facts()).finish()
    }
}

/// Iterator over the facts of a [`State`] in ascending order.
pub struct Facts<'a>(FactsInner<'a>);

enum FactsInner<'a> {
    Dense { words: &'a [u64], word: usize, bits: u64 },
    Sparse(std::slice::Iter<'a, FactId>),
}

impl Iterator for Facts<'_> {
    type Item = FactId;

    fn next(&mut self) -> Option<FactId> {
        match &mut self.0 {
            FactsInner::Dense { words, word, bits } => loop {
                if *bits != 0 {
                    let offset = bits.trailing_zeros() as usize;
                    *bits &= *bits - 1;
                    let raw = *word * WORD_BITS + offset;
                    return u32::try_from(raw).ok().map(FactId::new);
                }
                *word += 1;
                *bits = *words.get(*word)?;
            },
            FactsInner::Sparse(iter) => iter.next().copied(),
        }
    }
}

/// Transient mutable accumulator for a candidate fact set.
///
/// Dense internally for ids below its limit; the repository chooses the
/// final encoding in [`StateBuilder::finish`]. Ids at or above the limit are
/// kept aside so that a stray huge id never grows the bitset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBuilder {
    words: Vec<u64>,
    limit: usize,
    beyond: BTreeSet<FactId>,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::with_limit(usize::MAX)
    }
}

impl StateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder whose bitset never grows past `limit` bits. Facts with
    /// larger ids are still tracked and make [`finish`](Self::finish) fail
    /// for any capacity `<= limit`.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            words: Vec::new(),
            limit,
            beyond: BTreeSet::new(),
        }
    }

    /// Start from the facts of an existing state.
    #[must_use]
    pub fn from_state(state: &State) -> Self {
        match &state.repr {
            Repr::Dense(words) => Self {
                words: words.to_vec(),
                ..Self::new()
            },
            Repr::Sparse(ids) => {
                let mut builder = Self::new();
                for fact in ids.iter() {
                    builder.insert(*fact);
                }
                builder
            }
        }
    }

    pub fn insert(&mut self, fact: FactId) {
        let i = fact.index();
        if i >= self.limit {
            self.beyond.insert(fact);
            return;
        }
        set_bit(&mut self.words, i);
    }

    pub fn remove(&mut self, fact: FactId) {
        let i = fact.index();
        if i >= self.limit {
            self.beyond.remove(&fact);
            return;
        }
        if let Some(w) = self.words.get_mut(i / WORD_BITS) {
            *w &= !(1u64 << (i % WORD_BITS));
        }
    }

    #[must_use]
    pub fn contains(&self, fact: FactId) -> bool {
        let i = fact.index();
        if i >= self.limit {
            return self.beyond.contains(&fact);
        }
        self.words
            .get(i / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (i % WORD_BITS)) != 0)
    }

    /// Highest fact id present, if any.
    #[must_use]
    pub fn max_fact(&self) -> Option<FactId> {
        if let Some(max) = self.beyond.last() {
            return Some(*max);
        }
        let (word, bits) = self
            .words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)?;
        let raw = word * WORD_BITS + (WORD_BITS - 1 - bits.leading_zeros() as usize);
        u32::try_from(raw).ok().map(FactId::new)
    }

    /// Finish into the canonical encoding.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::CapacityExceeded`] if any fact id is `>= capacity`.
    pub fn finish(mut self, encoding: StateEncodingV1, capacity: usize) -> Result<State, StateError> {
        if let Some(max) = self.max_fact() {
            if max.index() >= capacity {
                return Err(StateError::CapacityExceeded {
                    fact: max,
                    capacity,
                });
            }
        }
        for fact in std::mem::take(&mut self.beyond) {
            set_bit(&mut self.words, fact.index());
        }
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
        let repr = match encoding {
            StateEncodingV1::DenseBitset => Repr::Dense(self.words.into_boxed_slice()),
            StateEncodingV1::SparseSorted => {
                let dense = Repr::Dense(self.words.into_boxed_slice());
                let ids: Vec<FactId> = State { repr: dense }.facts().collect();
                Repr::Sparse(ids.into_boxed_slice())
            }
        };
        Ok(State { repr })
    }
}

fn set_bit(words: &mut Vec<u64>, i: usize) {
    let word = i / WORD_BITS;
    if word >= words.len() {
        words.resize(word + 1, 0);
    }
    words[word] |= 1u64 << (i % WORD_BITS);
}

impl FromIterator<FactId> for StateBuilder {
    fn from_iter<I: IntoIterator<Item = FactId>>(iter: I) -> Self {
        let mut builder = Self::new();
        for fact in iter {
            builder.insert(fact);
        }
        builder
    }
}
