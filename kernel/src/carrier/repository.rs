//! `StateRepository`: exclusive owner and deduplicator of canonical states.
//!
//! # Contract
//!
//! - `get_or_create(F)` returns the same [`StateHandle`] for the same fact
//!   set `F` for the whole lifetime of the repository, regardless of the
//!   order facts were inserted into the builder.
//! - `resolve(handle)` is O(1) and returns a shared reference to the stored
//!   state. Nothing is ever removed or mutated.
//! - Insert-or-find is linearizable (see [`Interner`]); concurrent callers
//!   never obtain two handles for one fact set.
//!
//! Each repository instance draws a process-unique id that is embedded in
//! every handle it issues, so a handle presented to the wrong repository is
//! rejected as [`RepositoryError::InvalidHandle`] instead of aliasing an
//! unrelated state.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::carrier::fact::FactId;
use crate::carrier::interner::Interner;
use crate::carrier::state::{State, StateBuilder, StateEncodingV1, StateError};

static NEXT_REPOSITORY_ID: AtomicU32 = AtomicU32::new(1);

/// Lightweight, copyable reference to a state owned by a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateHandle {
    repository: u32,
    index: u32,
}

impl StateHandle {
    /// Slot index inside the owning repository (dense, in creation order).
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Id of the repository instance that issued this handle.
    #[must_use]
    pub const fn repository_id(self) -> u32 {
        self.repository
    }
}

impl fmt::Display for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}@{}", self.index, self.repository)
    }
}

/// Typed failure for repository operations. Fail-closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The handle was not issued by this repository instance.
    InvalidHandle { handle: StateHandle },
    /// A candidate state contains a fact outside the configured capacity.
    CapacityExceeded { fact: FactId, capacity: usize },
    /// More than `u32::MAX` distinct states were created.
    HandleSpaceExhausted,
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandle { handle } => {
                write!(f, "state handle {handle} is not owned by this repository")
            }
            Self::CapacityExceeded { fact, capacity } => write!(
                f,
                "fact {} exceeds state capacity of {capacity} facts",
                fact.as_u32()
            ),
            Self::HandleSpaceExhausted => write!(f, "state handle space exhausted"),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<StateError> for RepositoryError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::CapacityExceeded { fact, capacity } => {
                Self::CapacityExceeded { fact, capacity }
            }
        }
    }
}

/// Canonical pool of discovered states for one search run.
#[derive(Debug)]
pub struct StateRepository {
    id: u32,
    encoding: StateEncodingV1,
    capacity: usize,
    states: Interner<State>,
}

impl StateRepository {
    /// Create an empty repository storing states in `encoding`, accepting
    /// fact ids `< capacity`.
    #[must_use]
    pub fn new(encoding: StateEncodingV1, capacity: usize) -> Self {
        Self {
            id: NEXT_REPOSITORY_ID.fetch_add(1, Ordering::Relaxed),
            encoding,
            capacity,
            states: Interner::new(),
        }
    }

    /// Process-unique id of this instance.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub const fn encoding(&self) -> StateEncodingV1 {
        self.encoding
    }

    /// Maximum number of distinct fact ids a state may reference.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Canonical handle for the fact set in `facts`.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::CapacityExceeded`] if a fact id is `>= capacity`.
    /// - [`RepositoryError::HandleSpaceExhausted`] if the pool is full.
    pub fn get_or_create(&self, facts: StateBuilder) -> Result<StateHandle, RepositoryError> {
        self.get_or_create_with_status(facts).map(|(handle, _)| handle)
    }

    /// Like [`get_or_create`](Self::get_or_create), also reporting whether
    /// the state was newly inserted.
    ///
    /// # Errors
    ///
    /// Same as [`get_or_create`](Self::get_or_create).
    pub fn get_or_create_with_status(
        &self,
        facts: StateBuilder,
    ) -> Result<(StateHandle, bool), RepositoryError> {
        let state = facts.finish(self.encoding, self.capacity)?;
        let (index, inserted) = self
            .states
            .get_or_insert(state)
            .ok_or(RepositoryError::HandleSpaceExhausted)?;
        if inserted {
            tracing::trace!(repository = self.id, index, "interned new state");
        }
        Ok((
            StateHandle {
                repository: self.id,
                index,
            },
            inserted,
        ))
    }

    /// Canonical handle for an arbitrary collection of facts.
    ///
    /// # Errors
    ///
    /// Same as [`get_or_create`](Self::get_or_create).
    pub fn get_or_create_from_facts(
        &self,
        facts: impl IntoIterator<Item = FactId>,
    ) -> Result<StateHandle, RepositoryError> {
        let mut builder = StateBuilder::with_limit(self.capacity);
        for fact in facts {
            builder.insert(fact);
        }
        self.get_or_create(builder)
    }

    /// Handle of an already stored fact set, without inserting.
    #[must_use]
    pub fn find(&self, state: &State) -> Option<StateHandle> {
        self.states.get(state).map(|index| StateHandle {
            repository: self.id,
            index,
        })
    }

    /// The state behind `handle`. O(1).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidHandle`] for handles issued by
    /// another repository or not (yet) allocated here.
    pub fn resolve(&self, handle: StateHandle) -> Result<Arc<State>, RepositoryError> {
        if handle.repository != self.id {
            return Err(RepositoryError::InvalidHandle { handle });
        }
        self.states
            .resolve(handle.index)
            .ok_or(RepositoryError::InvalidHandle { handle })
    }

    /// Whether `handle` refers to a state stored here.
    #[must_use]
    pub fn owns(&self, handle: StateHandle) -> bool {
        handle.repository == self.id && (handle.index as usize) < self.states.len()
    }

    /// Number of distinct states stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Snapshot of every handle issued so far, in creation order.
    #[must_use]
    pub fn handles(&self) -> Vec<StateHandle> {
        let len = u32::try_from(self.states.len()).unwrap_or(u32::MAX);
        (0..len)
            .map(|index| StateHandle {
                repository: self.id,
                index,
            })
            .collect()
    }
}
