//! Quad store collaborators for the quadpath compiler.
//!
//! The path compiler in `quadpath` only needs a narrow view of storage:
//!
//! - resolve an external node name to an internal [`NodeId`],
//! - hand out a fresh "all nodes" iterator and a small fixed iterator,
//! - answer "which quads have node `n` in role `d`" for plan execution.
//!
//! That view is the [`QuadStore`] trait. This crate also ships:
//!
//! - [`MemStore`]: an in-memory, bitmap-indexed reference store,
//! - [`Iter`]: the iterator plan tree the compiler produces, with a naive
//!   set-based evaluator so plans can be checked end-to-end,
//! - [`StoreConfig`]: serde configuration for loading quads from disk.
//!
//! Execution here is deliberately simple (whole-set bitmap evaluation, no
//! cost model, no streaming).

pub mod config;
pub mod iterator;
pub mod store;


use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

pub use config::{QuadFormat, StoreConfig};
pub use iterator::{Fixed, Iter, IterKind, Tagger};
pub use roaring::RoaringBitmap;
pub use store::MemStore;

// ============================================================================
// Identifiers
// ============================================================================

/// Interned node ID. Subjects, predicates, objects and labels share one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Position of a quad in its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct QuadId(u32);

impl QuadId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

// ============================================================================
// Quads
// ============================================================================

/// The four roles a node can play in a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Subject,
    Predicate,
    Object,
    Label,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Subject,
        Direction::Predicate,
        Direction::Object,
        Direction::Label,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            Direction::Subject => 0,
            Direction::Predicate => 1,
            Direction::Object => 2,
            Direction::Label => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Subject => "subject",
            Direction::Predicate => "predicate",
            Direction::Object => "object",
            Direction::Label => "label",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subject–predicate–object(–label) edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: NodeId,
    pub predicate: NodeId,
    pub object: NodeId,
    pub label: Option<NodeId>,
}

impl Quad {
    /// Node in the given role. Only `Label` can be absent.
    pub fn get(&self, dir: Direction) -> Option<NodeId> {
        match dir {
            Direction::Subject => Some(self.subject),
            Direction::Predicate => Some(self.predicate),
            Direction::Object => Some(self.object),
            Direction::Label => self.label,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures reported by a storage backend.
///
/// Name lookups that simply miss are not errors; see [`QuadStore::value_of`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("quad store unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("quad store index is inconsistent: {reason}")]
    Inconsistent { reason: String },
    #[error("quad store is full: {reason}")]
    Full { reason: String },
}

// ============================================================================
// The storage interface
// ============================================================================

/// Read-only view of a quad store, as consumed by the path compiler and the
/// reference plan evaluator.
///
/// Implementations must be safe for concurrent readers; compiled paths may be
/// built from several threads against the same handle.
pub trait QuadStore: Send + Sync {
    /// Resolve an external node name. `Ok(None)` is a lookup miss.
    fn value_of(&self, name: &str) -> Result<Option<NodeId>, StoreError>;

    /// Reverse of [`QuadStore::value_of`].
    fn name_of(&self, id: NodeId) -> Result<Option<String>, StoreError>;

    /// A fresh iterator over every known node.
    fn nodes_all_iterator(&self) -> Iter {
        Iter::all_nodes()
    }

    /// An empty enumerated iterator to be filled with [`Fixed::add`].
    fn fixed_iterator(&self) -> Fixed {
        Fixed::new()
    }

    /// Every node ID known to the store.
    fn all_nodes(&self) -> Result<RoaringBitmap, StoreError>;

    fn quad(&self, id: QuadId) -> Result<Option<Quad>, StoreError>;

    /// IDs of all quads whose `dir` role is `node`.
    fn quads_with(&self, dir: Direction, node: NodeId) -> Result<RoaringBitmap, StoreError>;

    /// Resolve a node set back into names, in ID order. Unknown IDs are skipped.
    fn names(&self, ids: &RoaringBitmap) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::with_capacity(ids.len() as usize);
        for raw in ids.iter() {
            if let Some(name) = self.name_of(NodeId::new(raw))? {
                out.push(name);
            }
        }
        Ok(out)
    }
}

// ============================================================================
// Name interning
// ============================================================================

/// Maps node names to compact IDs. Safe to share between readers and a writer.
pub struct NodeInterner {
    name_to_id: DashMap<String, NodeId>,
    id_to_name: DashMap<NodeId, String>,
    next_id: AtomicU32,
}

impl NodeInterner {
    pub fn new() -> Self {
        Self {
            name_to_id: DashMap::new(),
            id_to_name: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Intern a name, returning its ID.
    ///
    /// The reverse mapping is written before the name becomes visible, so any
    /// ID handed out by this interner always resolves through [`lookup`].
    ///
    /// [`lookup`]: NodeInterner::lookup
    pub fn intern(&self, name: &str) -> Result<NodeId, StoreError> {
        if let Some(id) = self.name_to_id.get(name) {
            return Ok(*id);
        }

        match self.name_to_id.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let raw = self
                    .next_id
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
                    .map_err(|_| StoreError::Full {
                        reason: "node id space exhausted".to_string(),
                    })?;
                let id = NodeId(raw);
                self.id_to_name.insert(id, name.to_string());
                entry.insert(id);
                Ok(id)
            }
        }
    }

    /// Look up an existing ID without inserting.
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.name_to_id.get(name).map(|id| *id)
    }

    pub fn lookup(&self, id: NodeId) -> Option<String> {
        self.id_to_name.get(&id).map(|s| s.clone())
    }

    /// Every ID that currently resolves to a name.
    pub fn ids(&self) -> RoaringBitmap {
        self.id_to_name.iter().map(|entry| entry.key().0).collect()
    }

    /// Number of resolvable names.
    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NodeInterner {
    fn default() -> Self {
        Self::new()
    }
}
