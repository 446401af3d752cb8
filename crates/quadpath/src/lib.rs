//! quadpath: composable, reversible graph traversals over a quad store.
//!
//! A [`Path`] is an ordered list of [`Step`]s ("start at these nodes, follow
//! this predicate outward, intersect with that sub-traversal, tag the
//! result") plus an optional bound [`QuadStore`]. Compiling a bound path folds
//! its steps over an "all nodes" seed and yields an [`Iter`] plan.
//!
//! A path with no store is a *morphism*: a reusable template that can be
//! embedded in other paths (`and`, `or`, `except`, `follow`), bound later, or
//! reversed.
//!
//! ## Reversal
//!
//! [`Path::reverse`] mirrors the step order and replaces every step with its
//! inverse:
//!
//! - `out(v)` and `in_(v)` swap,
//! - `follow(p)` becomes `follow(p.reverse())`,
//! - every other step is its own inverse.
//!
//! So `(a · b).reverse() == b.reverse() · a.reverse()`, and reversing twice
//! gives back the original path.
//!
//! ```text
//! Path::new_bound(qs, ["alice"]).out("follows")        // who alice follows
//! Path::new_bound(qs, ["alice"]).in_("follows")        // who follows alice
//! ```

mod path;
mod step;
mod via;

pub use path::{Morphism, Path};
pub use quadpath_store as store;
pub use quadpath_store::{Iter, QuadStore, StoreError};
pub use step::Step;
pub use via::{Via, ViaArg};

/// Misuse of the path API, or a storage failure surfaced while compiling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("cannot build an iterator from a morphism; bind a quad store or use build_iterator_on")]
    UnboundTemplate,
    #[error("invalid via specification: {reason}")]
    InvalidVia { reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = PathError> = std::result::Result<T, E>;
