//! Paths: step sequences, optionally bound to a store.

use crate::{PathError, Result, Step, Via};
use quadpath_store::{Iter, QuadStore};
use std::fmt;
use std::sync::Arc;

/// An ordered list of steps plus an optional quad store.
///
/// A path without a store is a morphism: it can be embedded in other paths,
/// bound with [`Path::bind`], compiled with [`Path::build_iterator_on`], or
/// reversed, but [`Path::build_iterator`] rejects it.
///
/// Builder methods take `self` and return the grown path. Once a path has
/// been embedded in another (as an `Arc<Path>`) it can no longer change, so
/// one sub-traversal can be shared by any number of parents.
#[derive(Clone, Default)]
pub struct Path {
    steps: Vec<Step>,
    qs: Option<Arc<dyn QuadStore>>,
}

impl Path {
    /// A morphism starting at `nodes` (or at every node when empty).
    pub fn new_template<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: vec![Step::Is(collect_strings(nodes))],
            qs: None,
        }
    }

    /// A concrete path over `qs` starting at `nodes` (or at every node when empty).
    pub fn new_bound<I, S>(qs: Arc<dyn QuadStore>, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: vec![Step::Is(collect_strings(nodes))],
            qs: Some(qs),
        }
    }

    /// A concrete path whose only step restricts to an already-built iterator.
    pub fn from_iterator(qs: Arc<dyn QuadStore>, it: Iter) -> Self {
        Self {
            steps: vec![Step::Iterator(it)],
            qs: Some(qs),
        }
    }

    /// A concrete path with no steps; it compiles to the unfiltered seed.
    pub fn new_empty(qs: Arc<dyn QuadStore>) -> Self {
        Self {
            steps: Vec::new(),
            qs: Some(qs),
        }
    }

    /// True when no store is bound.
    pub fn is_morphism(&self) -> bool {
        self.qs.is_none()
    }

    pub fn storage(&self) -> Option<&Arc<dyn QuadStore>> {
        self.qs.as_ref()
    }

    /// This path's steps bound to `qs`.
    #[must_use]
    pub fn bind(&self, qs: Arc<dyn QuadStore>) -> Self {
        Self {
            steps: self.steps.clone(),
            qs: Some(qs),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(Step::name).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// A new path that walks this one backwards. `self` is left untouched.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            steps: self.steps.iter().rev().map(Step::reversal).collect(),
            qs: self.qs.clone(),
        }
    }

    #[must_use]
    pub fn is<I, S>(self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Step::Is(collect_strings(nodes)))
    }

    #[must_use]
    pub fn tag<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Step::Tag(collect_strings(tags)))
    }

    /// Move to the nodes the current nodes point at through `via`.
    ///
    /// ```text
    /// // ["bob"] if there is an edge alice -follows-> bob
    /// Path::new_bound(qs, ["alice"]).out("follows")
    /// ```
    #[must_use]
    pub fn out(self, via: impl Into<Via>) -> Self {
        self.push(Step::Out(via.into()))
    }

    /// Move to the nodes pointing at the current nodes through `via`.
    ///
    /// ```text
    /// // ["alice", "carol"] if both have a `follows` edge to bob
    /// Path::new_bound(qs, ["bob"]).in_("follows")
    /// ```
    #[must_use]
    pub fn in_(self, via: impl Into<Via>) -> Self {
        self.push(Step::In(via.into()))
    }

    /// Keep the nodes also produced by `path`.
    #[must_use]
    pub fn and(self, path: impl Into<Arc<Path>>) -> Self {
        self.push(Step::And(path.into()))
    }

    /// Add the nodes produced by `path`.
    #[must_use]
    pub fn or(self, path: impl Into<Arc<Path>>) -> Self {
        self.push(Step::Or(path.into()))
    }

    /// Drop the nodes produced by `path`.
    ///
    /// ```text
    /// // ["B"]
    /// Path::new_bound(qs.clone(), ["A", "B"]).except(Path::new_bound(qs, ["A"]))
    /// ```
    #[must_use]
    pub fn except(self, path: impl Into<Arc<Path>>) -> Self {
        self.push(Step::Except(path.into()))
    }

    /// Continue along `path`'s steps from the current nodes.
    #[must_use]
    pub fn follow(self, path: impl Into<Arc<Path>>) -> Self {
        self.push(Step::Follow(path.into()))
    }

    /// Continue along `path` walked backwards.
    #[must_use]
    pub fn follow_reverse(self, path: &Path) -> Self {
        self.push(Step::Follow(Arc::new(path.reverse())))
    }

    /// Compile against the bound store.
    ///
    /// Fails with [`PathError::UnboundTemplate`] on a morphism.
    pub fn build_iterator(&self) -> Result<Iter> {
        match &self.qs {
            Some(qs) => self.build_iterator_on(qs.as_ref()),
            None => Err(PathError::UnboundTemplate),
        }
    }

    /// Compile against `qs`, starting from every node.
    pub fn build_iterator_on(&self, qs: &dyn QuadStore) -> Result<Iter> {
        tracing::debug!(
            steps = self.steps.len(),
            template = self.is_morphism(),
            "building iterator"
        );
        self.apply(qs, qs.nodes_all_iterator())
    }

    /// Apply the steps to an existing iterator.
    pub fn apply(&self, qs: &dyn QuadStore, it: Iter) -> Result<Iter> {
        apply_steps(&self.steps, qs, it)
    }

    /// A detached, shareable copy of the step sequence.
    pub fn morphism(&self) -> Morphism {
        Morphism {
            steps: Arc::from(self.steps.clone()),
        }
    }
}

/// A path's steps without any store, applicable to any `(store, iterator)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Morphism {
    steps: Arc<[Step]>,
}

impl Morphism {
    pub fn apply(&self, qs: &dyn QuadStore, it: Iter) -> Result<Iter> {
        apply_steps(&self.steps, qs, it)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

fn apply_steps(steps: &[Step], qs: &dyn QuadStore, it: Iter) -> Result<Iter> {
    steps.iter().try_fold(it, |it, step| {
        tracing::trace!(step = step.name(), "applying step");
        step.apply(qs, it)
    })
}

fn collect_strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("steps", &self.steps)
            .field("bound", &self.qs.is_some())
            .finish()
    }
}

/// Same steps, bound to the same store instance (or both unbound).
impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        let same_store = match (&self.qs, &other.qs) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        };
        same_store && self.steps == other.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_morphism() {
        let path = Path::new_template(["a"]).out("p");
        assert!(path.is_morphism());
        assert_eq!(path.step_names(), vec!["is", "out"]);
        assert_eq!(path.build_iterator(), Err(PathError::UnboundTemplate));
    }

    #[test]
    fn test_default_path_has_no_steps() {
        let path = Path::default();
        assert!(path.is_empty());
        assert!(path.is_morphism());
    }

    #[test]
    fn test_reverse_mirrors_and_swaps() {
        let path = Path::default().out("p").tag(["t"]).in_("q");
        let reversed = path.reverse();
        assert_eq!(reversed.step_names(), vec!["out", "tag", "in"]);
        assert_eq!(reversed.steps()[0], Step::Out(Via::from("q")));
        assert_eq!(reversed.steps()[2], Step::In(Via::from("p")));
        assert_eq!(path.step_names(), vec!["out", "tag", "in"]);
        assert_eq!(path.steps()[0], Step::Out(Via::from("p")));
    }

    #[test]
    fn test_morphism_keeps_steps() {
        let path = Path::new_template(["a"]).out("p");
        let morphism = path.morphism();
        assert_eq!(morphism.steps(), path.steps());
    }
}
