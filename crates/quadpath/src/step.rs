//! The step algebra.

use crate::{Path, Result, Via};
use quadpath_store::{Direction, Iter, QuadStore};
use std::sync::Arc;

/// One unit of traversal logic.
///
/// Every step maps the current candidate node set to a refined one
/// ([`Step::apply`]) and knows its own inverse ([`Step::reversal`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Restrict to the named nodes, or to all nodes when empty.
    Is(Vec<String>),
    /// Attach result tags without filtering.
    Tag(Vec<String>),
    /// Follow outbound edges (subject to object).
    Out(Via),
    /// Follow inbound edges (object to subject).
    In(Via),
    /// Restrict to a pre-built iterator.
    Iterator(Iter),
    And(Arc<Path>),
    Or(Arc<Path>),
    /// Drop nodes produced by the sub-path.
    Except(Arc<Path>),
    /// Splice the sub-path's steps in place.
    Follow(Arc<Path>),
}

impl Step {
    /// Diagnostic name of the step kind.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Is(_) => "is",
            Step::Tag(_) => "tag",
            Step::Out(_) => "out",
            Step::In(_) => "in",
            Step::Iterator(_) => "iterator",
            Step::And(_) => "and",
            Step::Or(_) => "or",
            Step::Except(_) => "except",
            Step::Follow(_) => "follow",
        }
    }

    /// The semantic inverse of this step, as a new value.
    pub fn reversal(&self) -> Step {
        match self {
            Step::Out(via) => Step::In(via.clone()),
            Step::In(via) => Step::Out(via.clone()),
            Step::Follow(path) => Step::Follow(Arc::new(path.reverse())),
            Step::Is(_)
            | Step::Tag(_)
            | Step::Iterator(_)
            | Step::And(_)
            | Step::Or(_)
            | Step::Except(_) => self.clone(),
        }
    }

    /// Refine `it` against `qs`. Sub-paths are compiled on `qs` regardless of
    /// the store they were bound to.
    pub fn apply(&self, qs: &dyn QuadStore, it: Iter) -> Result<Iter> {
        match self {
            Step::Is(nodes) => is_iterator(qs, nodes, it),
            Step::Tag(tags) => {
                let mut it = it;
                for tag in tags {
                    it.tagger_mut().add(tag.as_str());
                }
                Ok(it)
            }
            Step::Out(via) => in_out_iterator(qs, via, it, Heading::Out),
            Step::In(via) => in_out_iterator(qs, via, it, Heading::In),
            Step::Iterator(embedded) => Ok(Iter::and(vec![embedded.clone(), it])),
            Step::And(path) => {
                let sub = path.build_iterator_on(qs)?;
                Ok(Iter::and(vec![it, sub]))
            }
            Step::Or(path) => {
                let sub = path.build_iterator_on(qs)?;
                Ok(Iter::or(vec![it, sub]))
            }
            Step::Except(path) => {
                let sub = path.build_iterator_on(qs)?;
                let not = Iter::not(sub, qs.nodes_all_iterator());
                Ok(Iter::and(vec![it, not]))
            }
            Step::Follow(path) => path.apply(qs, it),
        }
    }
}

fn is_iterator(qs: &dyn QuadStore, nodes: &[String], it: Iter) -> Result<Iter> {
    let sub = if nodes.is_empty() {
        qs.nodes_all_iterator()
    } else {
        let mut fixed = qs.fixed_iterator();
        for node in nodes {
            match qs.value_of(node)? {
                Some(id) => fixed.add(id),
                None => tracing::debug!(node = %node, "node not in quad store; matches nothing"),
            }
        }
        Iter::from(fixed)
    };
    Ok(Iter::and(vec![sub, it]))
}

#[derive(Debug, Clone, Copy)]
enum Heading {
    Out,
    In,
}

impl Heading {
    /// (near, far): the role matched against the current nodes, and the role
    /// projected as the result.
    fn roles(self) -> (Direction, Direction) {
        match self {
            Heading::Out => (Direction::Subject, Direction::Object),
            Heading::In => (Direction::Object, Direction::Subject),
        }
    }
}

/// Edges whose predicate is in `via` and whose near end is in `it`,
/// projected onto their far end.
fn in_out_iterator(qs: &dyn QuadStore, via: &Via, it: Iter, heading: Heading) -> Result<Iter> {
    let (near, far) = heading.roles();
    let predicates = via.to_path().build_iterator_on(qs)?;
    tracing::trace!(?heading, via = %predicates, "resolved via");

    let edges = Iter::and(vec![
        Iter::links_to(predicates, Direction::Predicate),
        Iter::links_to(it, near),
    ]);
    Ok(Iter::has_a(edges, far))
}
