//! Iterator plan trees.
//!
//! An [`Iter`] is a plain value: a node in a query plan plus the result tags
//! attached to it. The compiler in `quadpath` builds these trees; the
//! evaluator below executes them against a [`QuadStore`] as whole bitmaps.
//!
//! Node-valued iterators (`all`, `fixed`, `has_a`, `not`) yield node IDs;
//! `links_to` yields quad IDs. `and`/`or` are only meaningful over operands of
//! the same kind.

use crate::{Direction, NodeId, QuadId, QuadStore, StoreError};
use roaring::RoaringBitmap;
use std::collections::BTreeSet;
use std::fmt;

/// Result tags attached to one iterator in a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tagger {
    tags: BTreeSet<String>,
}

impl Tagger {
    /// Attach a tag. Adding a tag that is already present is a no-op.
    pub fn add(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A small enumerated node set, filled before being turned into an [`Iter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fixed {
    values: Vec<NodeId>,
}

impl Fixed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: NodeId) {
        if !self.values.contains(&id) {
            self.values.push(id);
        }
    }

    pub fn values(&self) -> &[NodeId] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IterKind {
    /// Every node in the store.
    AllNodes,
    Fixed(Fixed),
    And(Vec<Iter>),
    Or(Vec<Iter>),
    /// Nodes of `all` not produced by `inner`.
    Not { inner: Box<Iter>, all: Box<Iter> },
    /// Quads whose `dir` role is one of the nodes produced by `sub`.
    LinksTo { sub: Box<Iter>, dir: Direction },
    /// The `dir` role of every quad produced by `sub`.
    HasA { sub: Box<Iter>, dir: Direction },
}

/// One node of an iterator plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Iter {
    kind: IterKind,
    tagger: Tagger,
}

impl Iter {
    fn new(kind: IterKind) -> Self {
        Self {
            kind,
            tagger: Tagger::default(),
        }
    }

    pub fn all_nodes() -> Self {
        Self::new(IterKind::AllNodes)
    }

    /// Intersection of `subs`. An `and` with no operands is empty.
    pub fn and(subs: Vec<Iter>) -> Self {
        Self::new(IterKind::And(subs))
    }

    pub fn or(subs: Vec<Iter>) -> Self {
        Self::new(IterKind::Or(subs))
    }

    /// Complement of `inner` with respect to `all`.
    pub fn not(inner: Iter, all: Iter) -> Self {
        Self::new(IterKind::Not {
            inner: Box::new(inner),
            all: Box::new(all),
        })
    }

    pub fn links_to(sub: Iter, dir: Direction) -> Self {
        Self::new(IterKind::LinksTo {
            sub: Box::new(sub),
            dir,
        })
    }

    pub fn has_a(sub: Iter, dir: Direction) -> Self {
        Self::new(IterKind::HasA {
            sub: Box::new(sub),
            dir,
        })
    }

    pub fn kind(&self) -> &IterKind {
        &self.kind
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    /// Every tag attached anywhere in this plan.
    pub fn collect_tags(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tags_into(&mut out);
        out
    }

    fn collect_tags_into(&self, out: &mut BTreeSet<String>) {
        out.extend(self.tagger.tags().map(str::to_string));
        match &self.kind {
            IterKind::AllNodes | IterKind::Fixed(_) => {}
            IterKind::And(subs) | IterKind::Or(subs) => {
                for sub in subs {
                    sub.collect_tags_into(out);
                }
            }
            IterKind::Not { inner, all } => {
                inner.collect_tags_into(out);
                all.collect_tags_into(out);
            }
            IterKind::LinksTo { sub, .. } | IterKind::HasA { sub, .. } => {
                sub.collect_tags_into(out);
            }
        }
    }

    /// Compact one-line rendering of the plan, e.g. `and(fixed(0, 3), all)`.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Execute the plan against `qs`, producing node IDs (or quad IDs for a
    /// `links_to` root).
    pub fn evaluate(&self, qs: &dyn QuadStore) -> Result<RoaringBitmap, StoreError> {
        match &self.kind {
            IterKind::AllNodes => qs.all_nodes(),
            IterKind::Fixed(fixed) => Ok(fixed.values().iter().map(|id| id.raw()).collect()),
            IterKind::And(subs) => {
                let Some((first, rest)) = subs.split_first() else {
                    return Ok(RoaringBitmap::new());
                };
                let mut acc = first.evaluate(qs)?;
                for sub in rest {
                    if acc.is_empty() {
                        break;
                    }
                    acc &= sub.evaluate(qs)?;
                }
                Ok(acc)
            }
            IterKind::Or(subs) => {
                let mut acc = RoaringBitmap::new();
                for sub in subs {
                    acc |= sub.evaluate(qs)?;
                }
                Ok(acc)
            }
            IterKind::Not { inner, all } => {
                let mut acc = all.evaluate(qs)?;
                acc -= inner.evaluate(qs)?;
                Ok(acc)
            }
            IterKind::LinksTo { sub, dir } => {
                let mut quads = RoaringBitmap::new();
                for node in sub.evaluate(qs)?.iter() {
                    quads |= qs.quads_with(*dir, NodeId::new(node))?;
                }
                Ok(quads)
            }
            IterKind::HasA { sub, dir } => {
                let mut nodes = RoaringBitmap::new();
                for raw in sub.evaluate(qs)?.iter() {
                    let quad = qs.quad(QuadId::new(raw))?.ok_or_else(|| {
                        StoreError::Inconsistent {
                            reason: format!("quad {raw} is indexed but missing"),
                        }
                    })?;
                    if let Some(node) = quad.get(*dir) {
                        nodes.insert(node.raw());
                    }
                }
                Ok(nodes)
            }
        }
    }
}

impl From<Fixed> for Iter {
    fn from(fixed: Fixed) -> Self {
        Self::new(IterKind::Fixed(fixed))
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, subs: &[Iter]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, sub) in subs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{sub}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Iter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IterKind::AllNodes => f.write_str("all")?,
            IterKind::Fixed(fixed) => {
                f.write_str("fixed(")?;
                for (i, id) in fixed.values().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", id.raw())?;
                }
                f.write_str(")")?;
            }
            IterKind::And(subs) => write_list(f, "and", subs)?,
            IterKind::Or(subs) => write_list(f, "or", subs)?,
            IterKind::Not { inner, all } => write!(f, "not({inner}, {all})")?,
            IterKind::LinksTo { sub, dir } => write!(f, "links_to[{dir}]({sub})")?,
            IterKind::HasA { sub, dir } => write!(f, "has_a[{dir}]({sub})")?,
        }
        if !self.tagger.is_empty() {
            let tags: Vec<&str> = self.tagger.tags().collect();
            write!(f, "#[{}]", tags.join(","))?;
        }
        Ok(())
    }
}
