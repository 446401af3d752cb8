//! In-memory reference quad store.

use crate::config::{QuadFormat, StoreConfig};
use crate::{Direction, NodeId, NodeInterner, Quad, QuadId, QuadStore, StoreError};
use anyhow::{anyhow, bail, Context, Result};
use parking_lot::RwLock;
use roaring::RoaringBitmap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Quad list plus one inverted index per role: node -> quad IDs.
#[derive(Debug, Default)]
struct QuadIndex {
    quads: Vec<Quad>,
    seen: HashMap<Quad, QuadId>,
    by_dir: [HashMap<NodeId, RoaringBitmap>; 4],
}

impl QuadIndex {
    fn add(&mut self, quad: Quad) -> Result<QuadId, StoreError> {
        if let Some(id) = self.seen.get(&quad) {
            return Ok(*id);
        }

        let id = quad_id_for(self.quads.len())?;
        for dir in Direction::ALL {
            if let Some(node) = quad.get(dir) {
                self.by_dir[dir.index()]
                    .entry(node)
                    .or_insert_with(RoaringBitmap::new)
                    .insert(id.raw());
            }
        }
        self.seen.insert(quad, id);
        self.quads.push(quad);
        Ok(id)
    }
}

/// The ID for the quad stored at position `len`; IDs must fit a bitmap entry.
pub(crate) fn quad_id_for(len: usize) -> Result<QuadId, StoreError> {
    u32::try_from(len)
        .map(QuadId::new)
        .map_err(|_| StoreError::Full {
            reason: format!("quad id space exhausted at {len} quads"),
        })
}

/// Bitmap-indexed quad store held entirely in memory.
///
/// Reads take a shared lock on the index; names are interned in a concurrent
/// map so lookups never block on writers.
#[derive(Default)]
pub struct MemStore {
    interner: NodeInterner,
    index: RwLock<QuadIndex>,
}

#[derive(Debug, Deserialize)]
struct QuadRecord {
    subject: String,
    predicate: String,
    object: String,
    #[serde(default)]
    label: Option<String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store as described by `config`, loading its quad file if any.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let store = Self::new();
        if let Some(path) = &config.quads_path {
            let count = store.load_file(path, config)?;
            tracing::debug!(path = %path.display(), quads = count, "loaded quad file");
        }
        Ok(store)
    }

    /// Add a quad by name. Adding the same quad twice returns the original ID.
    pub fn add_quad(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
        label: Option<&str>,
    ) -> Result<QuadId, StoreError> {
        let quad = Quad {
            subject: self.interner.intern(subject)?,
            predicate: self.interner.intern(predicate)?,
            object: self.interner.intern(object)?,
            label: label.map(|l| self.interner.intern(l)).transpose()?,
        };
        self.index.write().add(quad)
    }

    /// Add unlabelled `(subject, predicate, object)` triples.
    pub fn add_quads<'a>(
        &self,
        triples: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Result<(), StoreError> {
        for (s, p, o) in triples {
            self.add_quad(s, p, o, None)?;
        }
        Ok(())
    }

    /// Number of distinct quads.
    pub fn len(&self) -> usize {
        self.index.read().quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct node names (subjects, predicates, objects, labels).
    pub fn node_count(&self) -> usize {
        self.interner.len()
    }

    /// Load quads from `path` using the format and policies in `config`.
    /// Returns the number of lines accepted.
    pub fn load_file(&self, path: &Path, config: &StoreConfig) -> Result<usize> {
        let file =
            File::open(path).with_context(|| format!("opening quad file {}", path.display()))?;
        self.load_reader(BufReader::new(file), config)
            .with_context(|| format!("loading quad file {}", path.display()))
    }

    pub fn load_reader(&self, reader: impl BufRead, config: &StoreConfig) -> Result<usize> {
        let mut accepted = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.with_context(|| format!("reading line {line_no}"))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let parsed = match config.format {
                QuadFormat::Tsv => parse_tsv_line(trimmed),
                QuadFormat::JsonLines => parse_json_line(trimmed),
            };
            let record = match parsed {
                Ok(record) => record,
                Err(err) if config.skip_malformed => {
                    tracing::warn!(line = line_no, error = %err, "skipping malformed quad");
                    continue;
                }
                Err(err) => return Err(err.context(format!("malformed quad at line {line_no}"))),
            };

            let label = record.label.as_deref().or(config.default_label.as_deref());
            self.add_quad(&record.subject, &record.predicate, &record.object, label)
                .with_context(|| format!("storing quad from line {line_no}"))?;
            accepted += 1;
        }
        Ok(accepted)
    }
}

fn parse_tsv_line(line: &str) -> Result<QuadRecord> {
    let mut fields: Vec<&str> = line.split_whitespace().collect();
    if fields.last() == Some(&".") {
        fields.pop();
    }
    match fields.as_slice() {
        [s, p, o] => Ok(QuadRecord {
            subject: s.to_string(),
            predicate: p.to_string(),
            object: o.to_string(),
            label: None,
        }),
        [s, p, o, l] => Ok(QuadRecord {
            subject: s.to_string(),
            predicate: p.to_string(),
            object: o.to_string(),
            label: Some(l.to_string()),
        }),
        other => bail!("expected 3 or 4 fields, found {}", other.len()),
    }
}

fn parse_json_line(line: &str) -> Result<QuadRecord> {
    serde_json::from_str(line).map_err(|err| anyhow!("invalid quad record: {err}"))
}

impl QuadStore for MemStore {
    fn value_of(&self, name: &str) -> Result<Option<NodeId>, StoreError> {
        Ok(self.interner.id_of(name))
    }

    fn name_of(&self, id: NodeId) -> Result<Option<String>, StoreError> {
        Ok(self.interner.lookup(id))
    }

    fn all_nodes(&self) -> Result<RoaringBitmap, StoreError> {
        Ok(self.interner.ids())
    }

    fn quad(&self, id: QuadId) -> Result<Option<Quad>, StoreError> {
        Ok(self.index.read().quads.get(id.raw() as usize).copied())
    }

    fn quads_with(&self, dir: Direction, node: NodeId) -> Result<RoaringBitmap, StoreError> {
        Ok(self.index.read().by_dir[dir.index()]
            .get(&node)
            .cloned()
            .unwrap_or_default())
    }
}
