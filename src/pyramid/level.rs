// src/pyramid/level.rs

use super::entry::AggregateEntry;
use super::error::{PyramidError, PyramidResult};

/// Index of a level inside a [`Pyramid`](super::Pyramid). The leaf is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId(pub usize);

impl LevelId {
    pub const LEAF: LevelId = LevelId(0);
}

/// Read side shared by the leaf and every layer.
pub trait MinMaxLevel {
    /// Input units (samples or parent entries) folded into one entry.
    fn relative_factor(&self) -> usize;
    /// Raw samples summarized by one entry at this level.
    fn absolute_factor(&self) -> usize;
    /// Completed entries, oldest first. Partial blocks never show up here.
    fn values(&self) -> &[AggregateEntry];
    /// Next coarser level, if any.
    fn child(&self) -> Option<LevelId>;
    /// Inputs buffered toward the next entry.
    fn pending(&self) -> usize;
}

/// Write side: feed one input, get back the entry it completed (if any).
///
/// The returned entry is already stored in `values`; forwarding it to the
/// child is the caller's job.
pub trait Accumulate {
    type Input;

    fn append(&mut self, input: Self::Input) -> Option<AggregateEntry>;
}

/// State every level carries regardless of what it ingests.
#[derive(Debug, Clone)]
struct LevelCore {
    relative_factor: usize,
    absolute_factor: usize,
    values: Vec<AggregateEntry>,
    child: Option<LevelId>,
}

impl LevelCore {
    fn new(relative_factor: usize, absolute_factor: usize) -> Self {
        Self {
            relative_factor,
            absolute_factor,
            values: Vec::new(),
            child: None,
        }
    }

    fn link(&mut self, own: LevelId, child: LevelId) -> PyramidResult<()> {
        if self.child.is_some() {
            return Err(PyramidError::ChildAlreadyLinked { parent: own.0 });
        }
        self.child = Some(child);
        Ok(())
    }
}

macro_rules! impl_min_max_level {
    ($ty:ty, $buf:ident) => {
        impl MinMaxLevel for $ty {
            fn relative_factor(&self) -> usize {
                self.core.relative_factor
            }
            fn absolute_factor(&self) -> usize {
                self.core.absolute_factor
            }
            fn values(&self) -> &[AggregateEntry] {
                &self.core.values
            }
            fn child(&self) -> Option<LevelId> {
                self.core.child
            }
            fn pending(&self) -> usize {
                self.$buf.len()
            }
        }
    };
}

/// Finest level: reduces raw samples into blocks of `relative_factor`.
#[derive(Debug, Clone)]
pub struct LeafAggregator {
    core: LevelCore,
    buffer: Vec<f32>,
}

impl LeafAggregator {
    pub fn new(relative_factor: usize) -> PyramidResult<Self> {
        if relative_factor < 2 {
            return Err(PyramidError::FactorTooSmall {
                index: 0,
                factor: relative_factor,
            });
        }
        Ok(Self {
            core: LevelCore::new(relative_factor, relative_factor),
            buffer: Vec::with_capacity(relative_factor),
        })
    }

    pub(crate) fn link_child(&mut self, child: LevelId) -> PyramidResult<()> {
        self.core.link(LevelId::LEAF, child)
    }
}

impl Accumulate for LeafAggregator {
    type Input = f32;

    fn append(&mut self, sample: f32) -> Option<AggregateEntry> {
        self.buffer.push(sample);
        if self.buffer.len() < self.core.relative_factor {
            return None;
        }
        let entry = AggregateEntry::from_samples(&self.buffer);
        self.core.values.push(entry);
        self.buffer.clear();
        Some(entry)
    }
}

impl_min_max_level!(LeafAggregator, buffer);

/// Coarser level fed with the entries completed by its parent.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LevelId,
    core: LevelCore,
    buffer: Vec<AggregateEntry>,
}

impl Layer {
    /// `parent_absolute` is the parent's absolute factor; linking the parent
    /// to this layer is done by the builder so a second link can be refused.
    pub(crate) fn new(
        id: LevelId,
        parent_absolute: usize,
        relative_factor: usize,
    ) -> PyramidResult<Self> {
        if relative_factor < 2 {
            return Err(PyramidError::FactorTooSmall {
                index: id.0,
                factor: relative_factor,
            });
        }
        let absolute_factor =
            parent_absolute
                .checked_mul(relative_factor)
                .ok_or(PyramidError::FactorOverflow {
                    parent: parent_absolute,
                    relative: relative_factor,
                })?;
        Ok(Self {
            id,
            core: LevelCore::new(relative_factor, absolute_factor),
            buffer: Vec::with_capacity(relative_factor),
        })
    }

    pub(crate) fn link_child(&mut self, child: LevelId) -> PyramidResult<()> {
        self.core.link(self.id, child)
    }
}

impl Accumulate for Layer {
    type Input = AggregateEntry;

    fn append(&mut self, entry: AggregateEntry) -> Option<AggregateEntry> {
        self.buffer.push(entry);
        if self.buffer.len() < self.core.relative_factor {
            return None;
        }
        let merged = AggregateEntry::merge(&self.buffer);
        self.core.values.push(merged);
        self.buffer.clear();
        Some(merged)
    }
}

impl_min_max_level!(Layer, buffer);
