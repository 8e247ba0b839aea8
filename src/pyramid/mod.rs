// src/pyramid/mod.rs

//! Multi-resolution min/max summary of a single channel.
//!
//! Samples go in once through [`Pyramid::append`]; every level keeps an
//! append-only list of `(min, max)` entries, each coarser level folding a
//! fixed number of entries from the level below. Redraws then read a bounded
//! slice of whichever level matches the zoom instead of rescanning samples.

mod entry;
mod error;
mod level;
pub mod shared;

pub use entry::AggregateEntry;
pub use error::{PyramidError, PyramidResult};
pub use level::{Accumulate, LeafAggregator, Layer, LevelId, MinMaxLevel};
pub use shared::{OwnedSlice, SharedPyramid};

use log::debug;

/// Wires a leaf and a linear run of layers before any sample arrives.
#[derive(Debug)]
pub struct PyramidBuilder {
    leaf: LeafAggregator,
    layers: Vec<Layer>,
}

impl PyramidBuilder {
    pub fn new(leaf_factor: usize) -> PyramidResult<Self> {
        Ok(Self {
            leaf: LeafAggregator::new(leaf_factor)?,
            layers: Vec::new(),
        })
    }

    /// Attaches a new layer below `parent`, combining `relative_factor` of its
    /// entries. A parent can only ever get one child.
    pub fn attach_layer(&mut self, parent: LevelId, relative_factor: usize) -> PyramidResult<LevelId> {
        let id = LevelId(self.layers.len() + 1);
        let parent_absolute = match parent.0 {
            0 => self.leaf.absolute_factor(),
            n => self
                .layers
                .get(n - 1)
                .ok_or(PyramidError::UnknownLevel(n))?
                .absolute_factor(),
        };
        let layer = Layer::new(id, parent_absolute, relative_factor)?;
        match parent.0 {
            0 => self.leaf.link_child(id)?,
            n => self.layers[n - 1].link_child(id)?,
        }
        self.layers.push(layer);
        Ok(id)
    }

    /// Coarsest level attached so far.
    pub fn tail(&self) -> LevelId {
        LevelId(self.layers.len())
    }

    pub fn build(self) -> Pyramid {
        let pyramid = Pyramid {
            leaf: self.leaf,
            layers: self.layers,
            samples_ingested: 0,
        };
        for level in pyramid.levels() {
            debug!(
                "pyramid level: relative x{} absolute x{}",
                level.relative_factor(),
                level.absolute_factor()
            );
        }
        pyramid
    }
}

/// Checks an ascending factor list: non-empty, first factor >= 2, each
/// later factor strictly larger than and an exact multiple of the previous.
pub fn validate_factors(factors: &[usize]) -> PyramidResult<()> {
    let first = *factors.first().ok_or(PyramidError::EmptyFactors)?;
    if first < 2 {
        return Err(PyramidError::FactorTooSmall {
            index: 0,
            factor: first,
        });
    }
    for (index, pair) in factors.windows(2).enumerate() {
        let (previous, factor) = (pair[0], pair[1]);
        let index = index + 1;
        if factor <= previous {
            return Err(PyramidError::NotIncreasing {
                index,
                previous,
                factor,
            });
        }
        if factor % previous != 0 {
            return Err(PyramidError::NotDivisible {
                index,
                previous,
                factor,
            });
        }
    }
    Ok(())
}

/// The leaf plus its chain of layers. Levels live in an arena: id `0` is the
/// leaf, id `n` is `layers[n - 1]`, and each level's child is the next id.
#[derive(Debug, Clone)]
pub struct Pyramid {
    leaf: LeafAggregator,
    layers: Vec<Layer>,
    samples_ingested: u64,
}

/// A bounded run of entries from one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSlice<'a> {
    pub level: LevelId,
    pub absolute_factor: usize,
    /// Level-local index of `entries[0]`.
    pub start_index: usize,
    pub entries: &'a [AggregateEntry],
}

impl LevelSlice<'_> {
    /// Absolute sample offset where the first entry's block begins.
    pub fn start_sample(&self) -> u64 {
        self.start_index as u64 * self.absolute_factor as u64
    }
}

/// Outcome of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slice<'a> {
    Level(LevelSlice<'a>),
    /// Zoom is finer than the leaf block; read raw samples from the source.
    UseRawSource,
}

impl<'a> Slice<'a> {
    pub fn entries(&self) -> &'a [AggregateEntry] {
        match self {
            Slice::Level(s) => s.entries,
            Slice::UseRawSource => &[],
        }
    }

    pub fn into_owned(self) -> OwnedSlice {
        match self {
            Slice::Level(s) => OwnedSlice::Level {
                level: s.level,
                absolute_factor: s.absolute_factor,
                start_index: s.start_index,
                entries: s.entries.to_vec(),
            },
            Slice::UseRawSource => OwnedSlice::UseRawSource,
        }
    }
}

impl Pyramid {
    /// Builds the chain described by an ascending factor list, e.g.
    /// `[64, 128, 256]` gives a leaf of 64 samples and two layers of x2.
    pub fn from_factors(factors: &[usize]) -> PyramidResult<Self> {
        validate_factors(factors)?;
        let mut builder = PyramidBuilder::new(factors[0])?;
        for pair in factors.windows(2) {
            let parent = builder.tail();
            builder.attach_layer(parent, pair[1] / pair[0])?;
        }
        Ok(builder.build())
    }

    /// Ingests one sample, cascading any completed entry down the chain.
    pub fn append(&mut self, sample: f32) {
        self.samples_ingested += 1;
        let mut next = self.leaf.append(sample).map(|e| (e, self.leaf.child()));
        while let Some((entry, Some(id))) = next {
            let layer = &mut self.layers[id.0 - 1];
            next = layer.append(entry).map(|e| (e, layer.child()));
        }
    }

    /// Ingests a whole source in order, consuming it. Returns how many
    /// samples were taken.
    pub fn extend<I>(&mut self, source: I) -> u64
    where
        I: IntoIterator<Item = f32>,
    {
        let before = self.samples_ingested;
        for sample in source {
            self.append(sample);
        }
        self.samples_ingested - before
    }

    pub fn samples_ingested(&self) -> u64 {
        self.samples_ingested
    }

    pub fn level_count(&self) -> usize {
        self.layers.len() + 1
    }

    pub fn leaf(&self) -> &LeafAggregator {
        &self.leaf
    }

    pub fn level(&self, id: LevelId) -> Option<&dyn MinMaxLevel> {
        match id.0 {
            0 => Some(&self.leaf as &dyn MinMaxLevel),
            n => self.layers.get(n - 1).map(|l| l as &dyn MinMaxLevel),
        }
    }

    pub fn coarsest(&self) -> LevelId {
        LevelId(self.layers.len())
    }

    /// Levels from finest to coarsest, following the child links.
    pub fn levels(&self) -> impl Iterator<Item = &dyn MinMaxLevel> + '_ {
        let mut next = Some(LevelId::LEAF);
        std::iter::from_fn(move || {
            let level = self.level(next?)?;
            next = level.child();
            Some(level)
        })
    }

    /// Coarsest level whose absolute factor does not exceed `zoom`, or
    /// `None` when even the leaf is too coarse.
    pub fn select_level(&self, zoom: f64) -> Option<LevelId> {
        if !(zoom >= self.leaf.absolute_factor() as f64) {
            return None;
        }
        let mut id = LevelId::LEAF;
        let mut current: &dyn MinMaxLevel = &self.leaf;
        while let Some(child_id) = current.child() {
            let child = self.level(child_id)?;
            if child.absolute_factor() as f64 > zoom {
                break;
            }
            id = child_id;
            current = child;
        }
        Some(id)
    }

    /// Up to `count` entries of the level picked for `zoom`, starting at the
    /// entry covering absolute sample `offset`. Clipped to what has been
    /// ingested so far; an empty slice is a normal answer.
    pub fn query(&self, zoom: f64, offset: u64, count: usize) -> Slice<'_> {
        match self.select_level(zoom) {
            Some(id) => self.slice_of(id, offset, count),
            None => Slice::UseRawSource,
        }
    }

    /// Like [`query`](Self::query), sized to cover `width` columns of `zoom`
    /// samples starting at `offset`. The first entry may begin before
    /// `offset`, so its lead-in counts toward the window.
    pub fn query_width(&self, zoom: f64, offset: u64, width: usize) -> Slice<'_> {
        let Some(id) = self.select_level(zoom) else {
            return Slice::UseRawSource;
        };
        let Some(level) = self.level(id) else {
            return Slice::UseRawSource;
        };
        let absolute = level.absolute_factor() as u64;
        let span = (offset % absolute) as f64 + zoom * width as f64;
        let count = (span / absolute as f64).ceil() as usize;
        self.slice_of(id, offset, count)
    }

    fn slice_of(&self, id: LevelId, offset: u64, count: usize) -> Slice<'_> {
        let Some(level) = self.level(id) else {
            return Slice::UseRawSource;
        };
        let values = level.values();
        let absolute_factor = level.absolute_factor();
        let index = usize::try_from(offset / absolute_factor as u64).unwrap_or(usize::MAX);
        let start = index.min(values.len());
        let end = start.saturating_add(count).min(values.len());
        Slice::Level(LevelSlice {
            level: id,
            absolute_factor,
            start_index: start,
            entries: &values[start..end],
        })
    }
}
