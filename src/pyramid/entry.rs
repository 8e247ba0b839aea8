// src/pyramid/entry.rs

/// One `(min, max)` summary of a contiguous block of finer data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateEntry {
    pub min: f32,
    pub max: f32,
}

impl AggregateEntry {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Exact extrema of a non-empty block of raw samples.
    ///
    /// Seeds with the first value and compares strictly, so the result is
    /// always one of the inputs (no rounding, no sentinel values).
    pub(crate) fn from_samples(block: &[f32]) -> Self {
        let mut min = block[0];
        let mut max = block[0];
        for &s in &block[1..] {
            if s < min {
                min = s;
            }
            if s > max {
                max = s;
            }
        }
        Self { min, max }
    }

    /// Min of mins, max of maxes over a non-empty block of finer entries.
    pub(crate) fn merge(block: &[AggregateEntry]) -> Self {
        let mut out = block[0];
        for e in &block[1..] {
            if e.min < out.min {
                out.min = e.min;
            }
            if e.max > out.max {
                out.max = e.max;
            }
        }
        out
    }
}

impl From<(f32, f32)> for AggregateEntry {
    fn from((min, max): (f32, f32)) -> Self {
        Self { min, max }
    }
}

impl From<AggregateEntry> for (f32, f32) {
    fn from(e: AggregateEntry) -> Self {
        (e.min, e.max)
    }
}
