// src/waveform/mod.rs

//! Turns pyramid slices (or raw samples) into one min/max bin per column.

pub mod terminal;

use anyhow::Result;

use crate::pyramid::{AggregateEntry, LevelId, LevelSlice, Pyramid, Slice};
use crate::view::Viewport;

/// Per-column extrema ready to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl Columns {
    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }
}

/// Where the columns came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Level {
        level: LevelId,
        absolute_factor: usize,
    },
    Raw,
}

/// Folds positioned items into at most `view.width()` columns of
/// `view.zoom()` samples each. Item `i` starts at absolute sample
/// `first + i * step`; an item starting before the view lands in column 0.
/// Stops early when the input runs out, so the result may be narrower.
fn bin<I>(items: I, first: u64, step: u64, view: &Viewport) -> Columns
where
    I: IntoIterator<Item = AggregateEntry>,
{
    let mut out = Columns::default();
    let mut current: Option<(usize, AggregateEntry)> = None;

    for (i, e) in items.into_iter().enumerate() {
        let pos = first + i as u64 * step;
        let col = (pos.saturating_sub(view.offset()) as f64 / view.zoom()) as usize;
        if col >= view.width() {
            break;
        }
        current = match current {
            Some((c, acc)) if c == col => Some((c, AggregateEntry::merge(&[acc, e]))),
            Some((_, acc)) => {
                out.min.push(acc.min);
                out.max.push(acc.max);
                Some((col, e))
            }
            None => Some((col, e)),
        };
    }
    if let Some((_, acc)) = current {
        out.min.push(acc.min);
        out.max.push(acc.max);
    }
    out
}

pub fn bin_entries(slice: &LevelSlice<'_>, view: &Viewport) -> Columns {
    bin(
        slice.entries.iter().copied(),
        slice.start_sample(),
        slice.absolute_factor as u64,
        view,
    )
}

/// `samples` start at `view.offset()`.
pub fn bin_samples(samples: &[f32], view: &Viewport) -> Columns {
    bin(
        samples.iter().map(|&s| AggregateEntry::new(s, s)),
        view.offset(),
        1,
        view,
    )
}

/// Columns for `view`, taken from the pyramid when it is coarse enough and
/// from `read_raw(offset, count)` otherwise.
pub fn columns_for_view<F>(pyramid: &Pyramid, view: &Viewport, read_raw: F) -> Result<(Columns, Resolution)>
where
    F: FnOnce(u64, usize) -> Result<Vec<f32>>,
{
    match pyramid.query_width(view.zoom(), view.offset(), view.width()) {
        Slice::Level(s) => Ok((
            bin_entries(&s, view),
            Resolution::Level {
                level: s.level,
                absolute_factor: s.absolute_factor,
            },
        )),
        Slice::UseRawSource => {
            let samples = read_raw(view.offset(), view.window_len())?;
            Ok((bin_samples(&samples, view), Resolution::Raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid::MinMaxLevel;

    #[test]
    fn whole_groups_per_column() {
        let c = bin_samples(&[0.1, -0.2, 0.4, 0.3, -0.9, 0.0], &Viewport::new(0, 2.0, 10));
        assert_eq!(c.min, vec![-0.2, 0.3, -0.9]);
        assert_eq!(c.max, vec![0.1, 0.4, 0.0]);
    }

    #[test]
    fn width_caps_output() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let c = bin_samples(&samples, &Viewport::new(0, 10.0, 3));
        assert_eq!(c.len(), 3);
        assert_eq!(c.max, vec![9.0, 19.0, 29.0]);
    }

    #[test]
    fn entries_land_by_sample_position() {
        let entries = [
            AggregateEntry::new(0.0, 1.0),
            AggregateEntry::new(-1.0, 0.5),
            AggregateEntry::new(-0.5, 0.25),
        ];
        // x4 entries at samples 8, 12, 16; the view starts mid-entry at 10
        let slice = LevelSlice {
            level: LevelId::LEAF,
            absolute_factor: 4,
            start_index: 2,
            entries: &entries,
        };
        let c = bin_entries(&slice, &Viewport::new(10, 6.0, 4));
        assert_eq!(c.min, vec![-1.0, -0.5]);
        assert_eq!(c.max, vec![1.0, 0.25]);
    }

    #[test]
    fn empty_input_gives_no_columns() {
        assert!(bin_samples(&[], &Viewport::new(0, 4.0, 80)).is_empty());
    }

    #[test]
    fn fractional_zoom_fills_every_column() {
        let mut p = Pyramid::from_factors(&[64, 128]).unwrap();
        p.extend((0..100_000).map(|i| ((i % 1000) as f32 / 500.0) - 1.0));

        for (offset, zoom) in [(0, 100.0), (0, 70.0), (0, 200.0), (5_000, 100.0), (33_333, 150.0)] {
            let view = Viewport::new(offset, zoom, 10);
            let (cols, _) = columns_for_view(&p, &view, |_, _| unreachable!()).unwrap();
            assert_eq!(cols.len(), 10, "offset {offset} zoom {zoom}");
            assert!(cols.min.iter().zip(&cols.max).all(|(lo, hi)| lo <= hi));
        }

        // zoom 100 from 0: the last column holds only the block at 960
        let view = Viewport::new(0, 100.0, 10);
        let (cols, _) = columns_for_view(&p, &view, |_, _| unreachable!()).unwrap();
        let last = p.leaf().values()[15];
        assert_eq!((cols.min[9], cols.max[9]), (last.min, last.max));
    }

    #[test]
    fn view_falls_back_to_raw_below_leaf() {
        let mut p = Pyramid::from_factors(&[8, 64]).unwrap();
        p.extend((0..512).map(|i| (i % 16) as f32));
        let view = Viewport::new(16, 2.0, 4);
        let mut asked = None;
        let (cols, res) = columns_for_view(&p, &view, |offset, count| {
            asked = Some((offset, count));
            Ok(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
        })
        .unwrap();
        assert_eq!(res, Resolution::Raw);
        assert_eq!(asked, Some((16, 8)));
        assert_eq!(cols.max, vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn view_uses_layer_when_zoomed_out() {
        let mut p = Pyramid::from_factors(&[8, 64]).unwrap();
        p.extend((0..4096).map(|i| (i % 100) as f32));
        let view = Viewport::new(0, 128.0, 10);
        let (cols, res) = columns_for_view(&p, &view, |_, _| unreachable!()).unwrap();
        assert_eq!(
            res,
            Resolution::Level {
                level: LevelId(1),
                absolute_factor: 64
            }
        );
        assert_eq!(cols.len(), 10);
        assert_eq!(cols.min[0], 0.0);
        assert_eq!(cols.max[0], 99.0);
    }
}
