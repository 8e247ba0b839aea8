// src/view.rs

//! Which stretch of the stream a fixed number of columns shows.

/// Finest zoom: one sample per column.
pub const MIN_ZOOM: f64 = 1.0;

/// Decades of zoom per step (ten steps = 10x).
pub const ZOOM_PER_STEP: f64 = 0.1;

/// `offset` is the absolute sample under column 0; `zoom` is samples per
/// column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    offset: u64,
    zoom: f64,
    width: usize,
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() { MIN_ZOOM } else { zoom.max(MIN_ZOOM) }
}

impl Viewport {
    pub fn new(offset: u64, zoom: f64, width: usize) -> Self {
        Self {
            offset,
            zoom: clamp_zoom(zoom),
            width: width.max(1),
        }
    }

    /// Shows `percent` of a stream of `total` samples across `width` columns.
    pub fn from_percent(percent: f64, total: u64, width: usize) -> Self {
        let width = width.max(1);
        Self::new(0, percent / 100.0 * total as f64 / width as f64, width)
    }

    /// Fits the sample range `[start, end)` (either order) into `width` columns.
    pub fn from_selection(start: u64, end: u64, width: usize) -> Self {
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let width = width.max(1);
        Self::new(lo, (hi - lo) as f64 / width as f64, width)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn scroll_to(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Absolute sample under `column`.
    pub fn sample_at(&self, column: usize) -> u64 {
        self.offset + (column as f64 * self.zoom) as u64
    }

    /// Samples spanned by the full width.
    pub fn window_len(&self) -> usize {
        (self.zoom * self.width as f64).ceil() as usize
    }

    /// Share of a `total`-sample stream on screen, in percent.
    pub fn percent_of(&self, total: u64) -> f64 {
        if total == 0 {
            return 100.0;
        }
        100.0 * self.zoom * self.width as f64 / total as f64
    }

    /// Zooms by `steps` (positive = out) keeping the sample under `column` put.
    pub fn zoom_around(&mut self, column: usize, steps: f64) {
        let anchor = self.offset as f64 + self.zoom * column as f64;
        self.zoom = clamp_zoom(self.zoom * 10f64.powf(steps * ZOOM_PER_STEP));
        self.offset = (anchor - column as f64 * self.zoom).max(0.0) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_never_drops_below_one_sample() {
        assert_eq!(Viewport::new(0, 0.25, 10).zoom(), MIN_ZOOM);
        assert_eq!(Viewport::new(0, f64::NAN, 10).zoom(), MIN_ZOOM);
        assert_eq!(Viewport::from_selection(5, 5, 100).zoom(), MIN_ZOOM);
    }

    #[test]
    fn percent_round_trips() {
        let v = Viewport::from_percent(50.0, 48_000, 100);
        assert_eq!(v.zoom(), 240.0);
        assert_eq!(v.window_len(), 24_000);
        assert_eq!(v.percent_of(48_000), 50.0);
    }

    #[test]
    fn selection_sets_offset_and_zoom() {
        let v = Viewport::from_selection(9_000, 1_000, 80);
        assert_eq!(v.offset(), 1_000);
        assert_eq!(v.zoom(), 100.0);
        assert_eq!(v.sample_at(10), 2_000);
    }

    #[test]
    fn anchored_zoom_keeps_sample_under_cursor() {
        let mut v = Viewport::new(100_000, 100.0, 200);
        let before = v.sample_at(50);
        v.zoom_around(50, 10.0);
        assert!((v.zoom() - 1_000.0).abs() < 1e-6);
        let after = v.sample_at(50);
        assert!(after.abs_diff(before) <= 1, "{before} vs {after}");
    }

    #[test]
    fn anchored_zoom_clamps_offset_at_start() {
        let mut v = Viewport::new(100, 10.0, 100);
        v.zoom_around(50, 10.0);
        assert_eq!(v.offset(), 0);
    }
}
