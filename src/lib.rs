// src/lib.rs

pub mod config;
pub mod pyramid;
pub mod source;
pub mod view;
pub mod waveform;

pub use config::PyramidConfig;
pub use pyramid::{AggregateEntry, Pyramid, PyramidError, SharedPyramid, Slice}; // convenience
pub use source::FileSource;
pub use view::Viewport;
