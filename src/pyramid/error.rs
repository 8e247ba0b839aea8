// src/pyramid/error.rs

use thiserror::Error;

/// Configuration errors raised while wiring a pyramid.
///
/// All of these surface before the first sample is ingested; a pyramid that
/// failed to build is never handed out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PyramidError {
    #[error("factor list is empty")]
    EmptyFactors,

    /// A level would combine fewer than two inputs per entry.
    #[error("factor {factor} at position {index} is too small (must be >= 2)")]
    FactorTooSmall { index: usize, factor: usize },

    #[error("factor {factor} at position {index} does not exceed its predecessor {previous}")]
    NotIncreasing {
        index: usize,
        previous: usize,
        factor: usize,
    },

    #[error("factor {factor} at position {index} is not a multiple of its predecessor {previous}")]
    NotDivisible {
        index: usize,
        previous: usize,
        factor: usize,
    },

    #[error("absolute factor overflows ({parent} x {relative})")]
    FactorOverflow { parent: usize, relative: usize },

    #[error("level {parent} already has a child attached")]
    ChildAlreadyLinked { parent: usize },

    #[error("no level with id {0}")]
    UnknownLevel(usize),
}

pub type PyramidResult<T> = Result<T, PyramidError>;
