//! Error types for instance construction, solving, and travel-matrix I/O.

use thiserror::Error;

/// Errors raised while constructing an [`crate::instance::Instance`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InstanceError {
    #[error("n must be >= 2, got {0}")]
    NTooSmall(usize),

    #[error("v must be >= 1, got {0}")]
    VTooSmall(usize),

    #[error("travel matrix d must be {n}x{n}, got {rows}x{cols}")]
    BadDistanceShape { n: usize, rows: usize, cols: usize },

    #[error("service time vector p must have length {expected}, got {actual}")]
    BadServiceTimeShape { expected: usize, actual: usize },

    #[error("time window vector tw must have length {expected}, got {actual}")]
    BadTimeWindowShape { expected: usize, actual: usize },

    #[error("client {0} has no time window (tw[{0}] is None)")]
    MissingTimeWindow(usize),

    #[error("qualification matrix Q must be {clients}x{shifts}, got {rows}x{cols}")]
    BadQualificationShape {
        clients: usize,
        shifts: usize,
        rows: usize,
        cols: usize,
    },

    #[error("shift duration vector u must have length {expected}, got {actual}")]
    BadShiftDurationShape { expected: usize, actual: usize },

    #[error("shift start vector ss must have length {expected}, got {actual}")]
    BadShiftStartShape { expected: usize, actual: usize },

    #[error("client {0} has no feasible shift (F(i) is empty)")]
    InfeasibleQualification(usize),
}

/// Errors raised by [`crate::gomea::solve`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GomeaError {
    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("population size must be >= 2, got {0}")]
    PopulationTooSmall(usize),

    #[error("generations must be >= 1, got {0}")]
    GenerationsTooSmall(u32),

    #[error("stop must be >= 1, got {0}")]
    StopTooSmall(u32),

    #[error("threshold must be >= 0.0, got {0}")]
    NegativeThreshold(f64),

    #[error("startpop has {actual} routes, expected {expected} (the configured population size)")]
    StartpopSizeMismatch { expected: usize, actual: usize },
}

/// Errors raised by [`crate::travel_matrix_io`].
#[derive(Debug, Error)]
pub enum TravelMatrixIoError {
    #[error("bad magic bytes: expected b\"CVTM\", got {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("matrix is not square: n={n} but {actual} entries present")]
    NotSquare { n: u32, actual: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
