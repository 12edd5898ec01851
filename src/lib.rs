//! carevolve — a Gene-pool Optimal Mixing Evolutionary Algorithm (GOMEA) for
//! home-care vehicle routing.
//!
//! Assigns client activities to caregiver shifts and orders them within each
//! shift to minimize a weighted cost of travel distance, shift overtime, and
//! time-window lateness, subject to qualification constraints. The crate is
//! the optimization engine only: an immutable [`instance`] description, the
//! [`schedule`] planner/evaluator, the [`encoding`] bijection between routes
//! and the real-valued key vector GOMEA searches over, [`dependency`]
//! measures and [`linkage`]-tree construction driving Optimal Mixing in
//! [`gomea`], and [`progress`] tracking for the stopping rule. Spreadsheet
//! ingestion, mapping-service travel-matrix construction, and plotting stay
//! external collaborators; [`travel_matrix_io`] only defines the on-disk
//! interchange format for the travel matrix those collaborators exchange.

pub mod dependency;
pub mod encoding;
pub mod error;
pub mod gomea;
pub mod instance;
pub mod linkage;
pub mod progress;
pub mod schedule;
pub mod travel_matrix_io;

pub use error::{GomeaError, InstanceError, TravelMatrixIoError};
pub use gomea::{solve, GomeaConfig, InstanceSnapshot, SolveResult};
pub use instance::Instance;
pub use schedule::{Arrival, CostBreakdown, CostWeights, Route};
