//! Core traits for the route-ordering engine.
//!
//! Callers implement [`Stop`] for their own delivery records; cost sources
//! implement [`CostMatrixProvider`] or [`TravelTimeLookup`].

use crate::coordinate::Coordinate;
use crate::error::LookupError;

/// Square cost table indexed by origin × destination.
pub type CostMatrix = Vec<Vec<f64>>;

/// A delivery stop to be sequenced.
///
/// The engine only reads the location; everything else on the record is
/// carried through untouched.
pub trait Stop {
    fn location(&self) -> Coordinate;
}

impl Stop for Coordinate {
    fn location(&self) -> Coordinate {
        *self
    }
}

/// Provides a cost matrix for a set of points.
///
/// The matrix is indexed by the provided point order, has a zero diagonal
/// and must be `points.len()` square.
pub trait CostMatrixProvider {
    fn matrix_for(&mut self, points: &[Coordinate]) -> CostMatrix;
}

/// Batched travel-time source (Google Distance Matrix, OSRM table, ...).
///
/// Returns one row per origin and one column per destination, in seconds.
/// Cells the service could not route are reported as `0`.
pub trait TravelTimeLookup {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, LookupError>;

    /// Name used in log lines.
    fn name(&self) -> &str;
}
