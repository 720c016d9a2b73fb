//! stop-sequencer
//!
//! Orders delivery stops into a short route from a depot, using distance or
//! cached travel-time costs.

pub mod cache;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod google;
pub mod haversine;
pub mod osrm;
pub mod solver;
pub mod traits;
pub mod travel_time;

pub use coordinate::Coordinate;
