//! Test fixtures for stop-sequencer.
//!
//! Provides real São Paulo delivery locations and a depot.

pub mod sao_paulo_locations;

pub use sao_paulo_locations::*;
