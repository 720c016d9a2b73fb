//! Error types.
//!
//! Only [`PlannerError`] and [`ConfigError`] reach callers. Lookup and cache
//! errors are recovered inside the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("non-finite coordinate ({lat}, {lng}) at {}", describe(.index))]
    InvalidCoordinate {
        /// Stop index, or `None` for the depot.
        index: Option<usize>,
        lat: f64,
        lng: f64,
    },
    #[error("cost matrix has wrong shape: expected {expected}x{expected}, got {rows} rows")]
    MatrixShape { expected: usize, rows: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn describe(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!("stop {index}"),
        None => "depot".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned status {0}")]
    Status(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache csv failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
