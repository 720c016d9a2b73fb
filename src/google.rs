//! Google Distance Matrix adapter for predicted travel times.
//!
//! Requests driving durations departing now with the `best_guess` traffic
//! model, preferring `duration_in_traffic` when the API reports it.

use serde::Deserialize;
use tracing::debug;

use crate::coordinate::Coordinate;
use crate::error::LookupError;
use crate::traits::TravelTimeLookup;

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    pub language: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub traffic_model: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: "pt-BR".to_string(),
            base_url: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
            timeout_secs: 60,
            traffic_model: "best_guess".to_string(),
        }
    }
}

impl GoogleConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

/// The API rejects requests with more destinations than this.
const MAX_DESTINATIONS_PER_REQUEST: usize = 25;

/// Cheap plausibility check for a Google API key, without spending a request.
pub fn looks_like_api_key(key: &str) -> bool {
    let key = key.trim();
    key.starts_with("AIza") && (30..=60).contains(&key.len())
}

#[derive(Debug, Clone)]
pub struct GoogleDistanceMatrix {
    config: GoogleConfig,
    client: reqwest::blocking::Client,
}

impl GoogleDistanceMatrix {
    pub fn new(config: GoogleConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// One Distance Matrix request; `destinations` must fit in a single call.
    fn request(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, LookupError> {
        debug!(
            origins = origins.len(),
            destinations = destinations.len(),
            "requesting google distance matrix"
        );

        let body = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("origins", join_points(origins)),
                ("destinations", join_points(destinations)),
                ("mode", "driving".to_string()),
                ("departure_time", "now".to_string()),
                ("traffic_model", self.config.traffic_model.clone()),
                ("language", self.config.language.clone()),
                ("key", self.config.api_key.clone()),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<DistanceMatrixResponse>())?;

        durations_from_response(body)
    }
}

impl TravelTimeLookup for GoogleDistanceMatrix {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, LookupError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows: Vec<Vec<i64>> = vec![Vec::with_capacity(destinations.len()); origins.len()];
        for block in destinations.chunks(MAX_DESTINATIONS_PER_REQUEST) {
            let block_rows = self.request(origins, block)?;
            append_columns(&mut rows, block_rows, block.len())?;
        }

        Ok(rows)
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Append one destination block's cells to each origin row.
fn append_columns(
    rows: &mut [Vec<i64>],
    block: Vec<Vec<i64>>,
    width: usize,
) -> Result<(), LookupError> {
    if block.len() != rows.len() || block.iter().any(|row| row.len() != width) {
        return Err(LookupError::Malformed(format!(
            "expected {} rows of {} elements, got {} rows",
            rows.len(),
            width,
            block.len()
        )));
    }
    for (row, cells) in rows.iter_mut().zip(block) {
        row.extend(cells);
    }
    Ok(())
}

fn join_points(points: &[Coordinate]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.lat, p.lng))
        .collect::<Vec<_>>()
        .join("|")
}

fn durations_from_response(body: DistanceMatrixResponse) -> Result<Vec<Vec<i64>>, LookupError> {
    if body.status != "OK" {
        return Err(LookupError::Status(match body.error_message {
            Some(message) => format!("{}: {}", body.status, message),
            None => body.status,
        }));
    }

    Ok(body
        .rows
        .into_iter()
        .map(|row| row.elements.into_iter().map(element_seconds).collect())
        .collect())
}

fn element_seconds(element: Element) -> i64 {
    if element.status != "OK" {
        return 0;
    }
    element
        .duration_in_traffic
        .or(element.duration)
        .map(|value| value.value.max(1))
        .unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    status: String,
    duration: Option<Value>,
    duration_in_traffic: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Value {
    value: i64,
}
