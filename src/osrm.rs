//! OSRM HTTP adapter for travel-time lookups.

use serde::Deserialize;

use crate::coordinate::Coordinate;
use crate::error::LookupError;
use crate::traits::TravelTimeLookup;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// `/table` URL with origins first, then destinations, selected through
    /// the `sources` and `destinations` index lists.
    fn table_url(&self, origins: &[Coordinate], destinations: &[Coordinate]) -> String {
        let coords = origins
            .iter()
            .chain(destinations)
            .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        let sources = index_list(0..origins.len());
        let targets = index_list(origins.len()..origins.len() + destinations.len());

        format!(
            "{}/table/v1/{}/{}?annotations=duration&sources={}&destinations={}",
            self.config.base_url, self.config.profile, coords, sources, targets
        )
    }
}

fn index_list(range: std::ops::Range<usize>) -> String {
    range.map(|i| i.to_string()).collect::<Vec<_>>().join(";")
}

impl TravelTimeLookup for OsrmClient {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, LookupError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(Vec::new());
        }

        let body = self
            .client
            .get(self.table_url(origins, destinations))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())?;

        durations_from_table(body)
    }

    fn name(&self) -> &str {
        "osrm"
    }
}

fn durations_from_table(body: OsrmTableResponse) -> Result<Vec<Vec<i64>>, LookupError> {
    if body.code != "Ok" {
        return Err(LookupError::Status(body.code));
    }

    let durations = body
        .durations
        .ok_or_else(|| LookupError::Malformed("missing durations".to_string()))?;

    Ok(durations
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| match value {
                    Some(secs) if secs > 0.0 => (secs.round() as i64).max(1),
                    _ => 0,
                })
                .collect()
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    durations: Option<Vec<Vec<Option<f64>>>>,
}
