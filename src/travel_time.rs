//! Travel-time cost provider backed by the cache and an external lookup.
//!
//! Cache misses are grouped by origin so a matrix over N points costs at most
//! N external calls. Anything the lookup cannot answer is filled with the
//! haversine estimate, so the returned matrix is always complete.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::cache::CostCache;
use crate::coordinate::Coordinate;
use crate::haversine::fallback_seconds;
use crate::traits::{CostMatrix, CostMatrixProvider, TravelTimeLookup};

pub struct TravelTimeMatrix {
    lookup: Option<Box<dyn TravelTimeLookup>>,
    cache: CostCache,
    fallback_speed_kmh: f64,
    lookup_calls: usize,
}

impl TravelTimeMatrix {
    /// With `lookup = None` every miss is estimated and nothing is cached.
    pub fn new(
        lookup: Option<Box<dyn TravelTimeLookup>>,
        cache: CostCache,
        fallback_speed_kmh: f64,
    ) -> Self {
        Self {
            lookup,
            cache,
            fallback_speed_kmh,
            lookup_calls: 0,
        }
    }

    pub fn cache(&self) -> &CostCache {
        &self.cache
    }

    pub fn into_cache(self) -> CostCache {
        self.cache
    }

    /// External calls issued since construction.
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls
    }

    /// Ask the lookup for one origin row. `None` means the whole group must
    /// fall back.
    fn lookup_row(&mut self, origin: Coordinate, destinations: &[Coordinate]) -> Option<Vec<i64>> {
        let lookup = self.lookup.as_ref()?;
        self.lookup_calls += 1;

        match lookup.durations(&[origin], destinations) {
            Ok(mut rows) if rows.len() == 1 && rows[0].len() == destinations.len() => rows.pop(),
            Ok(rows) => {
                warn!(
                    lookup = lookup.name(),
                    rows = rows.len(),
                    expected = destinations.len(),
                    "travel time lookup returned a malformed matrix, using fallback"
                );
                None
            }
            Err(err) => {
                warn!(lookup = lookup.name(), error = %err, "travel time lookup failed, using fallback");
                None
            }
        }
    }
}

impl CostMatrixProvider for TravelTimeMatrix {
    fn matrix_for(&mut self, points: &[Coordinate]) -> CostMatrix {
        let n = points.len();
        let mut matrix = vec![vec![0.0; n]; n];
        let mut misses: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                match self.cache.get(points[i], points[j]) {
                    Some(secs) if secs > 0 => matrix[i][j] = secs as f64,
                    _ => misses.entry(i).or_default().push(j),
                }
            }
        }

        let missing: usize = misses.values().map(Vec::len).sum();
        debug!(points = n, missing, origins = misses.len(), "travel time cache lookup");
        if missing == 0 {
            return matrix;
        }

        if self.lookup.is_none() {
            for (i, js) in misses {
                for j in js {
                    matrix[i][j] = fallback_seconds(points[i], points[j], self.fallback_speed_kmh) as f64;
                }
            }
            return matrix;
        }

        for (i, js) in misses {
            let destinations: Vec<Coordinate> = js.iter().map(|&j| points[j]).collect();
            let row = self.lookup_row(points[i], &destinations);

            for (col, &j) in js.iter().enumerate() {
                let secs = row
                    .as_ref()
                    .map(|row| row[col])
                    .filter(|&secs| secs > 0)
                    .unwrap_or_else(|| fallback_seconds(points[i], points[j], self.fallback_speed_kmh));
                matrix[i][j] = secs as f64;
                self.cache.put(points[i], points[j], secs);
            }
        }

        self.cache.flush();
        matrix
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::LookupError;

    /// Lookup returning a fixed duration and recording each call.
    struct Recording {
        seconds: i64,
        calls: Rc<RefCell<Vec<(usize, usize)>>>,
    }

    impl TravelTimeLookup for Recording {
        fn durations(
            &self,
            origins: &[Coordinate],
            destinations: &[Coordinate],
        ) -> Result<Vec<Vec<i64>>, LookupError> {
            self.calls.borrow_mut().push((origins.len(), destinations.len()));
            Ok(vec![vec![self.seconds; destinations.len()]; origins.len()])
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct Truncated;

    impl TravelTimeLookup for Truncated {
        fn durations(
            &self,
            _origins: &[Coordinate],
            _destinations: &[Coordinate],
        ) -> Result<Vec<Vec<i64>>, LookupError> {
            Ok(vec![vec![60]])
        }

        fn name(&self) -> &str {
            "truncated"
        }
    }

    fn points() -> Vec<Coordinate> {
        vec![
            Coordinate::new(-23.5505, -46.6333),
            Coordinate::new(-23.5614, -46.6559),
            Coordinate::new(-23.5329, -46.6395),
        ]
    }

    #[test]
    fn test_one_call_per_origin_covering_all_destinations() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let lookup = Recording { seconds: 300, calls: calls.clone() };
        let mut provider = TravelTimeMatrix::new(Some(Box::new(lookup)), CostCache::default(), 35.0);

        let matrix = provider.matrix_for(&points());

        assert_eq!(*calls.borrow(), vec![(1, 2), (1, 2), (1, 2)]);
        assert_eq!(provider.lookup_calls(), 3);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 0.0 } else { 300.0 };
                assert_eq!(matrix[i][j], expected);
            }
        }
        assert_eq!(provider.cache().len(), 6);
    }

    #[test]
    fn test_partial_hits_only_request_missing_destinations() {
        let pts = points();
        let mut cache = CostCache::default();
        cache.put(pts[0], pts[1], 111);
        cache.put(pts[0], pts[2], 222);
        cache.put(pts[1], pts[0], 333);

        let calls = Rc::new(RefCell::new(Vec::new()));
        let lookup = Recording { seconds: 500, calls: calls.clone() };
        let mut provider = TravelTimeMatrix::new(Some(Box::new(lookup)), cache, 35.0);

        let matrix = provider.matrix_for(&pts);

        assert_eq!(*calls.borrow(), vec![(1, 1), (1, 2)]);
        assert_eq!(matrix[0][1], 111.0);
        assert_eq!(matrix[0][2], 222.0);
        assert_eq!(matrix[1][0], 333.0);
        assert_eq!(matrix[1][2], 500.0);
        assert_eq!(matrix[2][0], 500.0);
    }

    #[test]
    fn test_zero_durations_use_fallback() {
        let pts = points();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let lookup = Recording { seconds: 0, calls };
        let mut provider = TravelTimeMatrix::new(Some(Box::new(lookup)), CostCache::default(), 35.0);

        let matrix = provider.matrix_for(&pts);

        assert_eq!(matrix[0][1], fallback_seconds(pts[0], pts[1], 35.0) as f64);
        assert!(matrix[0][1] > 0.0);
        assert_eq!(provider.cache().get(pts[0], pts[1]), Some(matrix[0][1] as i64));
    }

    #[test]
    fn test_malformed_row_falls_back_for_whole_group() {
        let pts = points();
        let mut provider = TravelTimeMatrix::new(Some(Box::new(Truncated)), CostCache::default(), 35.0);

        let matrix = provider.matrix_for(&pts);

        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert_eq!(matrix[i][j], fallback_seconds(pts[i], pts[j], 35.0) as f64);
                }
            }
        }
    }

    #[test]
    fn test_without_lookup_estimates_and_does_not_cache() {
        let pts = points();
        let mut provider = TravelTimeMatrix::new(None, CostCache::default(), 35.0);

        let matrix = provider.matrix_for(&pts);

        assert_eq!(matrix[2][1], fallback_seconds(pts[2], pts[1], 35.0) as f64);
        assert_eq!(provider.lookup_calls(), 0);
        assert!(provider.cache().is_empty());
    }

    #[test]
    fn test_nearby_distinct_points_never_cost_zero() {
        let pts = [Coordinate::new(-23.55, -46.63), Coordinate::new(-23.55003, -46.63)];
        let mut provider = TravelTimeMatrix::new(None, CostCache::default(), 35.0);

        let matrix = provider.matrix_for(&pts);

        assert_eq!(matrix[0][0], 0.0);
        assert!(matrix[0][1] > 0.0);
        assert!(matrix[1][0] > 0.0);
    }

    #[test]
    fn test_zero_cached_cost_is_refetched() {
        let pts = points();
        let mut cache = CostCache::default();
        cache.put(pts[0], pts[1], 0);
        cache.put(pts[0], pts[2], 222);

        let calls = Rc::new(RefCell::new(Vec::new()));
        let lookup = Recording { seconds: 500, calls: calls.clone() };
        let mut provider = TravelTimeMatrix::new(Some(Box::new(lookup)), cache, 35.0);

        let matrix = provider.matrix_for(&pts);

        assert_eq!(calls.borrow()[0], (1, 1));
        assert_eq!(matrix[0][1], 500.0);
        assert_eq!(matrix[0][2], 222.0);
        assert_eq!(provider.cache().get(pts[0], pts[1]), Some(500));
    }

    #[test]
    fn test_empty_and_single_point() {
        let mut provider = TravelTimeMatrix::new(None, CostCache::default(), 35.0);
        assert!(provider.matrix_for(&[]).is_empty());
        assert_eq!(provider.matrix_for(&points()[..1]), vec![vec![0.0]]);
    }
}
