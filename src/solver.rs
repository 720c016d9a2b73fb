//! Stop sequencing: nearest-neighbor construction followed by 2-opt.
//!
//! The route is an open path. The depot only picks the first stop (the one
//! cheapest to reach from it); it is not part of the optimized tour.

use tracing::{debug, info};

use crate::coordinate::Coordinate;
use crate::error::PlannerError;
use crate::traits::{CostMatrix, CostMatrixProvider, Stop};

/// Improvements smaller than this are treated as float noise.
const IMPROVEMENT_EPSILON: f64 = 1e-6;

/// A caller's stop with its 1-based position in the planned route.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedStop<S> {
    pub order: usize,
    pub stop: S,
}

/// Reorder `stops` into a short visiting sequence starting near `depot`.
///
/// The output is a permutation of the input; the depot is never included.
/// Lists of two stops or fewer keep their input order.
pub fn order_stops<S: Stop>(
    stops: Vec<S>,
    depot: Coordinate,
    provider: &mut dyn CostMatrixProvider,
) -> Result<Vec<OrderedStop<S>>, PlannerError> {
    let points: Vec<Coordinate> = stops.iter().map(Stop::location).collect();
    let sequence = order_indices(&points, depot, provider)?;

    let mut slots: Vec<Option<S>> = stops.into_iter().map(Some).collect();
    Ok(sequence
        .into_iter()
        .enumerate()
        .filter_map(|(position, index)| {
            slots[index].take().map(|stop| OrderedStop {
                order: position + 1,
                stop,
            })
        })
        .collect())
}

/// Same pipeline as [`order_stops`] over bare coordinates; returns the
/// visiting order as indices into `points`.
pub fn order_indices(
    points: &[Coordinate],
    depot: Coordinate,
    provider: &mut dyn CostMatrixProvider,
) -> Result<Vec<usize>, PlannerError> {
    validate(points, depot)?;

    let n = points.len();
    if n <= 2 {
        return Ok((0..n).collect());
    }

    let mut with_depot = Vec::with_capacity(n + 1);
    with_depot.push(depot);
    with_depot.extend_from_slice(points);
    let depot_matrix = provider.matrix_for(&with_depot);
    check_shape(&depot_matrix, n + 1)?;

    let seed = closest_to_depot(&depot_matrix[0][1..]);

    let matrix = provider.matrix_for(points);
    check_shape(&matrix, n)?;

    let initial = nearest_neighbor(&matrix, seed);
    let initial_cost = path_cost(&initial, &matrix);
    let improved = two_opt(&initial, &matrix);
    let final_cost = path_cost(&improved, &matrix);

    info!(
        stops = n,
        seed,
        initial_cost,
        final_cost,
        "ordered stops"
    );

    Ok(improved)
}

/// Greedy tour from `start`, always moving to the cheapest unvisited point.
///
/// Ties go to the lowest index, so the result is deterministic. A `start`
/// outside the matrix yields an empty tour.
pub fn nearest_neighbor(matrix: &CostMatrix, start: usize) -> Vec<usize> {
    let n = matrix.len();
    if start >= n {
        return Vec::new();
    }

    let mut visited = vec![false; n];
    let mut tour = Vec::with_capacity(n);
    let mut current = start;
    visited[current] = true;
    tour.push(current);

    while tour.len() < n {
        let mut best: Option<usize> = None;
        for candidate in 0..n {
            if visited[candidate] {
                continue;
            }
            match best {
                Some(b) if matrix[current][candidate] >= matrix[current][b] => {}
                _ => best = Some(candidate),
            }
        }

        let Some(next) = best else { break };
        visited[next] = true;
        tour.push(next);
        current = next;
    }

    tour
}

/// 2-opt over an open path: reverse `tour[i..=k]` whenever that strictly
/// shortens the path, sweeping until a full pass finds nothing.
///
/// `tour[0]` and the last element stay in place.
pub fn two_opt(tour: &[usize], matrix: &CostMatrix) -> Vec<usize> {
    let mut best = tour.to_vec();
    let len = best.len();
    if len < 4 {
        return best;
    }

    let cost = |a: usize, b: usize| matrix[a][b];
    let mut sweeps = 0;
    let mut improved = true;

    while improved {
        improved = false;
        sweeps += 1;

        for i in 1..len - 2 {
            for k in i + 1..len - 1 {
                let (a, b) = (best[i - 1], best[i]);
                let (c, d) = (best[k], best[k + 1]);
                let delta = (cost(a, c) + cost(b, d)) - (cost(a, b) + cost(c, d));
                if delta < -IMPROVEMENT_EPSILON {
                    best[i..=k].reverse();
                    improved = true;
                }
            }
        }
    }

    debug!(sweeps, stops = len, "2-opt converged");
    best
}

/// Sum of consecutive leg costs along `tour`.
pub fn path_cost(tour: &[usize], matrix: &CostMatrix) -> f64 {
    tour.windows(2).map(|leg| matrix[leg[0]][leg[1]]).sum()
}

fn closest_to_depot(costs: &[f64]) -> usize {
    let mut seed = 0;
    for (index, &cost) in costs.iter().enumerate() {
        if cost < costs[seed] {
            seed = index;
        }
    }
    seed
}

fn validate(points: &[Coordinate], depot: Coordinate) -> Result<(), PlannerError> {
    if !depot.is_finite() {
        return Err(PlannerError::InvalidCoordinate {
            index: None,
            lat: depot.lat,
            lng: depot.lng,
        });
    }
    if let Some((index, point)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(PlannerError::InvalidCoordinate {
            index: Some(index),
            lat: point.lat,
            lng: point.lng,
        });
    }
    Ok(())
}

fn check_shape(matrix: &CostMatrix, expected: usize) -> Result<(), PlannerError> {
    if matrix.len() != expected || matrix.iter().any(|row| row.len() != expected) {
        return Err(PlannerError::MatrixShape {
            expected,
            rows: matrix.len(),
        });
    }
    Ok(())
}
