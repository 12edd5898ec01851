//! Planner/evaluator: turns a [`Route`] into an [`Arrival`] plan and a
//! [`CostBreakdown`] (spec.md §4.1), plus the random initial-route generator
//! (spec.md §4.2).
//!
//! Grounded on `original_source/schedule.py` (`r_arrival`, `get_arrival`,
//! `distance`/`waiting_time`/`shift_overtime`, `random_route`), carried over
//! with the exact same arithmetic and the arrival-vector indexing spec.md
//! §4.1 calls out as load-bearing.

use crate::instance::{Instance, Minutes};
use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Per-shift ordering of client ids (`1..n`). Index `k` is shift `k`'s route;
/// an empty inner vector means shift `k` serves no one.
pub type Route = Vec<Vec<usize>>;

/// Per-shift arrival-time sequence: `None` for an empty shift, otherwise
/// `[base_departure, arrival_1, .., arrival_m, base_return]`.
pub type Arrival = Vec<Option<Vec<Minutes>>>;

/// Relative weights of the three cost components (spec.md §4.1); default
/// `(1, 1, 1)`. Not one of the six recognized overrides in spec.md §6 (which
/// is silent on it beyond stating the default), exposed here as its own
/// `Default`-deriving struct per the teacher's `RLConfig` convention.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostWeights {
    pub wx: f64,
    pub wy: f64,
    pub wz: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            wx: 1.0,
            wy: 1.0,
            wz: 1.0,
        }
    }
}

/// The three cost components plus the weighted total score.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostBreakdown {
    pub distance: Minutes,
    pub overtime: Minutes,
    pub lateness: Minutes,
    pub score: f64,
}

fn qmax(a: Minutes, b: Minutes) -> Minutes {
    if a.value() >= b.value() {
        a
    } else {
        b
    }
}

fn zero() -> Minutes {
    Minutes::new(0.0)
}

/// Computes the arrival-time sequence for one nonempty shift's client list.
///
/// `clients` are 1-based location ids (`1..n`), in visiting order.
fn arrival_for_shift(instance: &Instance, shift: usize, clients: &[usize]) -> Vec<Minutes> {
    debug_assert!(!clients.is_empty());

    let d = instance.d();
    let p = instance.p();
    let tw = instance.tw();
    let ss_k = instance.ss()[shift];

    let c1 = clients[0];
    let tw1 = tw[c1].expect("client location must carry a time window");

    let a0 = qmax(ss_k, tw1.start() - d[0][c1]);
    let mut a = Vec::with_capacity(clients.len() + 2);
    a.push(a0);
    a.push(a0 + d[0][c1]);

    for pos in 1..clients.len() {
        let cj = clients[pos - 1];
        let cj1 = clients[pos];
        let tw_next = tw[cj1].expect("client location must carry a time window").start();
        let next = qmax(a[pos] + p[cj] + d[cj][cj1], tw_next);
        a.push(next);
    }

    let cm = *clients.last().expect("clients is nonempty");
    let last = a[clients.len()] + p[cm] + d[cm][0];
    a.push(last);
    a
}

/// Plans arrival times for every shift in `route` (spec.md §4.1).
pub fn plan(instance: &Instance, route: &Route) -> Arrival {
    route
        .iter()
        .enumerate()
        .map(|(k, clients)| {
            if clients.is_empty() {
                None
            } else {
                Some(arrival_for_shift(instance, k, clients))
            }
        })
        .collect()
}

/// Computes the three cost components and the weighted score for an
/// already-planned `(route, arrival)` pair (spec.md §4.1).
pub fn cost(instance: &Instance, route: &Route, arrival: &Arrival, weights: CostWeights) -> CostBreakdown {
    let mut distance = zero();
    let mut overtime = zero();
    let mut lateness = zero();

    let tw = instance.tw();
    let d = instance.d();
    let u = instance.u();

    for (k, clients) in route.iter().enumerate() {
        let Some(a) = &arrival[k] else {
            continue;
        };
        debug_assert!(!clients.is_empty());

        distance = distance + d[0][clients[0]];
        for pair in clients.windows(2) {
            distance = distance + d[pair[0]][pair[1]];
        }
        let last = *clients.last().unwrap();
        distance = distance + d[last][0];

        for (j, &client) in clients.iter().enumerate() {
            let end = tw[client].expect("client location must carry a time window").end();
            let late = a[j + 1] - end;
            if late.value() > 0.0 {
                lateness = lateness + late;
            }
        }

        let duration = u[k];
        let shift_over = a[a.len() - 1] - (a[0] + duration);
        if shift_over.value() > 0.0 {
            overtime = overtime + shift_over;
        }
    }

    let score = weights.wx * distance.value() + weights.wy * overtime.value() + weights.wz * lateness.value();

    CostBreakdown {
        distance,
        overtime,
        lateness,
        score,
    }
}

/// Plans and scores `route` in one call.
pub fn evaluate(instance: &Instance, route: &Route, weights: CostWeights) -> (Arrival, CostBreakdown) {
    let arrival = plan(instance, route);
    let breakdown = cost(instance, route, &arrival, weights);
    (arrival, breakdown)
}

/// Generates a uniformly-random feasible route (spec.md §4.2).
///
/// Repeatedly picks a random active shift, then a random still-unassigned
/// client feasible for it; a shift with no remaining feasible client is
/// removed from the active set. Terminates once every client is assigned,
/// which is guaranteed by `Instance`'s qualification-feasibility invariant.
pub fn random_route(instance: &Instance, rng: &mut impl Rng) -> Route {
    let num_clients = instance.num_clients();
    let v = instance.v();

    let counts: Vec<usize> = (1..instance.n()).map(|c| instance.feasible_shifts(c).len()).collect();
    if counts.iter().any(|&c| c > 1) {
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let variance = counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64;
        if mean > 0.0 && variance.sqrt() / mean > 0.75 {
            warn!(
                "random_route: instance has a highly skewed qualification matrix \
                 (mean feasible shifts/client = {mean:.2}, stddev = {:.2}); initial \
                 routes may concentrate heavily on a few shifts",
                variance.sqrt()
            );
        }
    }

    let mut remaining: HashSet<usize> = (0..num_clients).collect();
    let mut active: Vec<usize> = (0..v).collect();
    let mut route: Route = vec![Vec::new(); v];

    while !remaining.is_empty() {
        let &k = active
            .choose(rng)
            .expect("active is nonempty while remaining is nonempty (instance feasibility invariant)");

        let feasible_here: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&c| instance.is_qualified(c + 1, k))
            .collect();

        if feasible_here.is_empty() {
            active.retain(|&x| x != k);
            continue;
        }

        let &c = feasible_here.choose(rng).expect("feasible_here is nonempty");
        route[k].push(c + 1);
        remaining.remove(&c);
    }

    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::FieldSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn worked_example() -> Instance {
        Instance::from_fields(
            3,
            1,
            FieldSource::Supplied(vec![
                vec![0.0, 5.0, 9.0],
                vec![5.0, 0.0, 7.0],
                vec![9.0, 7.0, 0.0],
            ]),
            FieldSource::Supplied(vec![0.0, 10.0, 10.0]),
            FieldSource::Supplied(vec![None, Some((0.0, 100.0)), Some((0.0, 100.0))]),
            FieldSource::Supplied(vec![vec![true], vec![true]]),
            FieldSource::Supplied(vec![60.0]),
            FieldSource::Supplied(vec![0.0]),
        )
        .unwrap()
    }

    #[test]
    fn worked_distance_and_arrival_example() {
        let instance = worked_example();
        let route: Route = vec![vec![1, 2]];
        let (arrival, breakdown) = evaluate(&instance, &route, CostWeights::default());

        let a = arrival[0].as_ref().unwrap();
        let expected = [0.0, 5.0, 22.0, 41.0];
        for (got, want) in a.iter().zip(expected.iter()) {
            assert!((got.value() - want).abs() < 1e-9);
        }

        assert!((breakdown.distance.value() - 21.0).abs() < 1e-9);
        assert_eq!(breakdown.overtime.value(), 0.0);
        assert_eq!(breakdown.lateness.value(), 0.0);
        assert!((breakdown.score - 21.0).abs() < 1e-9);
    }

    #[test]
    fn empty_shift_contributes_nothing() {
        let instance = Instance::from_fields(
            3,
            2,
            FieldSource::Supplied(vec![
                vec![0.0, 5.0, 9.0],
                vec![5.0, 0.0, 7.0],
                vec![9.0, 7.0, 0.0],
            ]),
            FieldSource::Supplied(vec![0.0, 10.0, 10.0]),
            FieldSource::Supplied(vec![None, Some((0.0, 100.0)), Some((0.0, 100.0))]),
            FieldSource::Supplied(vec![vec![true, true], vec![true, true]]),
            FieldSource::Supplied(vec![60.0, 60.0]),
            FieldSource::Supplied(vec![0.0, 0.0]),
        )
        .unwrap();

        let route: Route = vec![vec![1, 2], vec![]];
        let (arrival, breakdown) = evaluate(&instance, &route, CostWeights::default());
        assert!(arrival[1].is_none());
        // Only shift 0 contributes; same numbers as the worked example.
        assert!((breakdown.distance.value() - 21.0).abs() < 1e-9);
        assert_eq!(breakdown.overtime.value(), 0.0);
    }

    #[test]
    fn lateness_is_penalized_past_window_end() {
        let instance = Instance::from_fields(
            3,
            1,
            FieldSource::Supplied(vec![
                vec![0.0, 5.0, 9.0],
                vec![5.0, 0.0, 7.0],
                vec![9.0, 7.0, 0.0],
            ]),
            FieldSource::Supplied(vec![0.0, 10.0, 10.0]),
            FieldSource::Supplied(vec![None, Some((0.0, 3.0)), Some((0.0, 100.0))]),
            FieldSource::Supplied(vec![vec![true], vec![true]]),
            FieldSource::Supplied(vec![60.0]),
            FieldSource::Supplied(vec![0.0]),
        )
        .unwrap();
        let route: Route = vec![vec![1, 2]];
        let (_, breakdown) = evaluate(&instance, &route, CostWeights::default());
        // client 1 arrives at minute 5, window end is 3 -> lateness 2.
        assert!((breakdown.lateness.value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn overtime_is_penalized_past_shift_end() {
        let instance = Instance::from_fields(
            3,
            1,
            FieldSource::Supplied(vec![
                vec![0.0, 5.0, 9.0],
                vec![5.0, 0.0, 7.0],
                vec![9.0, 7.0, 0.0],
            ]),
            FieldSource::Supplied(vec![0.0, 10.0, 10.0]),
            FieldSource::Supplied(vec![None, Some((0.0, 100.0)), Some((0.0, 100.0))]),
            FieldSource::Supplied(vec![vec![true], vec![true]]),
            FieldSource::Supplied(vec![20.0]),
            FieldSource::Supplied(vec![0.0]),
        )
        .unwrap();
        let route: Route = vec![vec![1, 2]];
        let (_, breakdown) = evaluate(&instance, &route, CostWeights::default());
        // shift ends at 0+20=20, return to base at 41 -> overtime 21.
        assert!((breakdown.overtime.value() - 21.0).abs() < 1e-9);
    }

    #[test]
    fn planner_lower_bounds_hold() {
        let instance = worked_example();
        let route: Route = vec![vec![1, 2]];
        let arrival = plan(&instance, &route);
        let a = arrival[0].as_ref().unwrap();
        assert!(a[0].value() >= instance.ss()[0].value());
        for (j, &client) in route[0].iter().enumerate() {
            let tw_start = instance.tw()[client].unwrap().start().value();
            assert!(a[j + 1].value() >= tw_start);
        }
    }

    #[test]
    fn random_route_covers_every_client_exactly_once() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..25 {
            let instance = Instance::random_with_rng(8, 3, &mut rng);
            let route = random_route(&instance, &mut rng);
            let mut seen: Vec<usize> = route.iter().flatten().copied().collect();
            seen.sort_unstable();
            let expected: Vec<usize> = (1..instance.n()).collect();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn random_route_respects_qualification() {
        let mut rng = StdRng::seed_from_u64(2);
        let instance = Instance::from_fields(
            4,
            2,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Supplied(vec![vec![true, false], vec![false, true], vec![true, true]]),
            FieldSource::Synthesize,
            FieldSource::Synthesize,
        )
        .unwrap();
        for _ in 0..25 {
            let route = random_route(&instance, &mut rng);
            for (k, clients) in route.iter().enumerate() {
                for &c in clients {
                    assert!(instance.is_qualified(c, k));
                }
            }
        }
    }
}
