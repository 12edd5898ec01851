//! Population lifecycle, Optimal Mixing variation, and the generation loop
//! (spec.md §4.6) — the outer driver that ties `instance`, `schedule`,
//! `encoding`, `dependency`, `linkage` and `progress` together into
//! [`solve`].
//!
//! Grounded on `original_source/gomea.py`'s docstring for the high-level
//! shape (`Individual`/`Population` responsibilities, the
//! minimum-distance-tree-built-for-maximum-dependency note carried by
//! `crate::linkage`) and on `VPRamon-virolai/src/algorithms/rl/environment.rs`
//! for the bounded-simulation-loop-over-an-owned-`StdRng` structure.

use crate::dependency::{self, BinomialCdfCache, DepType};
use crate::encoding::{self, Key};
use crate::error::GomeaError;
use crate::instance::Instance;
use crate::linkage;
use crate::progress::ProgressMonitor;
use crate::schedule::{self, CostWeights, Route};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// The six recognized overrides from spec.md §6, plus the RNG seed and the
/// `enforce_qualification` flag spec.md §9 calls out as necessary
/// configuration despite not appearing in that table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GomeaConfig {
    /// Hard cap `G` on the number of generations.
    pub generations: u32,
    /// Population size `P`.
    pub population: usize,
    /// Initial routes, one per individual; `None` draws from
    /// [`schedule::random_route`] instead.
    pub startpop: Option<Vec<Route>>,
    /// Which dependency measure builds the linkage tree.
    pub deptype: DepType,
    /// Flat-generation ratio threshold.
    pub threshold: f64,
    /// Consecutive flat generations required to stop early.
    pub stop: u32,
    /// RNG seed. `None` draws one from OS entropy at `solve` entry; the
    /// effective seed is always recorded in [`SolveResult::seed`] so every
    /// run is reproducible after the fact (spec.md §5, §9).
    pub seed: Option<u64>,
    /// If set, a mixed candidate whose decoded route places any client in a
    /// shift with `Q = 0` is rejected outright, before scoring. Defaults to
    /// `false` to reproduce the source's documented-as-is behavior of
    /// letting Optimal Mixing freely violate qualification (spec.md §9).
    pub enforce_qualification: bool,
    /// Relative weights of the three cost components. Default `(1, 1, 1)`.
    pub weights: CostWeights,
}

impl Default for GomeaConfig {
    fn default() -> Self {
        Self {
            generations: 20,
            population: 200,
            startpop: None,
            deptype: DepType::default(),
            threshold: 0.01,
            stop: 2,
            seed: None,
            enforce_qualification: false,
            weights: CostWeights::default(),
        }
    }
}

/// Owned snapshot of an [`Instance`]'s fields, so a [`SolveResult`] can
/// outlive the instance it was computed from (spec.md §6).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceSnapshot {
    pub n: usize,
    pub v: usize,
    pub d: Vec<Vec<f64>>,
    pub p: Vec<f64>,
    pub tw: Vec<Option<(f64, f64)>>,
    pub q: Vec<Vec<bool>>,
    pub u: Vec<f64>,
    pub ss: Vec<f64>,
}

impl InstanceSnapshot {
    pub fn from_instance(instance: &Instance) -> Self {
        Self {
            n: instance.n(),
            v: instance.v(),
            d: instance
                .d()
                .iter()
                .map(|row| row.iter().map(|m| m.value()).collect())
                .collect(),
            p: instance.p().iter().map(|m| m.value()).collect(),
            tw: instance
                .tw()
                .iter()
                .map(|opt| opt.map(|w| (w.start().value(), w.end().value())))
                .collect(),
            q: instance.q().to_vec(),
            u: instance.u().iter().map(|m| m.value()).collect(),
            ss: instance.ss().iter().map(|m| m.value()).collect(),
        }
    }
}

/// Everything [`solve`] reports: the effective configuration, the best
/// route found and its score breakdown, and the full progress traces
/// (spec.md §6).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveResult {
    pub config: GomeaConfig,
    /// The RNG seed actually used (recorded even when `config.seed` was `None`).
    pub seed: u64,
    pub generations_reached: u32,
    /// Cumulative wall-clock elapsed time after each recorded entry (index 0
    /// is the initial population, before any generation runs).
    pub generation_times: Vec<Duration>,
    pub best_route: Route,
    pub best_arrival: schedule::Arrival,
    pub score: f64,
    pub distance: f64,
    pub overtime: f64,
    pub lateness: f64,
    /// Best score per generation, index 0 = initial population. Non-increasing.
    pub progress: Vec<f64>,
    /// Mean population score per generation, same indexing as `progress`.
    pub pop_means: Vec<f64>,
    pub instance: InstanceSnapshot,
}

#[derive(Debug, Clone)]
struct Individual {
    key: Key,
    key_int: Vec<usize>,
    key_dec: Vec<f64>,
    score: f64,
}

impl Individual {
    fn from_route(instance: &Instance, route: &Route, weights: CostWeights, rng: &mut impl Rng) -> Self {
        let (key, key_int, key_dec) = encoding::encode(route, instance.num_clients(), rng);
        let (_, breakdown) = schedule::evaluate(instance, route, weights);
        Self { key, key_int, key_dec, score: breakdown.score }
    }
}

fn violates_qualification(instance: &Instance, route: &Route) -> bool {
    route
        .iter()
        .enumerate()
        .any(|(k, clients)| clients.iter().any(|&c| !instance.is_qualified(c, k)))
}

fn summarize(individuals: &[Individual]) -> (f64, f64) {
    let best = individuals
        .iter()
        .map(|ind| ind.score)
        .fold(f64::INFINITY, f64::min);
    let mean = individuals.iter().map(|ind| ind.score).sum::<f64>() / individuals.len() as f64;
    (best, mean)
}

/// Runs one full generation in place: reencode every individual, recompute
/// pairwise dependencies, rebuild the linkage tree, then perform Optimal
/// Mixing for every individual against a fresh random donor per FOS node
/// (spec.md §4.6).
///
/// Donor reads and target writes both go through `individuals` directly —
/// an individual mixed earlier in this loop is visible as a donor to one
/// mixed later, matching the source's in-place semantics (spec.md §4.6, §9).
fn run_generation(
    instance: &Instance,
    individuals: &mut [Individual],
    config: &GomeaConfig,
    cache: &BinomialCdfCache,
    rng: &mut StdRng,
) {
    let num_clients = instance.num_clients();
    let v = instance.v();

    for ind in individuals.iter_mut() {
        let (key, key_int, key_dec) = encoding::reencode(&ind.key, v, rng);
        ind.key = key;
        ind.key_int = key_int;
        ind.key_dec = key_dec;
    }

    let key_ints: Vec<Vec<usize>> = individuals.iter().map(|ind| ind.key_int.clone()).collect();
    let distances = dependency::pairwise_distances(&key_ints, num_clients, v, config.deptype, cache, rng);
    let tree = linkage::build_tree(num_clients, &distances);

    let p = individuals.len();
    for x_idx in 0..p {
        let mut node_order: Vec<usize> = (0..tree.num_nodes()).collect();
        node_order.shuffle(rng);

        for node_id in node_order {
            let fos = tree.fos(node_id);
            let donor_idx = rng.gen_range(0..p);

            let donor_key: Vec<f64> = fos.iter().map(|&j| individuals[donor_idx].key[j]).collect();
            let donor_key_int: Vec<usize> = fos.iter().map(|&j| individuals[donor_idx].key_int[j]).collect();
            let donor_key_dec: Vec<f64> = fos.iter().map(|&j| individuals[donor_idx].key_dec[j]).collect();

            let mut candidate_key = individuals[x_idx].key.clone();
            for (slot, &j) in fos.iter().enumerate() {
                candidate_key[j] = donor_key[slot];
            }

            let candidate_route = encoding::decode(&candidate_key, v);
            if config.enforce_qualification && violates_qualification(instance, &candidate_route) {
                continue;
            }

            let (_, breakdown) = schedule::evaluate(instance, &candidate_route, config.weights);
            if breakdown.score < individuals[x_idx].score {
                let x = &mut individuals[x_idx];
                x.key = candidate_key;
                x.score = breakdown.score;
                for (slot, &j) in fos.iter().enumerate() {
                    x.key_int[j] = donor_key_int[slot];
                    x.key_dec[j] = donor_key_dec[slot];
                }
            }
        }
    }
}

/// Runs GOMEA to (approximately) minimize schedule cost over `instance`.
///
/// Validates `config` first (empty population, zero generations/stop,
/// negative threshold, mismatched `startpop` size all fail synchronously
/// before any work happens, spec.md §7), then seeds one `StdRng` for the
/// whole run, builds the initial population, and repeats
/// [`run_generation`] until either `config.generations` is reached or the
/// progress monitor reports `config.stop` consecutive flat generations.
pub fn solve(instance: &Instance, config: GomeaConfig) -> Result<SolveResult, GomeaError> {
    if config.population < 2 {
        return Err(GomeaError::PopulationTooSmall(config.population));
    }
    if config.generations < 1 {
        return Err(GomeaError::GenerationsTooSmall(config.generations));
    }
    if config.stop < 1 {
        return Err(GomeaError::StopTooSmall(config.stop));
    }
    if config.threshold < 0.0 {
        return Err(GomeaError::NegativeThreshold(config.threshold));
    }
    if let Some(startpop) = &config.startpop {
        if startpop.len() != config.population {
            return Err(GomeaError::StartpopSizeMismatch {
                expected: config.population,
                actual: startpop.len(),
            });
        }
    }

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let start = Instant::now();

    info!(
        "gomea solve starting: n={} v={} population={} generations={} deptype={:?} seed={}",
        instance.n(),
        instance.v(),
        config.population,
        config.generations,
        config.deptype,
        seed
    );

    let v = instance.v();
    let mut individuals: Vec<Individual> = match &config.startpop {
        Some(routes) => routes
            .iter()
            .map(|route| Individual::from_route(instance, route, config.weights, &mut rng))
            .collect(),
        None => (0..config.population)
            .map(|_| {
                let route = schedule::random_route(instance, &mut rng);
                Individual::from_route(instance, &route, config.weights, &mut rng)
            })
            .collect(),
    };

    // P and q = 1/v are fixed for the whole run, so the binomial CDF cache
    // is built once here and reused by every generation (spec.md §4.4, §5).
    let cache = BinomialCdfCache::new(config.population, 1.0 / v as f64);

    let mut monitor = ProgressMonitor::new(config.threshold, config.stop);
    let mut generation_times = Vec::new();

    let (best0, mean0) = summarize(&individuals);
    monitor.record(best0, mean0);
    generation_times.push(start.elapsed());

    let mut generations_reached = 0u32;
    for _ in 0..config.generations {
        run_generation(instance, &mut individuals, &config, &cache, &mut rng);

        let (best, mean) = summarize(&individuals);
        monitor.record(best, mean);
        generation_times.push(start.elapsed());
        generations_reached += 1;

        debug!(
            "generation {} best={:.3} mean={:.3} flat_count={}",
            generations_reached,
            best,
            mean,
            monitor.flat_count()
        );

        if monitor.should_stop() {
            break;
        }
    }

    let best_idx = individuals
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.score.partial_cmp(&b.score).expect("scores are never NaN"))
        .map(|(idx, _)| idx)
        .expect("population is nonempty (validated at entry)");

    let best_route = encoding::decode(&individuals[best_idx].key, v);
    let (best_arrival, breakdown) = schedule::evaluate(instance, &best_route, config.weights);

    info!(
        "gomea solve finished: generations_reached={} best_score={:.3} elapsed={:?}",
        generations_reached,
        breakdown.score,
        start.elapsed()
    );

    Ok(SolveResult {
        seed,
        generations_reached,
        generation_times,
        best_route,
        best_arrival,
        score: breakdown.score,
        distance: breakdown.distance.value(),
        overtime: breakdown.overtime.value(),
        lateness: breakdown.lateness.value(),
        progress: monitor.progress().to_vec(),
        pop_means: monitor.pop_means().to_vec(),
        instance: InstanceSnapshot::from_instance(instance),
        config,
    })
}
