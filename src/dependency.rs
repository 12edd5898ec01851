//! Per-variable-pair statistical "distance" measures over the current
//! population (spec.md §4.4), consumed by [`crate::linkage`] to build the FOS.
//!
//! Three measures selectable via [`DepType`]. The binomial tail probability
//! behind `DepType::Extended` is the one place this crate caches a derived
//! table across calls: `BinomialCdfCache` is built once per `solve` run (`P`,
//! `q = 1/v` are fixed for the run) and reused across every generation and
//! every pair, per spec.md §4.4/§5.

use rand::Rng;

/// Selects which pairwise dependency measure [`pairwise_distances`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DepType {
    /// Binomial two-tailed hypothesis test on co-shift assignment (spec.md §4.4, `deptype=1`).
    Extended,
    /// Entropy-deviation "inner dependency" on the same co-shift indicator (`deptype=2`).
    Standard,
    /// Independent `Uniform(0,1)` draw per pair, ignoring the population (`deptype=3`).
    Random,
}

impl Default for DepType {
    fn default() -> Self {
        DepType::Extended
    }
}

/// A cached table of `Binomial(p, q)` CDF values, built once per `solve` call
/// and shared across generations and pairs (spec.md §4.4, §5).
///
/// `p` is the population size and `q = 1/v` is the null co-shift probability
/// under independent uniform shift assignment; both are constant for the
/// lifetime of a single `solve` run, so the whole CDF table is precomputed
/// eagerly rather than memoized lazily per-key.
#[derive(Debug, Clone)]
pub struct BinomialCdfCache {
    p: usize,
    q: f64,
    /// `cdf[k] = P(X <= k)`, length `p + 1`.
    cdf: Vec<f64>,
}

impl BinomialCdfCache {
    /// Precomputes `Binomial(p, q)`'s CDF via a numerically stable running
    /// log-binomial-coefficient (no factorial overflow, no special-function
    /// crate needed): `ln C(n,k) = ln C(n,k-1) + ln((n-k+1)/k)`.
    pub fn new(p: usize, q: f64) -> Self {
        let q = q.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
        let ln_q = q.ln();
        let ln_1mq = (1.0 - q).ln();

        let mut pmf = vec![0.0; p + 1];
        let mut ln_choose = 0.0_f64; // ln C(p, 0)
        pmf[0] = (p as f64 * ln_1mq).exp();
        for k in 1..=p {
            ln_choose += ((p - k + 1) as f64 / k as f64).ln();
            let ln_pmf = ln_choose + (k as f64) * ln_q + ((p - k) as f64) * ln_1mq;
            pmf[k] = ln_pmf.exp();
        }

        let mut cdf = vec![0.0; p + 1];
        let mut acc = 0.0;
        for (k, &pk) in pmf.iter().enumerate() {
            acc = (acc + pk).min(1.0);
            cdf[k] = acc;
        }

        Self { p, q, cdf }
    }

    /// Two-tailed tail probability `T(k; P, q)`: the probability under the
    /// null of observing a count at least as extreme as `k`.
    pub fn two_tailed(&self, k: usize) -> f64 {
        debug_assert!(k <= self.p);
        let mean = self.p as f64 * self.q;
        if (k as f64) >= mean {
            let upper = if k == 0 { 1.0 } else { 1.0 - self.cdf[k - 1] };
            (2.0 * upper).min(1.0)
        } else {
            (2.0 * self.cdf[k]).min(1.0)
        }
    }
}

fn co_shift_count(key_ints: &[Vec<usize>], i: usize, j: usize) -> usize {
    key_ints.iter().filter(|assignment| assignment[i] == assignment[j]).count()
}

fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        0.0
    } else {
        -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
    }
}

/// `deptype = 1`: extended (binomial) dependency. `dep = 1 - T`, returns
/// `1 - dep^(2/3)` (spec.md §4.4).
fn extended_dependency(key_ints: &[Vec<usize>], i: usize, j: usize, cache: &BinomialCdfCache) -> f64 {
    let k = co_shift_count(key_ints, i, j);
    let t = cache.two_tailed(k);
    let dep = 1.0 - t;
    1.0 - dep.powf(2.0 / 3.0)
}

/// `deptype = 2`: standard pGOMEA dependency. Compares the observed co-shift
/// indicator's binary entropy against its null (independent, `q = 1/v`)
/// entropy, normalized by the null entropy, returning `1 - dep`.
fn standard_dependency(key_ints: &[Vec<usize>], i: usize, j: usize, v: usize) -> f64 {
    let p_count = key_ints.len();
    let p_hat = co_shift_count(key_ints, i, j) as f64 / p_count as f64;
    let q = 1.0 / v as f64;

    let h_null = binary_entropy(q);
    let h_obs = binary_entropy(p_hat);
    let dep = if h_null <= 0.0 {
        0.0
    } else {
        ((h_null - h_obs).abs() / h_null).min(1.0)
    };
    1.0 - dep
}

/// Computes the condensed (row-major upper-triangle) pairwise distance
/// vector over `0 <= i < j < num_clients`, in the same `i`-then-`j` order
/// [`crate::linkage::build_tree`] expects.
pub fn pairwise_distances(
    key_ints: &[Vec<usize>],
    num_clients: usize,
    v: usize,
    deptype: DepType,
    cache: &BinomialCdfCache,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let mut out = Vec::with_capacity(num_clients.saturating_sub(1) * num_clients / 2);
    for i in 0..num_clients {
        for j in (i + 1)..num_clients {
            let d = match deptype {
                DepType::Extended => extended_dependency(key_ints, i, j, cache),
                DepType::Standard => standard_dependency(key_ints, i, j, v),
                DepType::Random => rng.gen::<f64>(),
            };
            out.push(d.clamp(0.0, 1.0));
        }
    }
    out
}
