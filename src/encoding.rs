//! Bijection between a [`Route`](crate::schedule::Route) and the real-valued
//! "generalized permutation" key vector (spec.md §4.3).
//!
//! `key[c-1] = k + r_j` where `k` is client `c`'s shift and `r_j` is its
//! fractional order statistic within that shift. `keyInt`/`keyDec` store the
//! same decomposition split into the integer (shift) and fractional (order)
//! parts so Optimal Mixing can mirror either half independently (spec.md §4.6).

use crate::schedule::Route;
use rand::Rng;

/// `key[i] = keyInt[i] as f64 + keyDec[i]` for every client index `i`.
pub type Key = Vec<f64>;

/// Encodes `route` into `(key, keyInt, keyDec)`, drawing fresh fractional
/// order statistics from `rng`.
///
/// `num_clients` is `N = n - 1`; every client index `0..num_clients`
/// (0-based, client id `i + 1`) must appear in exactly one shift of `route`.
pub fn encode(route: &Route, num_clients: usize, rng: &mut impl Rng) -> (Key, Vec<usize>, Vec<f64>) {
    let mut key = vec![0.0; num_clients];
    let mut key_int = vec![0usize; num_clients];
    let mut key_dec = vec![0.0; num_clients];

    for (k, clients) in route.iter().enumerate() {
        let m = clients.len();
        if m == 0 {
            continue;
        }
        let mut r: Vec<f64> = (0..m).map(|_| rng.gen::<f64>()).collect();
        r.sort_by(|a, b| a.partial_cmp(b).expect("uniform draws are never NaN"));

        for (j, &client_id) in clients.iter().enumerate() {
            let idx = client_id - 1;
            key_int[idx] = k;
            key_dec[idx] = r[j];
            key[idx] = k as f64 + r[j];
        }
    }

    (key, key_int, key_dec)
}

/// Decodes `key` into a route over `v` shifts.
///
/// Clients are assigned to shift `⌊key[i]⌋` and ordered within that shift by
/// a **stable** sort of `key` ascending, so exactly-equal keys break ties in
/// index order identically across platforms (spec.md §4.3, §9).
pub fn decode(key: &[f64], v: usize) -> Route {
    let mut indexed: Vec<(usize, f64)> = key.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).expect("keys are never NaN"));

    let mut route: Route = vec![Vec::new(); v];
    for (client_idx, x) in indexed {
        let k = x.floor() as usize;
        route[k].push(client_idx + 1);
    }
    route
}

/// Re-samples the fractional parts of `key` while preserving its shift
/// assignment, equivalent to `encode(decode(key))` (spec.md §4.3).
///
/// Run once per individual at the start of every generation so repeated
/// mixing cannot drift fractional parts toward numerically indistinguishable
/// values.
pub fn reencode(key: &[f64], v: usize, rng: &mut impl Rng) -> (Key, Vec<usize>, Vec<f64>) {
    let route = decode(key, v);
    encode(&route, key.len(), rng)
}
