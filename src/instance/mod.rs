//! Immutable problem description: clients, shifts, travel times, service
//! durations, time windows, qualification, shift durations and start times
//! (spec.md §3, §6).

pub mod field_source;

pub use field_source::FieldSource;

use crate::error::InstanceError;
use qtty::Quantity;
use rand::seq::SliceRandom;
use rand::Rng;

/// All time-valued quantities in this crate are expressed in minutes.
pub type Minutes = Quantity<qtty::Minute>;

fn min(v: f64) -> Minutes {
    Minutes::new(v)
}

/// A client's feasible service window `[start, end]`, in minutes from midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: Minutes,
    end: Minutes,
}

impl TimeWindow {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    pub const fn start(&self) -> Minutes {
        self.start
    }

    pub const fn end(&self) -> Minutes {
        self.end
    }
}

/// Immutable problem instance (spec.md §3).
///
/// `n` locations (index 0 = base, clients are `1..n`), `v` shifts.
#[derive(Debug, Clone)]
pub struct Instance {
    n: usize,
    v: usize,
    d: Vec<Vec<Minutes>>,
    p: Vec<Minutes>,
    tw: Vec<Option<TimeWindow>>,
    q: Vec<Vec<bool>>,
    u: Vec<Minutes>,
    ss: Vec<Minutes>,
    feasible_shifts: Vec<Vec<usize>>,
}

impl Instance {
    /// Builds an instance from caller-supplied or synthesized fields,
    /// validating shapes and qualification feasibility.
    ///
    /// Any field left as [`FieldSource::Synthesize`] is generated using the
    /// default distributions from spec.md §6, drawn from `rng`.
    pub fn from_fields_with_rng(
        n: usize,
        v: usize,
        d: FieldSource<Vec<Vec<f64>>>,
        p: FieldSource<Vec<f64>>,
        tw: FieldSource<Vec<Option<(f64, f64)>>>,
        q: FieldSource<Vec<Vec<bool>>>,
        u: FieldSource<Vec<f64>>,
        ss: FieldSource<Vec<f64>>,
        rng: &mut impl Rng,
    ) -> Result<Instance, InstanceError> {
        if n < 2 {
            return Err(InstanceError::NTooSmall(n));
        }
        if v < 1 {
            return Err(InstanceError::VTooSmall(v));
        }

        let d = d.resolve_with(|| synth_d(n, rng));
        if d.len() != n || d.iter().any(|row| row.len() != n) {
            return Err(InstanceError::BadDistanceShape {
                n,
                rows: d.len(),
                cols: d.first().map(|r| r.len()).unwrap_or(0),
            });
        }

        let p = p.resolve_with(|| synth_p(n, rng));
        if p.len() != n {
            return Err(InstanceError::BadServiceTimeShape {
                expected: n,
                actual: p.len(),
            });
        }

        let tw = tw.resolve_with(|| synth_tw(n, rng));
        if tw.len() != n {
            return Err(InstanceError::BadTimeWindowShape {
                expected: n,
                actual: tw.len(),
            });
        }
        if let Some(client_idx) = tw[1..].iter().position(|w| w.is_none()) {
            return Err(InstanceError::MissingTimeWindow(client_idx + 1));
        }

        let q = q.resolve_with(|| synth_q(n, v));
        if q.len() != n - 1 || q.iter().any(|row| row.len() != v) {
            return Err(InstanceError::BadQualificationShape {
                clients: n - 1,
                shifts: v,
                rows: q.len(),
                cols: q.first().map(|r| r.len()).unwrap_or(0),
            });
        }

        let u = u.resolve_with(|| synth_u(v, rng));
        if u.len() != v {
            return Err(InstanceError::BadShiftDurationShape {
                expected: v,
                actual: u.len(),
            });
        }

        let ss = ss.resolve_with(|| synth_ss(v));
        if ss.len() != v {
            return Err(InstanceError::BadShiftStartShape {
                expected: v,
                actual: ss.len(),
            });
        }

        let feasible_shifts: Vec<Vec<usize>> = (0..n - 1)
            .map(|client_idx| {
                (0..v)
                    .filter(|&k| q[client_idx][k])
                    .collect::<Vec<usize>>()
            })
            .collect();

        if let Some(client_idx) = feasible_shifts.iter().position(|f| f.is_empty()) {
            return Err(InstanceError::InfeasibleQualification(client_idx + 1));
        }

        Ok(Instance {
            n,
            v,
            d: d.into_iter().map(|row| row.into_iter().map(min).collect()).collect(),
            p: p.into_iter().map(min).collect(),
            tw: tw
                .into_iter()
                .map(|opt| opt.map(|(s, e)| TimeWindow::new(min(s), min(e))))
                .collect(),
            q,
            u: u.into_iter().map(min).collect(),
            ss: ss.into_iter().map(min).collect(),
            feasible_shifts,
        })
    }

    /// Convenience wrapper over [`Instance::from_fields_with_rng`] using
    /// `rand::thread_rng()` for any synthesized field.
    pub fn from_fields(
        n: usize,
        v: usize,
        d: FieldSource<Vec<Vec<f64>>>,
        p: FieldSource<Vec<f64>>,
        tw: FieldSource<Vec<Option<(f64, f64)>>>,
        q: FieldSource<Vec<Vec<bool>>>,
        u: FieldSource<Vec<f64>>,
        ss: FieldSource<Vec<f64>>,
    ) -> Result<Instance, InstanceError> {
        Self::from_fields_with_rng(n, v, d, p, tw, q, u, ss, &mut rand::thread_rng())
    }

    /// Builds a fully-synthesized random instance, seeded from `rng`.
    ///
    /// Replaces the source's `Instance(n, v)` default-constructor call:
    /// every field is synthesized, so construction never fails (a
    /// synthesized `Q` is always all-ones, hence always feasible).
    pub fn random_with_rng(n: usize, v: usize, rng: &mut impl Rng) -> Instance {
        Self::from_fields_with_rng(
            n,
            v,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            rng,
        )
        .expect("a fully-synthesized instance is always shape- and feasibility-valid")
    }

    /// Convenience wrapper over [`Instance::random_with_rng`] using
    /// `rand::thread_rng()`.
    pub fn random(n: usize, v: usize) -> Instance {
        Self::random_with_rng(n, v, &mut rand::thread_rng())
    }

    pub const fn n(&self) -> usize {
        self.n
    }

    pub const fn v(&self) -> usize {
        self.v
    }

    /// Number of clients (`n - 1`).
    pub const fn num_clients(&self) -> usize {
        self.n - 1
    }

    pub fn d(&self) -> &[Vec<Minutes>] {
        &self.d
    }

    pub fn p(&self) -> &[Minutes] {
        &self.p
    }

    pub fn tw(&self) -> &[Option<TimeWindow>] {
        &self.tw
    }

    pub fn q(&self) -> &[Vec<bool>] {
        &self.q
    }

    pub fn u(&self) -> &[Minutes] {
        &self.u
    }

    pub fn ss(&self) -> &[Minutes] {
        &self.ss
    }

    /// Whether client `client_id` (1-based, `1..n`) may be served by shift `k`.
    pub fn is_qualified(&self, client_id: usize, k: usize) -> bool {
        self.q[client_id - 1][k]
    }

    /// Feasible shifts `F(i)` for client `client_id` (1-based, `1..n`).
    pub fn feasible_shifts(&self, client_id: usize) -> &[usize] {
        &self.feasible_shifts[client_id - 1]
    }
}

fn synth_d(n: usize, rng: &mut impl Rng) -> Vec<Vec<f64>> {
    let mut d = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                d[i][j] = rng.gen_range(5..15) as f64;
            }
        }
    }
    // Symmetrize by copying the lower triangle (i > j) into the upper triangle.
    for i in 0..n {
        for j in (i + 1)..n {
            d[i][j] = d[j][i];
        }
    }
    d
}

fn synth_p(n: usize, rng: &mut impl Rng) -> Vec<f64> {
    let mut p = vec![0.0];
    for _ in 1..n {
        p.push(rng.gen_range(10..45) as f64);
    }
    p
}

fn synth_tw(n: usize, rng: &mut impl Rng) -> Vec<Option<(f64, f64)>> {
    let starts: Vec<f64> = (0..24).map(|x| (10 * x) as f64).collect();
    let mut tw = vec![None];
    for _ in 1..n {
        let start = *starts.choose(rng).expect("starts is non-empty");
        tw.push(Some((start, start + 30.0)));
    }
    tw
}

fn synth_q(n: usize, v: usize) -> Vec<Vec<bool>> {
    vec![vec![true; v]; n - 1]
}

fn synth_u(v: usize, rng: &mut impl Rng) -> Vec<f64> {
    let durations = [120.0, 180.0, 240.0];
    (0..v)
        .map(|_| *durations.choose(rng).expect("durations is non-empty"))
        .collect()
}

fn synth_ss(v: usize) -> Vec<f64> {
    vec![0.0; v]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny_instance() -> Instance {
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
    fn valid_instance_constructs() {
        let ins = tiny_instance();
        assert_eq!(ins.n(), 3);
        assert_eq!(ins.v(), 1);
        assert_eq!(ins.d()[0][1].value(), 5.0);
        assert_eq!(ins.feasible_shifts(1), &[0]);
    }

    #[test]
    fn missing_client_time_window_rejected() {
        let err = Instance::from_fields(
            3,
            1,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Supplied(vec![None, None, Some((0.0, 100.0))]),
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
        )
        .unwrap_err();
        assert_eq!(err, InstanceError::MissingTimeWindow(1));
    }

    #[test]
    fn bad_distance_shape_rejected() {
        let err = Instance::from_fields(
            3,
            1,
            FieldSource::Supplied(vec![vec![0.0, 5.0], vec![5.0, 0.0]]),
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
        )
        .unwrap_err();
        assert!(matches!(err, InstanceError::BadDistanceShape { .. }));
    }

    #[test]
    fn infeasible_qualification_rejected() {
        let err = Instance::from_fields(
            3,
            2,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Supplied(vec![vec![false, false], vec![true, true]]),
            FieldSource::Synthesize,
            FieldSource::Synthesize,
        )
        .unwrap_err();
        assert_eq!(err, InstanceError::InfeasibleQualification(1));
    }

    #[test]
    fn n_too_small_rejected() {
        let err = Instance::from_fields(
            1,
            1,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
            FieldSource::Synthesize,
        )
        .unwrap_err();
        assert_eq!(err, InstanceError::NTooSmall(1));
    }

    #[test]
    fn random_instance_is_always_feasible() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let ins = Instance::random_with_rng(6, 3, &mut rng);
            for client in 1..ins.n() {
                assert!(!ins.feasible_shifts(client).is_empty());
            }
        }
    }

    #[test]
    fn synth_d_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = synth_d(5, &mut rng);
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(d[i][j], d[j][i]);
            }
            assert_eq!(d[i][i], 0.0);
        }
    }
}
