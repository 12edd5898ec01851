//! Tracks best-so-far and mean population score per generation, and decides
//! when the search has stagnated (spec.md §4.7).

/// Accumulates the `progress` (best score) and `pop_means` (mean score)
/// traces across generations, and detects consecutive "flat" generations.
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    threshold: f64,
    stop: u32,
    progress: Vec<f64>,
    pop_means: Vec<f64>,
    flat_count: u32,
}

impl ProgressMonitor {
    pub fn new(threshold: f64, stop: u32) -> Self {
        Self {
            threshold,
            stop,
            progress: Vec::new(),
            pop_means: Vec::new(),
            flat_count: 0,
        }
    }

    /// Records one generation's best and mean score. Returns whether this
    /// generation counted as "flat" (ratio of consecutive bests `<= threshold`,
    /// only evaluated once at least three entries exist, spec.md §4.7).
    pub fn record(&mut self, best: f64, mean: f64) -> bool {
        self.progress.push(best);
        self.pop_means.push(mean);

        let flat = if self.progress.len() >= 3 {
            let x = self.progress[self.progress.len() - 1];
            let y = self.progress[self.progress.len() - 2];
            let denom = x.abs().max(y.abs());
            let ratio = if denom == 0.0 { 0.0 } else { (x - y).abs() / denom };
            ratio <= self.threshold
        } else {
            false
        };

        self.flat_count = if flat { self.flat_count + 1 } else { 0 };
        flat
    }

    /// Whether the flat-generation counter has reached `stop`.
    pub fn should_stop(&self) -> bool {
        self.flat_count >= self.stop
    }

    pub fn flat_count(&self) -> u32 {
        self.flat_count
    }

    pub fn progress(&self) -> &[f64] {
        &self.progress
    }

    pub fn pop_means(&self) -> &[f64] {
        &self.pop_means
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_requires_at_least_three_entries() {
        let mut m = ProgressMonitor::new(1e9, 2);
        assert!(!m.record(10.0, 10.0));
        assert!(!m.record(10.0, 10.0));
        assert!(m.record(10.0, 10.0));
    }

    #[test]
    fn stagnation_terminates_after_at_most_three_generations() {
        let mut m = ProgressMonitor::new(1e9, 2);
        let mut generations = 0;
        for _ in 0..10 {
            m.record(5.0, 5.0);
            generations += 1;
            if m.should_stop() {
                break;
            }
        }
        assert!(generations <= 3, "generations was {generations}");
    }

    #[test]
    fn non_flat_generation_resets_counter() {
        let mut m = ProgressMonitor::new(0.001, 2);
        m.record(10.0, 10.0);
        m.record(10.0, 10.0);
        assert!(m.record(10.0, 10.0));
        assert_eq!(m.flat_count(), 1);
        assert!(!m.record(5.0, 5.0));
        assert_eq!(m.flat_count(), 0);
    }

    #[test]
    fn zero_scores_are_flat_without_dividing_by_zero() {
        let mut m = ProgressMonitor::new(0.01, 2);
        m.record(0.0, 0.0);
        m.record(0.0, 0.0);
        assert!(m.record(0.0, 0.0));
    }
}
