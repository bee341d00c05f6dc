use std::collections::VecDeque;
use std::time::Instant;

const SAMPLE_COUNT: usize = 60;

/// Rolling arrival rate of game-state snapshots.
pub struct SnapshotStats {
    arrivals: VecDeque<Instant>,
    rate: f32,
}

impl Default for SnapshotStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStats {
    pub fn new() -> Self {
        Self {
            arrivals: VecDeque::with_capacity(SAMPLE_COUNT),
            rate: 0.0,
        }
    }

    pub fn record_snapshot(&mut self, now: Instant) {
        if self.arrivals.len() >= SAMPLE_COUNT {
            self.arrivals.pop_front();
        }
        self.arrivals.push_back(now);

        if let Some(oldest) = self.arrivals.front() {
            let elapsed = now.duration_since(*oldest).as_secs_f32();
            if elapsed > 0.0 {
                self.rate = (self.arrivals.len() - 1) as f32 / elapsed;
            }
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn reset(&mut self) {
        self.arrivals.clear();
        self.rate = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rate_from_evenly_spaced_arrivals() {
        let mut stats = SnapshotStats::new();
        let start = Instant::now();
        for i in 0..21 {
            stats.record_snapshot(start + Duration::from_millis(50 * i));
        }
        assert!((stats.rate() - 20.0).abs() < 0.01, "{}", stats.rate());
    }

    #[test]
    fn single_sample_has_no_rate() {
        let mut stats = SnapshotStats::new();
        stats.record_snapshot(Instant::now());
        assert_eq!(stats.rate(), 0.0);
    }

    #[test]
    fn window_is_bounded() {
        let mut stats = SnapshotStats::new();
        let start = Instant::now();
        for i in 0..100 {
            stats.record_snapshot(start + Duration::from_millis(100 * i));
        }
        assert_eq!(stats.arrivals.len(), SAMPLE_COUNT);
        assert!((stats.rate() - 10.0).abs() < 0.01);

        stats.reset();
        assert_eq!(stats.rate(), 0.0);
    }
}
