use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LoopMetricsSnapshot {
    pub(crate) tps: f32,
    pub(crate) runs_per_second: f32,
    pub(crate) tick_time_us: f32,
}

/// Aggregates loop counters over a wall-clock interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    runs: u32,
    tick_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            ticks: 0,
            runs: 0,
            tick_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_tick(&mut self, tick_time: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.tick_time_sum = self.tick_time_sum.saturating_add(tick_time);
    }

    pub(crate) fn record_run(&mut self) {
        self.runs = self.runs.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let tick_time_us = if self.ticks == 0 {
            0.0
        } else {
            self.tick_time_sum.as_secs_f32() / self.ticks as f32 * 1_000_000.0
        };
        let snapshot = LoopMetricsSnapshot {
            tps: self.ticks as f32 / elapsed_seconds,
            runs_per_second: self.runs as f32 / elapsed_seconds,
            tick_time_us,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.runs = 0;
        self.tick_time_sum = Duration::ZERO;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_snapshot_before_interval() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), base);
        accumulator.record_tick(Duration::from_micros(10));

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(999))
            .is_none());
    }

    #[test]
    fn snapshot_computes_rates_and_resets() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1), base);
        for _ in 0..4 {
            accumulator.record_tick(Duration::from_micros(50));
        }
        accumulator.record_run();
        accumulator.record_run();

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("snapshot should be emitted");
        assert!((snapshot.tps - 2.0).abs() < 1e-4);
        assert!((snapshot.runs_per_second - 1.0).abs() < 1e-4);
        assert!((snapshot.tick_time_us - 50.0).abs() < 0.01);

        let next = accumulator
            .maybe_snapshot(base + Duration::from_secs(3))
            .expect("second snapshot");
        assert_eq!(next.tps, 0.0);
        assert_eq!(next.tick_time_us, 0.0);
    }
}
