//! Metrics tracking for tick cycles

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples required before cycles count as consistently slow
const SLOW_SAMPLE_MIN: usize = 3;

/// Rolling window of recent tick cycle durations
#[derive(Debug, Clone)]
pub struct TickMetrics {
    recent: VecDeque<Duration>,
    window: usize,
    slow_threshold: Duration,
}

impl TickMetrics {
    pub fn new(window: usize, slow_threshold: Duration) -> Self {
        Self {
            recent: VecDeque::with_capacity(window),
            window,
            slow_threshold,
        }
    }

    /// Record one cycle duration, evicting the oldest sample once the
    /// window is full
    pub fn record(&mut self, duration: Duration) {
        if self.recent.len() >= self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(duration);
    }

    /// Duration of the most recently recorded cycle
    pub fn last(&self) -> Option<Duration> {
        self.recent.back().copied()
    }

    pub fn sample_count(&self) -> usize {
        self.recent.len()
    }

    /// Every recent sample exceeded the slow threshold (needs at least
    /// three samples to avoid flagging a single hiccup)
    pub fn is_consistently_slow(&self) -> bool {
        self.recent.len() >= SLOW_SAMPLE_MIN
            && self.recent.iter().all(|&d| d > self.slow_threshold)
    }

    /// Mean duration over the current window
    pub fn average(&self) -> Duration {
        if self.recent.is_empty() {
            return Duration::ZERO;
        }
        self.recent.iter().sum::<Duration>() / self.recent.len() as u32
    }
}

/// Cumulative statistics for one scheduler's tick cycles
#[derive(Debug, Clone)]
pub struct TickStats {
    pub last_start: Option<Instant>,
    pub last_completion: Option<Instant>,
    pub total_cycles: u64,
    pub total_failures: u64,
    pub total_duration: Duration,
    pub metrics: TickMetrics,
}

impl TickStats {
    pub fn new(metrics: TickMetrics) -> Self {
        Self {
            last_start: None,
            last_completion: None,
            total_cycles: 0,
            total_failures: 0,
            total_duration: Duration::ZERO,
            metrics,
        }
    }

    /// Mean duration of the recent cycle window
    pub fn average_cycle(&self) -> Duration {
        self.metrics.average()
    }

    /// Duration of the most recent cycle
    pub fn last_cycle(&self) -> Option<Duration> {
        self.metrics.last()
    }

    /// Whether recent cycles have been consistently over the slow threshold
    pub fn is_degraded(&self) -> bool {
        self.metrics.is_consistently_slow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_window_is_bounded() {
        let mut metrics = TickMetrics::new(3, Duration::from_millis(100));
        for ms in [10, 20, 30, 40] {
            metrics.record(Duration::from_millis(ms));
        }

        assert_eq!(metrics.sample_count(), 3);
        // Oldest sample evicted: average over 20, 30, 40
        assert_eq!(metrics.average(), Duration::from_millis(30));
        assert_eq!(metrics.last(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_consistently_slow_needs_three_samples() {
        let mut metrics = TickMetrics::new(5, Duration::from_millis(10));
        metrics.record(Duration::from_millis(50));
        metrics.record(Duration::from_millis(50));
        assert!(!metrics.is_consistently_slow());

        metrics.record(Duration::from_millis(50));
        assert!(metrics.is_consistently_slow());

        metrics.record(Duration::from_millis(5));
        assert!(!metrics.is_consistently_slow());
    }

    #[test]
    fn test_average_of_empty_window_is_zero() {
        let metrics = TickMetrics::new(5, Duration::from_millis(100));
        assert_eq!(metrics.average(), Duration::ZERO);
        assert_eq!(metrics.last(), None);
    }

    #[test]
    fn test_stats_initial_state() {
        let stats = TickStats::new(TickMetrics::new(5, Duration::from_secs(1)));
        assert_eq!(stats.total_cycles, 0);
        assert_eq!(stats.total_failures, 0);
        assert!(stats.last_start.is_none());
        assert!(stats.last_completion.is_none());
        assert_eq!(stats.average_cycle(), Duration::ZERO);
        assert!(stats.last_cycle().is_none());
        assert!(!stats.is_degraded());
    }
}
