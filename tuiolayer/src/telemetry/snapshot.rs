//! Point-in-time copy of the bridge counters.

use std::time::Duration;

/// Immutable snapshot of [`BridgeMetrics`](super::BridgeMetrics).
#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    /// Events pushed into handoff queues.
    pub events_enqueued: u64,
    /// Events discarded by variant filters before reaching a queue.
    pub events_filtered: u64,
    /// Events popped by consumer ticks.
    pub events_dequeued: u64,
    /// Queued events thrown away when a session was torn down.
    pub events_discarded: u64,
    /// Events applied and fanned out.
    pub events_dispatched: u64,
    /// Receiver callbacks that failed or panicked.
    pub receiver_faults: u64,
    /// Events currently waiting in handoff queues.
    pub queue_depth: u64,
    /// Largest queue depth observed.
    pub queue_high_water: u64,
    /// Completed consumer ticks.
    pub ticks: u64,
    /// Time since the metrics block was created.
    pub uptime: Duration,
}

impl TelemetrySnapshot {
    /// Events pushed and neither drained nor discarded.
    pub fn backlog(&self) -> u64 {
        self.events_enqueued
            .saturating_sub(self.events_dequeued)
            .saturating_sub(self.events_discarded)
    }

    /// Fraction of callbacks discarded by filters (0.0 - 1.0).
    pub fn filter_rate(&self) -> f64 {
        let total = self.events_enqueued + self.events_filtered;
        if total == 0 {
            0.0
        } else {
            self.events_filtered as f64 / total as f64
        }
    }

    /// Dispatched events per second of uptime.
    pub fn events_per_second(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.events_dispatched as f64 / secs
        }
    }

    /// Uptime formatted as `HH:MM:SS`.
    pub fn uptime_human(&self) -> String {
        let total = self.uptime.as_secs();
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog() {
        let snap = TelemetrySnapshot {
            events_enqueued: 10,
            events_dequeued: 7,
            ..Default::default()
        };
        assert_eq!(snap.backlog(), 3);
    }

    #[test]
    fn test_backlog_excludes_discarded() {
        let snap = TelemetrySnapshot {
            events_enqueued: 10,
            events_dequeued: 7,
            events_discarded: 3,
            ..Default::default()
        };
        assert_eq!(snap.backlog(), 0);
    }

    #[test]
    fn test_filter_rate() {
        let snap = TelemetrySnapshot {
            events_enqueued: 3,
            events_filtered: 1,
            ..Default::default()
        };
        assert!((snap.filter_rate() - 0.25).abs() < 1e-9);
        assert_eq!(TelemetrySnapshot::default().filter_rate(), 0.0);
    }

    #[test]
    fn test_events_per_second() {
        let snap = TelemetrySnapshot {
            events_dispatched: 120,
            uptime: Duration::from_secs(60),
            ..Default::default()
        };
        assert!((snap.events_per_second() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_uptime_human() {
        let snap = TelemetrySnapshot {
            uptime: Duration::from_secs(3723),
            ..Default::default()
        };
        assert_eq!(snap.uptime_human(), "01:02:03");
    }
}
