//! Per-second tick source for the engine runner.
//!
//! While armed, `tick()` resolves once per second; while disarmed it never
//! resolves, so a `select!` branch on it is effectively switched off.

use std::future;

use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

/// Tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One-second cadence that can be switched on and off.
#[derive(Debug, Default)]
pub struct TickScheduler {
    interval: Option<Interval>,
}

impl TickScheduler {
    /// Creates a disarmed scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the cadence; the first tick is one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self) {
        let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        // Ticks lost to suspend/resume are dropped, not replayed.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    /// Stops the cadence. Pending ticks are discarded.
    pub fn disarm(&mut self) {
        self.interval = None;
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Waits for the next tick. Cancel safe.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_never_ticks() {
        let mut scheduler = TickScheduler::new();
        assert!(!scheduler.is_armed());

        let result = timeout(Duration::from_secs(10), scheduler.tick()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut scheduler = TickScheduler::new();
        scheduler.arm();
        let start = Instant::now();

        scheduler.tick().await;

        assert_eq!(start.elapsed(), TICK_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_second() {
        let mut scheduler = TickScheduler::new();
        scheduler.arm();
        let start = Instant::now();

        for _ in 0..5 {
            scheduler.tick().await;
        }

        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_ticks() {
        let mut scheduler = TickScheduler::new();
        scheduler.arm();
        scheduler.tick().await;

        scheduler.disarm();

        assert!(!scheduler.is_armed());
        assert!(timeout(Duration::from_secs(5), scheduler.tick())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_cadence() {
        let mut scheduler = TickScheduler::new();
        scheduler.arm();
        tokio::time::sleep(Duration::from_millis(600)).await;

        scheduler.arm();
        let rearmed = Instant::now();
        scheduler.tick().await;

        assert_eq!(rearmed.elapsed(), TICK_PERIOD);
    }
}
