use async_trait::async_trait;
use chrono::{Local, Timelike};
use std::{fmt::Debug, time::Duration};

/// Fixed pause before every poll cycle.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

pub trait Clock: Send + Sync + Debug {
    /// Current hour of day (0..=23) in local time.
    fn current_hour(&self) -> u32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn current_hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// Paces the poll loop. Returning `false` ends the loop.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self) -> bool;
}

/// Sleeps a full period on every tick, so check duration is not subtracted.
#[derive(Debug, Clone)]
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        tokio::time::sleep(self.period).await;
        true
    }
}
