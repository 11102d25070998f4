use crate::{
    Config,
    clock::{Clock, LocalClock, Ticker},
    error::Result,
    model::Location,
    notify::{Notifier, SmtpNotifier},
    provider::{DaylightSource, IssTracker, is_dark, is_overhead, sources_from_config},
};

/// Result of evaluating both predicates once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NotDark,
    NotOverhead,
    LookUp,
}

impl CycleOutcome {
    pub fn is_look_up(self) -> bool {
        self == CycleOutcome::LookUp
    }
}

/// Checks darkness and ISS position each cycle, and mails when both hold.
#[derive(Debug)]
pub struct Poller {
    location: Location,
    tracker: Box<dyn IssTracker>,
    daylight: Box<dyn DaylightSource>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
}

impl Poller {
    pub fn new(
        location: Location,
        tracker: Box<dyn IssTracker>,
        daylight: Box<dyn DaylightSource>,
        notifier: Box<dyn Notifier>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self { location, tracker, daylight, notifier, clock }
    }

    /// Wire the HTTP sources, the SMTP notifier and the local clock from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (tracker, daylight) = sources_from_config(config)?;
        let notifier = Box::new(SmtpNotifier::new(&config.smtp)?);

        Ok(Self::new(config.location, tracker, daylight, notifier, Box::new(LocalClock)))
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub async fn check_is_dark(&self) -> Result<bool> {
        let window = self.daylight.fetch_daylight(self.location).await?;
        let hour = self.clock.current_hour();

        let dark = is_dark(&window, hour);
        tracing::debug!(
            hour,
            sunrise_hour = window.sunrise_hour,
            sunset_hour = window.sunset_hour,
            dark,
            "darkness checked"
        );

        Ok(dark)
    }

    pub async fn check_iss_overhead(&self) -> Result<bool> {
        let position = self.tracker.fetch_position().await?;

        let overhead = is_overhead(self.location, &position);
        tracing::debug!(
            latitude = position.latitude,
            longitude = position.longitude,
            overhead,
            "ISS position checked"
        );

        Ok(overhead)
    }

    pub async fn send_notification(&self) -> Result<()> {
        self.notifier.notify().await
    }

    /// Evaluate both predicates without sending anything. The ISS is not queried when it is not dark.
    pub async fn evaluate(&self) -> Result<CycleOutcome> {
        if !self.check_is_dark().await? {
            return Ok(CycleOutcome::NotDark);
        }
        if !self.check_iss_overhead().await? {
            return Ok(CycleOutcome::NotOverhead);
        }

        Ok(CycleOutcome::LookUp)
    }

    /// One poll cycle: evaluate, then send a notification if both predicates hold.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let outcome = self.evaluate().await?;

        if outcome.is_look_up() {
            tracing::info!(location = %self.location, "ISS overhead and it is dark, notifying");
            self.send_notification().await?;
        }

        Ok(outcome)
    }

    /// Tick, run a cycle, repeat. Returns on the first error, or when `ticker` stops.
    pub async fn run<T>(&self, ticker: &mut T) -> Result<()>
    where
        T: Ticker + ?Sized,
    {
        tracing::info!(location = %self.location, "poller started");

        while ticker.tick().await {
            let outcome = self.run_cycle().await?;

            if !outcome.is_look_up() {
                tracing::info!(?outcome, "conditions not met");
                println!("Not yet");
            }
        }

        Ok(())
    }
}
