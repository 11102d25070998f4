//! Core library for the `iss-notifier` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The ISS position and sunrise/sunset HTTP sources
//! - The SMTP notifier
//! - The poller that ties them together on a fixed cadence
//!
//! It is used by `iss-cli`, but every external dependency sits behind a trait
//! so the poller can be driven by fakes.

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod poller;
pub mod provider;

pub use clock::{Clock, IntervalTicker, LocalClock, POLL_INTERVAL, Ticker};
pub use config::{Config, Endpoints, SmtpConfig};
pub use error::{Error, Result};
pub use model::{DaylightWindow, IssPosition, Location};
pub use notify::{Notifier, SmtpNotifier};
pub use poller::{CycleOutcome, Poller};
pub use provider::{DaylightSource, IssTracker, is_dark, is_overhead};
