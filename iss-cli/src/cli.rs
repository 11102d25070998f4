use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use iss_core::{Config, CycleOutcome, IntervalTicker, Location, Poller};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "iss-notifier", version, about = "Email me when the ISS is overhead and it is dark")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Poll every minute, forever (the default).
    Run,

    /// Run a single cycle right away and report the result.
    Check {
        /// Evaluate the conditions but never send email.
        #[arg(long)]
        dry_run: bool,
    },

    /// Interactively set the observer location and SMTP account.
    Configure,

    /// Print the path of the config file in use.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = self.config.as_deref();

        match self.command.unwrap_or(Command::Run) {
            Command::Run => {
                let config = Config::resolve(config_path)?;
                let poller = Poller::from_config(&config)?;

                tracing::info!(location = %config.location, "waiting for the ISS");
                poller.run(&mut IntervalTicker::default()).await?;
            }
            Command::Check { dry_run } => {
                let config = Config::resolve(config_path)?;
                let poller = Poller::from_config(&config)?;

                let outcome =
                    if dry_run { poller.evaluate().await? } else { poller.run_cycle().await? };
                println!("{}", describe(outcome, dry_run));
            }
            Command::Configure => configure(config_path)?,
            Command::ConfigPath => {
                println!("{}", resolve_path(config_path)?.display());
            }
        }

        Ok(())
    }
}

fn describe(outcome: CycleOutcome, dry_run: bool) -> &'static str {
    match outcome {
        CycleOutcome::NotDark => "Not yet: it is not dark at your location.",
        CycleOutcome::NotOverhead => "Not yet: the ISS is not overhead.",
        CycleOutcome::LookUp if dry_run => "Look up! (dry run, no email sent)",
        CycleOutcome::LookUp => "Look up! Notification email sent.",
    }
}

fn resolve_path(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path(),
    }
}

fn configure(path: Option<&Path>) -> anyhow::Result<()> {
    let path = resolve_path(path)?;
    let mut config = Config::load_from(&path)?;

    let latitude = CustomType::<f64>::new("Latitude (decimal degrees):")
        .with_default(config.location.latitude)
        .with_error_message("Please enter a number, e.g. 40.7")
        .prompt()?;
    let longitude = CustomType::<f64>::new("Longitude (decimal degrees):")
        .with_default(config.location.longitude)
        .with_error_message("Please enter a number, e.g. -74.0")
        .prompt()?;
    config.location = Location { latitude, longitude };

    config.smtp.email = Text::new("Email address (sender and recipient):")
        .with_default(&config.smtp.email)
        .prompt()?;

    let password = Password::new("SMTP password:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message("Leave empty to keep the current password")
        .prompt()?;
    if !password.is_empty() {
        config.smtp.password = password;
    }

    config.smtp.host = Text::new("SMTP host:").with_default(&config.smtp.host).prompt()?;
    config.smtp.port = CustomType::<u16>::new("SMTP port:")
        .with_default(config.smtp.port)
        .with_error_message("Please enter a port number")
        .prompt()?;

    config.validate().context("Configuration was not saved")?;
    config.save_to(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}
