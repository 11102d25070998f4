use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Location;

pub const DEFAULT_ISS_URL: &str = "http://api.open-notify.org/iss-now.json";
pub const DEFAULT_SUN_URL: &str = "https://api.sunrise-sunset.org/json";

const ENV_PREFIX: &str = "ISS_NOTIFIER_";

/// SMTP account used both as sender and recipient.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub email: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            host: "smtp.gmail.com".to_string(),
            port: 587,
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Remote services queried each cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub iss_url: String,
    pub sun_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self { iss_url: DEFAULT_ISS_URL.to_string(), sun_url: DEFAULT_SUN_URL.to_string() }
    }
}

/// Top-level configuration, built once at startup and never mutated afterwards.
///
/// Example TOML:
/// ```toml
/// [location]
/// latitude = 40.7
/// longitude = -74.0
///
/// [smtp]
/// email = "me@example.com"
/// password = "app-password"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub location: Location,
    pub smtp: SmtpConfig,
    pub endpoints: Endpoints,
}

impl Config {
    /// Load from `path` (or the platform default), apply environment overrides and validate.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };

        cfg.apply_env()?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "iss-notifier", "iss-notifier")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields from `ISS_NOTIFIER_*` variables returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("LATITUDE") {
            self.location.latitude = parse_var("LATITUDE", &v)?;
        }
        if let Some(v) = var("LONGITUDE") {
            self.location.longitude = parse_var("LONGITUDE", &v)?;
        }
        if let Some(v) = var("EMAIL") {
            self.smtp.email = v;
        }
        if let Some(v) = var("PASSWORD") {
            self.smtp.password = v;
        }
        if let Some(v) = var("SMTP_HOST") {
            self.smtp.host = v;
        }
        if let Some(v) = var("SMTP_PORT") {
            self.smtp.port = parse_var("SMTP_PORT", &v)?;
        }
        if let Some(v) = var("ISS_URL") {
            self.endpoints.iss_url = v;
        }
        if let Some(v) = var("SUN_URL") {
            self.endpoints.sun_url = v;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let Location { latitude, longitude } = self.location;

        if !(-90.0..=90.0).contains(&latitude) {
            bail!("Latitude {latitude} is out of range [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&longitude) {
            bail!("Longitude {longitude} is out of range [-180, 180]");
        }

        if self.smtp.email.trim().is_empty() {
            bail!(
                "No notification email configured.\n\
                 Hint: run `iss-notifier configure` or set {ENV_PREFIX}EMAIL."
            );
        }
        self.smtp
            .email
            .parse::<lettre::message::Mailbox>()
            .with_context(|| format!("Invalid email address '{}'", self.smtp.email))?;

        if self.smtp.password.is_empty() {
            bail!(
                "No SMTP password configured.\n\
                 Hint: run `iss-notifier configure` or set {ENV_PREFIX}PASSWORD."
            );
        }
        if self.smtp.host.trim().is_empty() {
            bail!("SMTP host must not be empty");
        }
        if self.smtp.port == 0 {
            bail!("SMTP port must be non-zero");
        }

        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {ENV_PREFIX}{name}: '{value}'"))
}
