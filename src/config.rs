//! Configuration loading.
//!
//! Settings come from an optional `feedback-analytics.toml` file. The database
//! URL may also come from `--database-url` or `DATABASE_URL` (a `.env` file is
//! honoured), which take precedence over the file.

use std::path::Path;

use anyhow::{Context, Result};
use feedback_analytics::dashboard::DashboardOptions;
use feedback_analytics::{BandPolicy, MissingSubRating};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "feedback-analytics.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub bands: BandsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Replaced by `--database-url` / `DATABASE_URL` when either is set.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Length of the rating and sentiment trend, in months.
    #[serde(default = "default_months_back")]
    pub months_back: usize,

    /// Length of the feedback volume series, in months.
    #[serde(default = "default_volume_months")]
    pub volume_months: usize,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub missing_sub_rating: MissingSubRating,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            months_back: default_months_back(),
            volume_months: default_volume_months(),
            top_n: default_top_n(),
            missing_sub_rating: MissingSubRating::default(),
        }
    }
}

fn default_months_back() -> usize {
    6
}

fn default_volume_months() -> usize {
    12
}

fn default_top_n() -> usize {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandsConfig {
    #[serde(default = "standard_bands")]
    pub standard: BandPolicy,

    #[serde(default = "high_performer_bands")]
    pub high_performer: BandPolicy,
}

impl Default for BandsConfig {
    fn default() -> Self {
        Self {
            standard: standard_bands(),
            high_performer: high_performer_bands(),
        }
    }
}

fn standard_bands() -> BandPolicy {
    BandPolicy::STANDARD
}

fn high_performer_bands() -> BandPolicy {
    BandPolicy::HIGH_PERFORMER
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise `feedback-analytics.toml` when it
    /// exists, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bands
            .standard
            .validate()
            .context("invalid [bands.standard]")?;
        self.bands
            .high_performer
            .validate()
            .context("invalid [bands.high_performer]")?;
        Ok(())
    }

    /// Applies a URL given on the command line or through the environment.
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.database.url = Some(url);
        }
        self
    }

    pub fn database_url(&self) -> Result<String> {
        self.database
            .url
            .clone()
            .context("DATABASE_URL or [database] url must point at the feedback Postgres instance")
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            months_back: self.analytics.months_back,
            volume_months: self.analytics.volume_months,
            top_n: self.analytics.top_n,
            bands: self.bands.standard,
            high_performer: self.bands.high_performer,
            missing_sub_rating: self.analytics.missing_sub_rating,
            ..DashboardOptions::default()
        }
    }
}
