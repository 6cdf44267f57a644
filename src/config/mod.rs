//! Configuration Module - TOML-based Application Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Draft rules, parameter polling and the tag catalog are externalized
//! here; every section has working defaults so a near-empty file is
//! enough to start a session.

pub mod loader;

use serde::Deserialize;

use crate::domain::parameters::{LimitMultipliers, MAXIMUM_POSITIONS, MINIMUM_POSITIONS};
use crate::domain::schedule::{DEFAULT_END_HOUR_UTC, DEFAULT_END_OFFSET_DAYS, DEFAULT_WINDOW_YEARS};
use crate::domain::tags::{TagCatalog, BUILT_IN_TAGS};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Application identity and logging.
  #[serde(default)]
  pub app: AppSection,
  /// Market-manager parameter polling.
  #[serde(default)]
  pub parameters: ParametersConfig,
  /// Draft defaults and bounds.
  #[serde(default)]
  pub draft: DraftConfig,
  /// Tag suggestion catalog.
  #[serde(default)]
  pub tags: TagsConfig,
}

/// Application identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable name used in logs.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Parameter polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ParametersConfig {
  /// File the market-manager parameters are read from.
  #[serde(default = "default_source_path")]
  pub source_path: String,
  /// Poll interval in milliseconds.
  #[serde(default = "default_refresh_interval")]
  pub refresh_interval_ms: u64,
  /// Divisor for question/source/dispute string limits.
  #[serde(default = "default_input_multiplier")]
  pub input_length_multiplier: f64,
  /// Divisor for position string limits.
  #[serde(default = "default_position_multiplier")]
  pub position_length_multiplier: f64,
}

impl ParametersConfig {
  pub fn multipliers(&self) -> LimitMultipliers {
    LimitMultipliers {
      input: self.input_length_multiplier,
      position: self.position_length_multiplier,
    }
  }
}

/// Draft defaults and bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
  /// Fewest positions a market may have.
  #[serde(default = "default_min_positions")]
  pub min_positions: usize,
  /// Position cap used until the contract value is known.
  #[serde(default = "default_max_positions")]
  pub default_max_positions: usize,
  /// Days ahead of now the proposed end date lies.
  #[serde(default = "default_end_offset_days")]
  pub default_end_offset_days: i64,
  /// Hour (UTC) proposed end dates are pinned to.
  #[serde(default = "default_end_hour")]
  pub end_of_day_hour_utc: u32,
  /// How many calendar years ahead the end date may be set.
  #[serde(default = "default_window_years")]
  pub window_years: u32,
}

/// Tag catalog configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TagsConfig {
  /// Category names; ids follow list order starting at 1.
  #[serde(default = "default_catalog")]
  pub catalog: Vec<String>,
}

impl TagsConfig {
  pub fn catalog(&self) -> TagCatalog {
    TagCatalog::from_names(self.catalog.iter().cloned())
  }
}

impl Default for AppSection {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
    }
  }
}

impl Default for ParametersConfig {
  fn default() -> Self {
    Self {
      source_path: default_source_path(),
      refresh_interval_ms: default_refresh_interval(),
      input_length_multiplier: default_input_multiplier(),
      position_length_multiplier: default_position_multiplier(),
    }
  }
}

impl Default for DraftConfig {
  fn default() -> Self {
    Self {
      min_positions: default_min_positions(),
      default_max_positions: default_max_positions(),
      default_end_offset_days: default_end_offset_days(),
      end_of_day_hour_utc: default_end_hour(),
      window_years: default_window_years(),
    }
  }
}

impl Default for TagsConfig {
  fn default() -> Self {
    Self {
      catalog: default_catalog(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "market-creator".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_source_path() -> String {
  "market_parameters.toml".to_string()
}

fn default_refresh_interval() -> u64 {
  5000
}

fn default_input_multiplier() -> f64 {
  LimitMultipliers::default().input
}

fn default_position_multiplier() -> f64 {
  LimitMultipliers::default().position
}

fn default_min_positions() -> usize {
  MINIMUM_POSITIONS
}

fn default_max_positions() -> usize {
  MAXIMUM_POSITIONS
}

fn default_end_offset_days() -> i64 {
  DEFAULT_END_OFFSET_DAYS
}

fn default_end_hour() -> u32 {
  DEFAULT_END_HOUR_UTC
}

fn default_window_years() -> u32 {
  DEFAULT_WINDOW_YEARS
}

fn default_catalog() -> Vec<String> {
  BUILT_IN_TAGS.iter().map(ToString::to_string).collect()
}
