//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    source = %config.parameters.source_path,
    refresh_ms = config.parameters.refresh_interval_ms,
    tags = config.tags.catalog.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // Parameter polling
  anyhow::ensure!(
    config.parameters.refresh_interval_ms > 0,
    "refresh_interval_ms must be positive"
  );
  anyhow::ensure!(
    !config.parameters.source_path.is_empty(),
    "parameters source_path must not be empty"
  );
  for (name, value) in [
    ("input_length_multiplier", config.parameters.input_length_multiplier),
    ("position_length_multiplier", config.parameters.position_length_multiplier),
  ] {
    anyhow::ensure!(
      value.is_finite() && value >= 1.0,
      "{name} must be >= 1.0, got {value}"
    );
  }

  // Draft rules
  let draft = &config.draft;
  anyhow::ensure!(
    draft.min_positions >= 2,
    "min_positions must be at least 2, got {}",
    draft.min_positions
  );
  anyhow::ensure!(
    draft.default_max_positions >= draft.min_positions,
    "default_max_positions ({}) must be >= min_positions ({})",
    draft.default_max_positions,
    draft.min_positions
  );
  anyhow::ensure!(
    draft.default_end_offset_days >= 1,
    "default_end_offset_days must be at least 1, got {}",
    draft.default_end_offset_days
  );
  anyhow::ensure!(
    draft.end_of_day_hour_utc < 24,
    "end_of_day_hour_utc must be in [0, 24), got {}",
    draft.end_of_day_hour_utc
  );
  anyhow::ensure!(
    draft.window_years >= 1,
    "window_years must be at least 1"
  );
  anyhow::ensure!(
    draft.default_end_offset_days < i64::from(draft.window_years) * 365,
    "default end date must fall inside the {}-year window",
    draft.window_years
  );

  // Tag catalog
  anyhow::ensure!(
    !config.tags.catalog.is_empty(),
    "Tag catalog must not be empty"
  );
  let mut seen = HashSet::new();
  for name in &config.tags.catalog {
    anyhow::ensure!(!name.trim().is_empty(), "Tag names must not be blank");
    anyhow::ensure!(seen.insert(name.as_str()), "Duplicate tag name: {name}");
  }

  Ok(())
}
