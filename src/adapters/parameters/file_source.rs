//! File Parameters Source - Contract Values from TOML
//!
//! Implements the `ParametersSource` port by re-reading a TOML file on
//! every fetch. Token amounts are written as decimal strings of base
//! units because they routinely exceed TOML's 64-bit integers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::parameters::RawMarketsParameters;
use crate::ports::parameters_source::ParametersSource;

/// On-disk layout, one key per contract getter.
#[derive(Debug, Deserialize)]
struct ParametersFile {
    fixed_bond_amount: String,
    maximum_positions_allowed: u64,
    #[serde(default)]
    minimum_positioning_duration: u64,
    #[serde(default)]
    creator_percentage: u64,
    #[serde(default)]
    resolver_percentage: u64,
    #[serde(default)]
    safe_box_percentage: u64,
    #[serde(default)]
    withdrawal_percentage: u64,
    dispute_price: String,
    payment_token: String,
    #[serde(default)]
    creation_restricted_to_owner: bool,
    #[serde(default)]
    owner: String,
    max_number_of_tags: u64,
    min_fixed_ticket_price: String,
    dispute_string_length_limit: u32,
    market_question_string_limit: u32,
    market_source_string_limit: u32,
    market_position_string_limit: u32,
}

impl ParametersFile {
    fn into_raw(self) -> Result<RawMarketsParameters> {
        Ok(RawMarketsParameters {
            fixed_bond_amount: base_units("fixed_bond_amount", &self.fixed_bond_amount)?,
            maximum_positions_allowed: self.maximum_positions_allowed,
            minimum_positioning_duration: self.minimum_positioning_duration,
            creator_percentage: self.creator_percentage,
            resolver_percentage: self.resolver_percentage,
            safe_box_percentage: self.safe_box_percentage,
            withdrawal_percentage: self.withdrawal_percentage,
            dispute_price: base_units("dispute_price", &self.dispute_price)?,
            payment_token: self.payment_token,
            creation_restricted_to_owner: self.creation_restricted_to_owner,
            owner: self.owner,
            max_number_of_tags: self.max_number_of_tags,
            min_fixed_ticket_price: base_units(
                "min_fixed_ticket_price",
                &self.min_fixed_ticket_price,
            )?,
            dispute_string_length_limit: self.dispute_string_length_limit,
            market_question_string_limit: self.market_question_string_limit,
            market_source_string_limit: self.market_source_string_limit,
            market_position_string_limit: self.market_position_string_limit,
        })
    }
}

fn base_units(field: &str, raw: &str) -> Result<u128> {
    raw.trim()
        .replace('_', "")
        .parse()
        .with_context(|| format!("{field}: `{raw}` is not an unsigned integer"))
}

/// Reads market-manager parameters from a TOML file.
pub struct FileParametersSource {
    /// Path to the parameters file.
    path: PathBuf,
}

impl FileParametersSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse parameters from TOML text.
    pub fn parse(content: &str) -> Result<RawMarketsParameters> {
        let file: ParametersFile =
            toml::from_str(content).context("Failed to parse market parameters")?;
        file.into_raw()
    }
}

#[async_trait]
impl ParametersSource for FileParametersSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<RawMarketsParameters> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let raw = Self::parse(&content)?;
        debug!(max_positions = raw.maximum_positions_allowed, "Parameters file read");
        Ok(raw)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
