//! Market-manager parameters as seen by the creation form.
//!
//! `RawMarketsParameters` mirrors the contract getters one-to-one.
//! `MarketsParameters` is the converted, immutable snapshot the draft
//! validates against. Until the first fetch lands the snapshot holds
//! built-in defaults and `loaded_at` is `None`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::positions::CountBounds;

/// Maximum positions when the contract value is unknown.
pub const MAXIMUM_POSITIONS: usize = 5;

/// Minimum positions a market can have.
pub const MINIMUM_POSITIONS: usize = 2;

/// Fallback limit for every free-text field, in characters.
pub const MAXIMUM_INPUT_CHARACTERS: u32 = 1000;

/// Fallback minimum ticket price, in payment-token units.
pub const MINIMUM_TICKET_PRICE: Decimal = dec!(3);

/// Decimals of the payment token amounts returned by the contract.
pub const TOKEN_DECIMALS: u32 = 18;

/// Errors converting raw contract values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParametersError {
    #[error("{field} amount {raw} does not fit a decimal")]
    AmountOutOfRange { field: &'static str, raw: u128 },
}

/// Divisors applied to contract string limits before they are used as
/// local input limits. Contract string handling needs headroom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitMultipliers {
    /// Question, data source and dispute text.
    pub input: f64,
    /// Position labels.
    pub position: f64,
}

impl Default for LimitMultipliers {
    fn default() -> Self {
        Self {
            input: 1.1,
            position: 1.2,
        }
    }
}

impl LimitMultipliers {
    fn shrink(limit: u32, multiplier: f64) -> u32 {
        if multiplier <= 0.0 {
            return limit;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let shrunk = (f64::from(limit) / multiplier).round() as u32;
        shrunk
    }
}

/// Values exactly as read from the market manager contract.
///
/// Token amounts are fixed-point integers with [`TOKEN_DECIMALS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMarketsParameters {
    pub fixed_bond_amount: u128,
    pub maximum_positions_allowed: u64,
    pub minimum_positioning_duration: u64,
    pub creator_percentage: u64,
    pub resolver_percentage: u64,
    pub safe_box_percentage: u64,
    pub withdrawal_percentage: u64,
    pub dispute_price: u128,
    pub payment_token: String,
    pub creation_restricted_to_owner: bool,
    pub owner: String,
    pub max_number_of_tags: u64,
    pub min_fixed_ticket_price: u128,
    pub dispute_string_length_limit: u32,
    pub market_question_string_limit: u32,
    pub market_source_string_limit: u32,
    pub market_position_string_limit: u32,
}

/// Immutable parameters snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketsParameters {
    pub fixed_bond_amount: Decimal,
    pub maximum_positions_allowed: usize,
    /// Seconds.
    pub minimum_positioning_duration: u64,
    pub creator_percentage: u64,
    pub resolver_percentage: u64,
    pub safe_box_percentage: u64,
    pub withdrawal_percentage: u64,
    pub dispute_price: Decimal,
    pub payment_token: String,
    pub creation_restricted_to_owner: bool,
    pub owner: String,
    /// Zero means "as many as the catalog holds".
    pub max_number_of_tags: usize,
    pub min_fixed_ticket_price: Decimal,
    pub dispute_string_length_limit: u32,
    pub market_question_string_limit: u32,
    pub market_source_string_limit: u32,
    pub market_position_string_limit: u32,
    /// When the values were fetched; `None` for built-in defaults.
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Default for MarketsParameters {
    fn default() -> Self {
        Self {
            fixed_bond_amount: Decimal::ZERO,
            maximum_positions_allowed: MAXIMUM_POSITIONS,
            minimum_positioning_duration: 0,
            creator_percentage: 0,
            resolver_percentage: 0,
            safe_box_percentage: 0,
            withdrawal_percentage: 0,
            dispute_price: Decimal::ZERO,
            payment_token: String::new(),
            creation_restricted_to_owner: false,
            owner: String::new(),
            max_number_of_tags: 0,
            min_fixed_ticket_price: MINIMUM_TICKET_PRICE,
            dispute_string_length_limit: MAXIMUM_INPUT_CHARACTERS,
            market_question_string_limit: MAXIMUM_INPUT_CHARACTERS,
            market_source_string_limit: MAXIMUM_INPUT_CHARACTERS,
            market_position_string_limit: MAXIMUM_INPUT_CHARACTERS,
            loaded_at: None,
        }
    }
}

impl MarketsParameters {
    /// Convert contract values into a snapshot stamped with `loaded_at`.
    pub fn from_raw(
        raw: &RawMarketsParameters,
        multipliers: LimitMultipliers,
        loaded_at: DateTime<Utc>,
    ) -> Result<Self, ParametersError> {
        Ok(Self {
            fixed_bond_amount: token_amount("fixed_bond_amount", raw.fixed_bond_amount)?,
            maximum_positions_allowed: saturating_usize(raw.maximum_positions_allowed),
            minimum_positioning_duration: raw.minimum_positioning_duration,
            creator_percentage: raw.creator_percentage,
            resolver_percentage: raw.resolver_percentage,
            safe_box_percentage: raw.safe_box_percentage,
            withdrawal_percentage: raw.withdrawal_percentage,
            dispute_price: token_amount("dispute_price", raw.dispute_price)?,
            payment_token: raw.payment_token.clone(),
            creation_restricted_to_owner: raw.creation_restricted_to_owner,
            owner: raw.owner.clone(),
            max_number_of_tags: saturating_usize(raw.max_number_of_tags),
            min_fixed_ticket_price: token_amount(
                "min_fixed_ticket_price",
                raw.min_fixed_ticket_price,
            )?,
            dispute_string_length_limit: LimitMultipliers::shrink(
                raw.dispute_string_length_limit,
                multipliers.input,
            ),
            market_question_string_limit: LimitMultipliers::shrink(
                raw.market_question_string_limit,
                multipliers.input,
            ),
            market_source_string_limit: LimitMultipliers::shrink(
                raw.market_source_string_limit,
                multipliers.input,
            ),
            market_position_string_limit: LimitMultipliers::shrink(
                raw.market_position_string_limit,
                multipliers.position,
            ),
            loaded_at: Some(loaded_at),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    /// Equal in every value, ignoring when they were fetched.
    pub fn same_values(&self, other: &Self) -> bool {
        let strip = |p: &Self| Self {
            loaded_at: None,
            ..p.clone()
        };
        strip(self) == strip(other)
    }

    /// Resolve the bounds the draft must respect right now.
    ///
    /// Zero contract values fall back to the given defaults, and the
    /// position cap never drops below the floor.
    pub fn bounds(
        &self,
        min_positions: usize,
        default_max_positions: usize,
        catalog_len: usize,
    ) -> DraftBounds {
        let max_positions = non_zero_or(self.maximum_positions_allowed, default_max_positions);
        DraftBounds {
            positions: CountBounds {
                min: min_positions,
                max: max_positions.max(min_positions),
            },
            max_tags: non_zero_or(self.max_number_of_tags, catalog_len),
            ticket_price: non_zero_or(self.min_fixed_ticket_price, MINIMUM_TICKET_PRICE),
            limits: StringLimits {
                question: non_zero_or(self.market_question_string_limit, MAXIMUM_INPUT_CHARACTERS),
                data_source: non_zero_or(self.market_source_string_limit, MAXIMUM_INPUT_CHARACTERS),
                position: non_zero_or(self.market_position_string_limit, MAXIMUM_INPUT_CHARACTERS),
            },
        }
    }
}

/// Character limits for free-text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StringLimits {
    pub question: u32,
    pub data_source: u32,
    pub position: u32,
}

/// Every bound the draft is checked against, resolved from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DraftBounds {
    pub positions: CountBounds,
    pub max_tags: usize,
    /// Price of one ticket in TICKET markets.
    pub ticket_price: Decimal,
    pub limits: StringLimits,
}

fn non_zero_or<T: Default + PartialEq>(value: T, fallback: T) -> T {
    if value == T::default() { fallback } else { value }
}

fn saturating_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn token_amount(field: &'static str, raw: u128) -> Result<Decimal, ParametersError> {
    i128::try_from(raw)
        .ok()
        .and_then(|units| Decimal::try_from_i128_with_scale(units, TOKEN_DECIMALS).ok())
        .map(|amount| amount.normalize())
        .ok_or(ParametersError::AmountOutOfRange { field, raw })
}
