//! Market Submitter Port - On-chain Market Creation
//!
//! Defines the trait for handing a finished draft to whatever performs
//! the actual market-creation transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::draft::MarketDraft;

/// A submittable draft plus the economic terms it is created under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSubmission {
  /// The draft exactly as composed.
  pub draft: MarketDraft,
  /// Bond the creator locks, in payment-token units.
  pub fixed_bond_amount: Decimal,
  /// Ticket price for ticket markets; `None` for open-bid markets.
  pub ticket_price: Option<Decimal>,
  /// Payment token address (empty until parameters are loaded).
  pub payment_token: String,
}

/// Acknowledgement from the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
  /// Submitter-assigned identifier (transaction hash or local id).
  pub submission_id: String,
  /// When the submission was accepted.
  pub submitted_at: DateTime<Utc>,
}

/// Trait for market-creation backends.
#[async_trait]
pub trait MarketSubmitter: Send + Sync + 'static {
  /// Create the market described by `submission`.
  async fn submit(&self, submission: &MarketSubmission) -> anyhow::Result<SubmissionReceipt>;
}
