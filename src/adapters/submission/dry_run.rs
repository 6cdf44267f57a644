//! Dry-Run Submitter - Log Instead of Transact
//!
//! Implements the `MarketSubmitter` port without touching the chain:
//! the submission is serialized to JSON and logged, and a local UUID
//! stands in for the transaction hash.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::ports::market_submitter::{MarketSubmission, MarketSubmitter, SubmissionReceipt};

/// Submitter that records submissions in the log only.
#[derive(Debug, Default)]
pub struct DryRunSubmitter {
    /// Submissions accepted so far.
    submitted: AtomicU64,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MarketSubmitter for DryRunSubmitter {
    #[instrument(skip_all)]
    async fn submit(&self, submission: &MarketSubmission) -> Result<SubmissionReceipt> {
        let payload =
            serde_json::to_string(submission).context("Failed to serialize market submission")?;

        let receipt = SubmissionReceipt {
            submission_id: Uuid::new_v4().to_string(),
            submitted_at: Utc::now(),
        };
        self.submitted.fetch_add(1, Ordering::Relaxed);

        info!(
            submission_id = %receipt.submission_id,
            payload = %payload,
            "Dry-run market submission"
        );

        Ok(receipt)
    }
}
