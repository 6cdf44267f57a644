//! Submission - Hand a Finished Draft to the Market Submitter
//!
//! The submitter is only ever called with a draft that passes every
//! blocking check. A successful submission discards the draft; a failed
//! one leaves it intact so the user can retry.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::domain::draft::DraftError;
use crate::ports::market_submitter::{MarketSubmitter, SubmissionReceipt};

use super::draft_controller::MarketDraftController;

/// Why a submission did not go through.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("market submission failed: {0:#}")]
    Submitter(anyhow::Error),
}

/// Submit the controller's draft and reset it on success.
#[instrument(skip_all)]
pub async fn submit_draft(
    controller: &mut MarketDraftController,
    submitter: &dyn MarketSubmitter,
    now: DateTime<Utc>,
) -> Result<SubmissionReceipt, SubmitError> {
    let submission = controller.submission(now)?;

    match submitter.submit(&submission).await {
        Ok(receipt) => {
            info!(
                submission_id = %receipt.submission_id,
                positions = submission.draft.positions.len(),
                market_type = %submission.draft.market_type,
                "Market submitted"
            );
            controller.reset(now);
            Ok(receipt)
        }
        Err(e) => {
            warn!(error = %e, "Market submission failed, draft kept");
            Err(SubmitError::Submitter(e))
        }
    }
}
