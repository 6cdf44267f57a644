//! Parameters Refresher — Poll the Market Manager and Publish Snapshots
//!
//! Fetches the raw contract parameters on a fixed interval, converts
//! them into an immutable `MarketsParameters` and publishes it as a
//! whole through a `tokio::sync::watch` channel. Readers only ever see
//! complete snapshots; the latest successful fetch wins.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::domain::parameters::{LimitMultipliers, MarketsParameters};
use crate::ports::parameters_source::ParametersSource;

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Published,
    /// Values matched the current snapshot; nothing published.
    Unchanged,
    /// Fetch or conversion failed; current snapshot kept.
    Failed,
}

/// Polls a `ParametersSource` and publishes snapshots.
///
/// Until the first successful fetch, subscribers see
/// `MarketsParameters::default()`.
pub struct ParametersRefresher {
    /// Where parameters come from.
    source: Arc<dyn ParametersSource>,
    /// String-limit divisors applied on conversion.
    multipliers: LimitMultipliers,
    /// Poll interval.
    interval: Duration,
    /// Watch channel sender for snapshot updates.
    snapshot_tx: watch::Sender<Arc<MarketsParameters>>,
}

impl ParametersRefresher {
    /// Create a refresher publishing the built-in defaults.
    ///
    /// Returns the refresher and a watch::Receiver that consumers
    /// read the current snapshot from.
    pub fn new(
        source: Arc<dyn ParametersSource>,
        multipliers: LimitMultipliers,
        interval: Duration,
    ) -> (Self, watch::Receiver<Arc<MarketsParameters>>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(MarketsParameters::default()));

        let refresher = Self {
            source,
            multipliers,
            interval,
            snapshot_tx,
        };

        (refresher, snapshot_rx)
    }

    /// Run the polling loop.
    ///
    /// Polls immediately, then every `interval`. Runs until shutdown.
    #[instrument(skip(self, shutdown_rx), fields(source = self.source.name()))]
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Parameters refresher started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Parameters refresher shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.refresh_once().await;
                }
            }
        }
    }

    /// Fetch once and publish if the values changed.
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let raw = match self.source.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to fetch market parameters, keeping current");
                return RefreshOutcome::Failed;
            }
        };

        let fresh = match MarketsParameters::from_raw(&raw, self.multipliers, Utc::now()) {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(error = %e, "Rejected market parameters, keeping current");
                return RefreshOutcome::Failed;
            }
        };

        let unchanged = {
            let current = self.snapshot_tx.borrow();
            current.is_loaded() && current.same_values(&fresh)
        };
        if unchanged {
            debug!("Market parameters unchanged");
            return RefreshOutcome::Unchanged;
        }

        info!(
            max_positions = fresh.maximum_positions_allowed,
            max_tags = fresh.max_number_of_tags,
            question_limit = fresh.market_question_string_limit,
            position_limit = fresh.market_position_string_limit,
            "Market parameters published"
        );
        // send_replace publishes even with no live receivers
        self.snapshot_tx.send_replace(Arc::new(fresh));
        RefreshOutcome::Published
    }
}
