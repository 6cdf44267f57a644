//! Parameters Source Port - Market Manager Reads
//!
//! Defines the trait for fetching the market manager's current
//! parameters. Implementations return raw contract values; conversion
//! and limit shrinking happen in the domain layer.

use async_trait::async_trait;

use crate::domain::parameters::RawMarketsParameters;

/// Trait for market-manager parameter providers.
///
/// Called on a fixed interval by the parameters refresher. A failed
/// fetch never clears the published snapshot.
#[async_trait]
pub trait ParametersSource: Send + Sync + 'static {
  /// Read every parameter in one go.
  async fn fetch(&self) -> anyhow::Result<RawMarketsParameters>;

  /// Short name used in logs.
  fn name(&self) -> &'static str;
}
