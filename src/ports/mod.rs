//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Interfaces the draft workflow needs from the outside world.
//! Adapters implement these traits.
//!
//! Port categories:
//! - `ParametersSource`: Reads market-manager parameters from chain
//! - `MarketSubmitter`: Performs the on-chain market creation

pub mod market_submitter;
pub mod parameters_source;
