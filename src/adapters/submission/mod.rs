//! Submission Adapters - Market Creation Backends
//!
//! - `DryRunSubmitter`: logs the submission instead of sending a transaction

pub mod dry_run;

pub use dry_run::DryRunSubmitter;
