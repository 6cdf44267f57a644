//! Use Cases Layer - Application Workflows
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `MarketDraftController`: Single mutation surface for the creation form
//! - `ParametersRefresher`: Periodic market-manager parameter snapshots
//! - `submit_draft`: Hands a submittable draft to the market submitter

pub mod draft_controller;
pub mod parameters_refresher;
pub mod submission;

pub use draft_controller::{CommandError, DraftCommand, DraftView, MarketDraftController};
pub use parameters_refresher::{ParametersRefresher, RefreshOutcome};
pub use submission::{submit_draft, SubmitError};
