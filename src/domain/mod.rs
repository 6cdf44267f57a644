//! Domain layer - Market draft rules.
//!
//! Pure logic for composing a market: positions, tags, the end-date
//! window, parameter snapshots and the draft aggregate. No I/O here;
//! time is always passed in by the caller.

pub mod draft;
pub mod parameters;
pub mod positions;
pub mod schedule;
pub mod tags;

pub use draft::{DraftError, DraftIssue, MarketDraft, MarketType, TextField};
pub use parameters::{
    DraftBounds, LimitMultipliers, MarketsParameters, RawMarketsParameters, StringLimits,
};
pub use positions::{CountBounds, PositionList};
pub use schedule::{DateRangeGuard, DateWindow};
pub use tags::{TagCatalog, TagSet, TagSuggestion};
