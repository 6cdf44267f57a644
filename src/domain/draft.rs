//! The in-progress market specification and its validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parameters::DraftBounds;
use super::positions::PositionList;
use super::schedule::DateRangeGuard;
use super::tags::TagSet;

/// How positions are priced in the created market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketType {
    /// Fixed ticket price per position.
    Ticket,
    /// Participants bid freely.
    OpenBid,
}

impl MarketType {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ticket => Self::OpenBid,
            Self::OpenBid => Self::Ticket,
        }
    }
}

impl std::fmt::Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ticket => write!(f, "TICKET"),
            Self::OpenBid => write!(f, "OPEN_BID"),
        }
    }
}

/// A rejected draft mutation. The draft is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("market already has the maximum of {max} positions")]
    PositionLimitReached { max: usize },

    #[error("market needs at least {min} positions")]
    PositionFloorReached { min: usize },

    #[error("position index {index} out of range (have {len})")]
    PositionIndexOutOfRange { index: usize, len: usize },

    #[error("tag {id} is already selected")]
    TagAlreadySelected { id: u32 },

    #[error("at most {max} tags can be selected")]
    TagLimitReached { max: usize },

    #[error("tag index {index} out of range (have {len})")]
    TagIndexOutOfRange { index: usize, len: usize },

    #[error("unknown tag id {id}")]
    UnknownTag { id: u32 },

    #[error("positioning end {candidate} is outside {start} ..= {end}")]
    EndDateOutOfRange {
        candidate: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("draft is not ready for submission: {}", describe(.0))]
    NotSubmittable(Vec<DraftIssue>),
}

fn describe(issues: &[DraftIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Something wrong with the current draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DraftIssue {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("data source is empty")]
    EmptyDataSource,

    #[error("position {index} is empty")]
    EmptyPosition { index: usize },

    #[error("{len} positions, expected {min}..={max}")]
    PositionCount { len: usize, min: usize, max: usize },

    #[error("positioning end {end} is no longer within the allowed window")]
    EndDateOutOfRange { end: DateTime<Utc> },

    #[error("{len} tags selected, at most {max} allowed")]
    TooManyTags { len: usize, max: usize },

    #[error("{field} is {len} characters, limit is {limit}")]
    TooLong {
        field: TextField,
        len: usize,
        limit: u32,
    },
}

impl DraftIssue {
    /// Length warnings are advisory; everything else blocks submission.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::TooLong { .. })
    }
}

/// Free-text field a length warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Question,
    DataSource,
    Position(usize),
}

impl std::fmt::Display for TextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Question => write!(f, "question"),
            Self::DataSource => write!(f, "data source"),
            Self::Position(i) => write!(f, "position {i}"),
        }
    }
}

/// The market being composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDraft {
    pub question: String,
    pub data_source: String,
    pub market_type: MarketType,
    pub withdrawal_enabled: bool,
    pub positions: PositionList,
    pub positioning_end: DateTime<Utc>,
    pub tags: TagSet,
}

impl MarketDraft {
    /// Fresh draft: empty texts, `min_positions` empty positions, ticket
    /// market with withdrawal enabled, no tags.
    pub fn new(positioning_end: DateTime<Utc>, min_positions: usize) -> Self {
        Self {
            question: String::new(),
            data_source: String::new(),
            market_type: MarketType::Ticket,
            withdrawal_enabled: true,
            positions: PositionList::with_empty(min_positions),
            positioning_end,
            tags: TagSet::new(),
        }
    }

    /// Every issue with the draft under `bounds` at `now`, blocking ones first
    /// in field order, then length warnings.
    pub fn issues(
        &self,
        bounds: &DraftBounds,
        guard: &DateRangeGuard,
        now: DateTime<Utc>,
    ) -> Vec<DraftIssue> {
        let mut issues = Vec::new();

        if self.question.is_empty() {
            issues.push(DraftIssue::EmptyQuestion);
        }
        if self.data_source.is_empty() {
            issues.push(DraftIssue::EmptyDataSource);
        }
        if !bounds.positions.contains(self.positions.len()) {
            issues.push(DraftIssue::PositionCount {
                len: self.positions.len(),
                min: bounds.positions.min,
                max: bounds.positions.max,
            });
        }
        issues.extend(
            self.positions
                .iter()
                .enumerate()
                .filter(|(_, label)| label.is_empty())
                .map(|(index, _)| DraftIssue::EmptyPosition { index }),
        );
        if !guard.is_valid(self.positioning_end, now) {
            issues.push(DraftIssue::EndDateOutOfRange {
                end: self.positioning_end,
            });
        }
        if self.tags.len() > bounds.max_tags {
            issues.push(DraftIssue::TooManyTags {
                len: self.tags.len(),
                max: bounds.max_tags,
            });
        }

        let texts = [
            (TextField::Question, self.question.as_str(), bounds.limits.question),
            (TextField::DataSource, self.data_source.as_str(), bounds.limits.data_source),
        ]
        .into_iter()
        .chain(
            self.positions
                .iter()
                .enumerate()
                .map(|(i, label)| (TextField::Position(i), label, bounds.limits.position)),
        );
        for (field, text, limit) in texts {
            let len = text.chars().count();
            if len > limit as usize {
                issues.push(DraftIssue::TooLong { field, len, limit });
            }
        }

        issues
    }

    /// True iff no blocking issue exists.
    pub fn is_submittable(
        &self,
        bounds: &DraftBounds,
        guard: &DateRangeGuard,
        now: DateTime<Utc>,
    ) -> bool {
        self.issues(bounds, guard, now)
            .iter()
            .all(|issue| !issue.is_blocking())
    }
}
