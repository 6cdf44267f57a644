//! Market Draft Controller - Single Mutation Surface for the Creation Form
//!
//! Owns the draft and applies one command at a time. Every mutation
//! either succeeds completely or returns a `DraftError` with the draft
//! untouched. Bounds come from whichever parameters snapshot is current
//! at the moment of the call; derived flags are recomputed on every
//! read and never cached.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::config::DraftConfig;
use crate::domain::draft::{DraftError, DraftIssue, MarketDraft, MarketType};
use crate::domain::parameters::{DraftBounds, MarketsParameters, StringLimits};
use crate::domain::schedule::{DateRangeGuard, DateWindow};
use crate::domain::tags::{TagCatalog, TagSuggestion};
use crate::ports::market_submitter::MarketSubmission;

/// One discrete edit coming from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommand {
    SetQuestion(String),
    SetDataSource(String),
    ToggleMarketType,
    ToggleWithdrawal,
    AddPosition,
    RemovePosition(usize),
    SetPositionText { index: usize, text: String },
    /// Add a catalog tag by id.
    AddTag(u32),
    RemoveTag(usize),
    SetPositioningEnd(DateTime<Utc>),
}

/// Errors parsing a textual command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`")]
    Unknown(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{0}` is not a valid index or id")]
    InvalidNumber(String),

    #[error("`{0}` is not an RFC 3339 date-time")]
    InvalidDate(String),
}

impl FromStr for DraftCommand {
    type Err = CommandError;

    /// One command per line: a keyword, then its arguments. Free text
    /// runs to the end of the line and is taken verbatim.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start();
        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        match keyword {
            "" => Err(CommandError::Empty),
            "question" => Ok(Self::SetQuestion(rest.to_string())),
            "source" => Ok(Self::SetDataSource(rest.to_string())),
            "toggle-type" => Ok(Self::ToggleMarketType),
            "toggle-withdrawal" => Ok(Self::ToggleWithdrawal),
            "add-position" => Ok(Self::AddPosition),
            "remove-position" => Ok(Self::RemovePosition(number(
                "remove-position",
                "an index",
                rest,
            )?)),
            "position" => {
                let rest = rest.trim_start();
                let (index, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Ok(Self::SetPositionText {
                    index: number("position", "an index", index)?,
                    text: text.to_string(),
                })
            }
            "add-tag" => Ok(Self::AddTag(number("add-tag", "a tag id", rest)?)),
            "remove-tag" => Ok(Self::RemoveTag(number("remove-tag", "an index", rest)?)),
            "end-date" => {
                let raw = rest.trim();
                if raw.is_empty() {
                    return Err(CommandError::MissingArgument {
                        command: "end-date",
                        argument: "a date-time",
                    });
                }
                DateTime::parse_from_rfc3339(raw)
                    .map(|date| Self::SetPositioningEnd(date.with_timezone(&Utc)))
                    .map_err(|_| CommandError::InvalidDate(raw.to_string()))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn number<T: FromStr>(
    command: &'static str,
    argument: &'static str,
    raw: &str,
) -> Result<T, CommandError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CommandError::MissingArgument { command, argument });
    }
    raw.parse()
        .map_err(|_| CommandError::InvalidNumber(raw.to_string()))
}

/// Everything the form needs to render after a change.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub draft: MarketDraft,
    pub can_add_position: bool,
    pub can_remove_position: bool,
    pub is_submittable: bool,
    pub end_date_bounds: DateWindow,
    pub issues: Vec<DraftIssue>,
    pub limits: StringLimits,
    pub max_tags: usize,
    pub available_tags: Vec<TagSuggestion>,
    pub parameters_loaded: bool,
}

/// Sole owner and mutator of a market draft.
pub struct MarketDraftController {
    draft: MarketDraft,
    config: DraftConfig,
    guard: DateRangeGuard,
    catalog: Arc<TagCatalog>,
    parameters: watch::Receiver<Arc<MarketsParameters>>,
}

impl MarketDraftController {
    /// Start a session with a fresh draft.
    pub fn new(
        config: &DraftConfig,
        catalog: Arc<TagCatalog>,
        parameters: watch::Receiver<Arc<MarketsParameters>>,
        now: DateTime<Utc>,
    ) -> Self {
        let guard = DateRangeGuard::new(
            config.default_end_offset_days,
            config.end_of_day_hour_utc,
            config.window_years,
        );
        let draft = MarketDraft::new(guard.default_end_date(now), config.min_positions);
        Self {
            draft,
            config: config.clone(),
            guard,
            catalog,
            parameters,
        }
    }

    pub fn draft(&self) -> &MarketDraft {
        &self.draft
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    /// Latest published snapshot. Never waits for a refresh.
    pub fn parameters(&self) -> Arc<MarketsParameters> {
        Arc::clone(&self.parameters.borrow())
    }

    /// Bounds resolved from the current snapshot.
    pub fn bounds(&self) -> DraftBounds {
        self.parameters.borrow().bounds(
            self.config.min_positions,
            self.config.default_max_positions,
            self.catalog.len(),
        )
    }

    // ── Mutations ───────────────────────────────────────────

    /// Apply one command.
    #[instrument(skip(self), level = "debug")]
    pub fn apply(&mut self, command: DraftCommand, now: DateTime<Utc>) -> Result<(), DraftError> {
        let result = match command {
            DraftCommand::SetQuestion(text) => {
                self.set_question(text);
                Ok(())
            }
            DraftCommand::SetDataSource(text) => {
                self.set_data_source(text);
                Ok(())
            }
            DraftCommand::ToggleMarketType => {
                self.toggle_market_type();
                Ok(())
            }
            DraftCommand::ToggleWithdrawal => {
                self.toggle_withdrawal();
                Ok(())
            }
            DraftCommand::AddPosition => self.add_position().map(|_| ()),
            DraftCommand::RemovePosition(index) => self.remove_position(index).map(|_| ()),
            DraftCommand::SetPositionText { index, text } => self.set_position_text(index, text),
            DraftCommand::AddTag(id) => self.add_tag_by_id(id),
            DraftCommand::RemoveTag(index) => self.remove_tag(index).map(|_| ()),
            DraftCommand::SetPositioningEnd(date) => self.set_positioning_end_date(date, now),
        };

        if let Err(e) = &result {
            debug!(error = %e, "Draft command rejected");
        }
        result
    }

    pub fn set_question(&mut self, text: impl Into<String>) {
        self.draft.question = text.into();
    }

    pub fn set_data_source(&mut self, text: impl Into<String>) {
        self.draft.data_source = text.into();
    }

    /// Flip between ticket and open-bid, returning the new type.
    pub fn toggle_market_type(&mut self) -> MarketType {
        self.draft.market_type = self.draft.market_type.toggled();
        self.draft.market_type
    }

    /// Flip withdrawal, returning the new setting.
    pub fn toggle_withdrawal(&mut self) -> bool {
        self.draft.withdrawal_enabled = !self.draft.withdrawal_enabled;
        self.draft.withdrawal_enabled
    }

    /// Append an empty position, returning its index.
    pub fn add_position(&mut self) -> Result<usize, DraftError> {
        let bounds = self.bounds().positions;
        self.draft.positions.append(bounds)
    }

    /// Remove the position at `index`, returning its label.
    pub fn remove_position(&mut self, index: usize) -> Result<String, DraftError> {
        let bounds = self.bounds().positions;
        self.draft.positions.remove_at(index, bounds)
    }

    pub fn set_position_text(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), DraftError> {
        self.draft.positions.set_text_at(index, text)
    }

    /// Add `tag` unless its id is taken or the tag cap is reached.
    pub fn add_tag(&mut self, tag: TagSuggestion) -> Result<(), DraftError> {
        let max_tags = self.bounds().max_tags;
        self.draft.tags.add(tag, max_tags)
    }

    /// Add the catalog tag with `id`.
    pub fn add_tag_by_id(&mut self, id: u32) -> Result<(), DraftError> {
        let tag = self
            .catalog
            .get(id)
            .cloned()
            .ok_or(DraftError::UnknownTag { id })?;
        self.add_tag(tag)
    }

    /// Remove the tag at `index`, returning it.
    pub fn remove_tag(&mut self, index: usize) -> Result<TagSuggestion, DraftError> {
        self.draft.tags.remove_at(index)
    }

    /// Set the positioning end if it lies inside the window at `now`.
    pub fn set_positioning_end_date(
        &mut self,
        date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DraftError> {
        self.guard.check(date, now)?;
        self.draft.positioning_end = date;
        Ok(())
    }

    /// Discard the draft and start over with defaults.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.draft = MarketDraft::new(self.guard.default_end_date(now), self.config.min_positions);
        info!("Draft reset to defaults");
    }

    // ── Derived state ───────────────────────────────────────

    pub fn can_add_position(&self) -> bool {
        self.draft.positions.can_add(self.bounds().positions)
    }

    pub fn can_remove_position(&self) -> bool {
        self.draft.positions.can_remove(self.bounds().positions)
    }

    pub fn valid_end_dates(&self, now: DateTime<Utc>) -> DateWindow {
        self.guard.valid_range(now)
    }

    /// Catalog tags that are not yet selected.
    pub fn available_tags(&self) -> Vec<TagSuggestion> {
        self.catalog.available(&self.draft.tags).cloned().collect()
    }

    pub fn issues(&self, now: DateTime<Utc>) -> Vec<DraftIssue> {
        self.draft.issues(&self.bounds(), &self.guard, now)
    }

    pub fn is_submittable(&self, now: DateTime<Utc>) -> bool {
        self.draft.is_submittable(&self.bounds(), &self.guard, now)
    }

    pub fn view(&self, now: DateTime<Utc>) -> DraftView {
        let parameters = self.parameters();
        let bounds = parameters.bounds(
            self.config.min_positions,
            self.config.default_max_positions,
            self.catalog.len(),
        );
        let issues = self.draft.issues(&bounds, &self.guard, now);

        DraftView {
            draft: self.draft.clone(),
            can_add_position: self.draft.positions.can_add(bounds.positions),
            can_remove_position: self.draft.positions.can_remove(bounds.positions),
            is_submittable: issues.iter().all(|issue| !issue.is_blocking()),
            end_date_bounds: self.guard.valid_range(now),
            issues,
            limits: bounds.limits,
            max_tags: bounds.max_tags,
            available_tags: self.available_tags(),
            parameters_loaded: parameters.is_loaded(),
        }
    }

    /// Package the draft for the submitter, or list what blocks it.
    pub fn submission(&self, now: DateTime<Utc>) -> Result<MarketSubmission, DraftError> {
        let parameters = self.parameters();
        let bounds = parameters.bounds(
            self.config.min_positions,
            self.config.default_max_positions,
            self.catalog.len(),
        );
        let blocking: Vec<DraftIssue> = self
            .draft
            .issues(&bounds, &self.guard, now)
            .into_iter()
            .filter(DraftIssue::is_blocking)
            .collect();
        if !blocking.is_empty() {
            return Err(DraftError::NotSubmittable(blocking));
        }

        let ticket_price = match self.draft.market_type {
            MarketType::Ticket => Some(bounds.ticket_price),
            MarketType::OpenBid => None,
        };

        Ok(MarketSubmission {
            draft: self.draft.clone(),
            fixed_bond_amount: parameters.fixed_bond_amount,
            ticket_price,
            payment_token: parameters.payment_token.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Timelike};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::domain::parameters::MINIMUM_TICKET_PRICE;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 18, 20, 0).unwrap()
    }

    fn controller_with(
        parameters: MarketsParameters,
    ) -> (MarketDraftController, watch::Sender<Arc<MarketsParameters>>) {
        let (tx, rx) = watch::channel(Arc::new(parameters));
        let controller = MarketDraftController::new(
            &DraftConfig::default(),
            Arc::new(TagCatalog::built_in()),
            rx,
            now(),
        );
        (controller, tx)
    }

    fn controller() -> MarketDraftController {
        controller_with(MarketsParameters::default()).0
    }

    #[test]
    fn test_defaults() {
        let c = controller();
        let draft = c.draft();
        assert_eq!(draft.positions.len(), 2);
        assert!(draft.positions.iter().all(str::is_empty));
        assert_eq!(draft.market_type, MarketType::Ticket);
        assert!(draft.withdrawal_enabled);
        assert!(draft.tags.is_empty());
        assert_eq!(draft.positioning_end.hour(), 12);
        assert!(!c.can_remove_position());
        assert!(c.can_add_position());
    }

    #[test]
    fn test_fill_to_submittable() {
        let mut c = controller();
        assert!(!c.is_submittable(now()));
        c.set_question("Will X happen?");
        c.set_data_source("oracle.example");
        c.set_position_text(0, "Yes").unwrap();
        assert!(!c.is_submittable(now()));
        c.set_position_text(1, "No").unwrap();
        assert!(c.is_submittable(now()));
    }

    #[test]
    fn test_add_position_stops_at_cap() {
        let mut c = controller();
        for _ in 0..3 {
            c.add_position().unwrap();
        }
        assert_eq!(c.draft().positions.len(), 5);
        assert_eq!(
            c.add_position(),
            Err(DraftError::PositionLimitReached { max: 5 })
        );
        assert_eq!(c.draft().positions.len(), 5);
    }

    #[test]
    fn test_snapshot_cap_applies_to_next_call() {
        let (mut c, tx) = controller_with(MarketsParameters::default());
        c.add_position().unwrap();
        tx.send(Arc::new(MarketsParameters {
            maximum_positions_allowed: 3,
            ..MarketsParameters::default()
        }))
        .unwrap();
        assert!(!c.can_add_position());
        assert!(c.add_position().is_err());
        assert_eq!(c.draft().positions.len(), 3);
    }

    #[test]
    fn test_toggles() {
        let mut c = controller();
        assert_eq!(c.toggle_market_type(), MarketType::OpenBid);
        assert_eq!(c.toggle_market_type(), MarketType::Ticket);
        assert!(!c.toggle_withdrawal());
        assert!(c.toggle_withdrawal());
    }

    #[test]
    fn test_tag_added_twice_is_kept_once() {
        let mut c = controller();
        c.add_tag(TagSuggestion::new(3, "Basketball")).unwrap();
        assert_eq!(
            c.add_tag(TagSuggestion::new(3, "Basketball")),
            Err(DraftError::TagAlreadySelected { id: 3 })
        );
        assert_eq!(c.draft().tags.len(), 1);
        assert!(c.available_tags().iter().all(|t| t.id != 3));
    }

    #[test]
    fn test_tag_cap_from_snapshot() {
        let (mut c, _tx) = controller_with(MarketsParameters {
            max_number_of_tags: 2,
            ..MarketsParameters::default()
        });
        c.add_tag_by_id(1).unwrap();
        c.add_tag_by_id(2).unwrap();
        assert_eq!(c.add_tag_by_id(3), Err(DraftError::TagLimitReached { max: 2 }));
        assert_eq!(c.add_tag_by_id(99), Err(DraftError::UnknownTag { id: 99 }));
    }

    #[test]
    fn test_end_date_outside_window_is_rejected() {
        let mut c = controller();
        let before = c.draft().positioning_end;
        let err = c.set_positioning_end_date(now() - Duration::days(1), now());
        assert!(matches!(err, Err(DraftError::EndDateOutOfRange { .. })));
        assert_eq!(c.draft().positioning_end, before);

        let edge = c.valid_end_dates(now()).end;
        c.set_positioning_end_date(edge, now()).unwrap();
        assert_eq!(c.draft().positioning_end, edge);
    }

    #[test]
    fn test_submission_carries_snapshot_terms() {
        let (mut c, _tx) = controller_with(MarketsParameters {
            fixed_bond_amount: dec!(100),
            min_fixed_ticket_price: dec!(2.5),
            payment_token: "0xusd".to_string(),
            ..MarketsParameters::default()
        });
        assert!(matches!(c.submission(now()), Err(DraftError::NotSubmittable(_))));

        c.set_question("Q?");
        c.set_data_source("src");
        c.set_position_text(0, "A").unwrap();
        c.set_position_text(1, "B").unwrap();
        let submission = c.submission(now()).unwrap();
        assert_eq!(submission.fixed_bond_amount, dec!(100));
        assert_eq!(submission.ticket_price, Some(dec!(2.5)));
        assert_eq!(submission.payment_token, "0xusd");

        c.toggle_market_type();
        assert_eq!(c.submission(now()).unwrap().ticket_price, None);
    }

    #[test]
    fn test_loaded_zero_ticket_price_uses_minimum() {
        let free = MarketsParameters {
            min_fixed_ticket_price: Decimal::ZERO,
            loaded_at: Some(now()),
            ..MarketsParameters::default()
        };
        let (mut c, _tx) = controller_with(free);
        c.set_question("Q?");
        c.set_data_source("src");
        c.set_position_text(0, "A").unwrap();
        c.set_position_text(1, "B").unwrap();
        assert_eq!(
            c.submission(now()).unwrap().ticket_price,
            Some(MINIMUM_TICKET_PRICE)
        );
    }

    #[test]
    fn test_apply_parsed_commands() {
        let mut c = controller();
        for line in [
            "question Will it rain tomorrow?",
            "source weather.example",
            "position 0 Yes",
            "position 1 No",
            "add-position",
            "position 2 Maybe",
            "remove-position 2",
            "add-tag 4",
            "toggle-withdrawal",
        ] {
            let command: DraftCommand = line.parse().unwrap();
            c.apply(command, now()).unwrap();
        }
        let draft = c.draft();
        assert_eq!(draft.question, "Will it rain tomorrow?");
        assert_eq!(draft.positions.iter().collect::<Vec<_>>(), vec!["Yes", "No"]);
        assert_eq!(draft.tags.as_slice()[0].name, "Crypto");
        assert!(!draft.withdrawal_enabled);
        assert!(c.is_submittable(now()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<DraftCommand>(), Err(CommandError::Empty));
        assert_eq!(
            "fly away".parse::<DraftCommand>(),
            Err(CommandError::Unknown("fly".to_string()))
        );
        assert!(matches!(
            "remove-tag".parse::<DraftCommand>(),
            Err(CommandError::MissingArgument { command: "remove-tag", .. })
        ));
        assert_eq!(
            "add-tag x".parse::<DraftCommand>(),
            Err(CommandError::InvalidNumber("x".to_string()))
        );
        assert!(matches!(
            "end-date tomorrow".parse::<DraftCommand>(),
            Err(CommandError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let expected = DraftCommand::SetPositionText {
            index: 0,
            text: "Yes".to_string(),
        };
        assert_eq!("position  0 Yes".parse::<DraftCommand>(), Ok(expected.clone()));
        assert_eq!("position\t0\tYes".parse::<DraftCommand>(), Ok(expected));
        assert_eq!(
            "remove-tag\t1".parse::<DraftCommand>(),
            Ok(DraftCommand::RemoveTag(1))
        );
    }

    #[test]
    fn test_parse_end_date_normalizes_to_utc() {
        let command: DraftCommand = "end-date 2024-10-01T14:00:00+02:00".parse().unwrap();
        assert_eq!(
            command,
            DraftCommand::SetPositioningEnd(Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_view_flags_follow_state() {
        let mut c = controller();
        let view = c.view(now());
        assert!(!view.is_submittable);
        assert!(view.can_add_position);
        assert!(!view.can_remove_position);
        assert!(!view.parameters_loaded);
        assert_eq!(view.available_tags.len(), 10);

        c.add_position().unwrap();
        c.add_tag_by_id(1).unwrap();
        let view = c.view(now());
        assert!(view.can_remove_position);
        assert_eq!(view.available_tags.len(), 9);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut c = controller();
        c.set_question("Q?");
        c.add_position().unwrap();
        c.toggle_market_type();
        c.reset(now());
        assert_eq!(c.draft(), &MarketDraft::new(c.draft().positioning_end, 2));
        assert!(c.draft().question.is_empty());
    }
}
