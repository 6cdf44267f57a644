//! Integration Tests - Draft Workflow Against Mocked Ports
//!
//! Tests the interaction between usecases, ports, and mock adapters.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use rust_decimal_macros::dec;
use tokio::sync::broadcast;

use market_creator::config::DraftConfig;
use market_creator::domain::draft::{DraftError, DraftIssue, MarketType};
use market_creator::domain::parameters::{LimitMultipliers, MarketsParameters, RawMarketsParameters};
use market_creator::domain::tags::TagCatalog;
use market_creator::ports::market_submitter::{MarketSubmission, SubmissionReceipt};
use market_creator::usecases::{
    submit_draft, MarketDraftController, ParametersRefresher, RefreshOutcome, SubmitError,
};

// ---- Mock Definitions ----

mock! {
    pub Source {}

    #[async_trait::async_trait]
    impl market_creator::ports::parameters_source::ParametersSource for Source {
        async fn fetch(&self) -> anyhow::Result<RawMarketsParameters>;
        fn name(&self) -> &'static str;
    }
}

mock! {
    pub Submitter {}

    #[async_trait::async_trait]
    impl market_creator::ports::market_submitter::MarketSubmitter for Submitter {
        async fn submit(&self, submission: &MarketSubmission) -> anyhow::Result<SubmissionReceipt>;
    }
}

// ---- Helpers ----

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 5, 9, 0, 0).unwrap()
}

fn raw(max_positions: u64, max_tags: u64) -> RawMarketsParameters {
    RawMarketsParameters {
        fixed_bond_amount: 50 * 10u128.pow(18),
        maximum_positions_allowed: max_positions,
        payment_token: "0xpayment".to_string(),
        max_number_of_tags: max_tags,
        min_fixed_ticket_price: 2 * 10u128.pow(18),
        dispute_string_length_limit: 1100,
        market_question_string_limit: 1100,
        market_source_string_limit: 1100,
        market_position_string_limit: 120,
        ..RawMarketsParameters::default()
    }
}

fn source_returning(values: RawMarketsParameters) -> MockSource {
    let mut source = MockSource::new();
    source.expect_name().return_const("mock");
    source.expect_fetch().returning(move || Ok(values.clone()));
    source
}

fn controller(
    parameters: tokio::sync::watch::Receiver<Arc<MarketsParameters>>,
) -> MarketDraftController {
    MarketDraftController::new(
        &DraftConfig::default(),
        Arc::new(TagCatalog::built_in()),
        parameters,
        now(),
    )
}

fn fill(controller: &mut MarketDraftController) {
    controller.set_question("Will X happen?");
    controller.set_data_source("oracle.example");
    controller.set_position_text(0, "Yes").unwrap();
    controller.set_position_text(1, "No").unwrap();
}

fn receipt(id: &str) -> SubmissionReceipt {
    SubmissionReceipt {
        submission_id: id.to_string(),
        submitted_at: now(),
    }
}

// ---- Refresher ----

#[tokio::test]
async fn test_refresh_publishes_converted_snapshot() {
    let source = Arc::new(source_returning(raw(4, 3)));
    let (refresher, rx) =
        ParametersRefresher::new(source, LimitMultipliers::default(), Duration::from_secs(5));

    assert!(!rx.borrow().is_loaded());
    assert_eq!(refresher.refresh_once().await, RefreshOutcome::Published);

    let snapshot = rx.borrow().clone();
    assert!(snapshot.is_loaded());
    assert_eq!(snapshot.maximum_positions_allowed, 4);
    assert_eq!(snapshot.fixed_bond_amount, dec!(50));
    assert_eq!(snapshot.market_position_string_limit, 100);

    assert_eq!(refresher.refresh_once().await, RefreshOutcome::Unchanged);
}

#[tokio::test]
async fn test_failed_fetch_keeps_current_snapshot() {
    let mut source = MockSource::new();
    source.expect_name().return_const("mock");
    let mut calls = 0;
    source.expect_fetch().returning(move || {
        calls += 1;
        if calls == 1 {
            Ok(raw(4, 3))
        } else {
            Err(anyhow::anyhow!("rpc unavailable"))
        }
    });
    let (refresher, rx) = ParametersRefresher::new(
        Arc::new(source),
        LimitMultipliers::default(),
        Duration::from_secs(5),
    );

    assert_eq!(refresher.refresh_once().await, RefreshOutcome::Published);
    assert_eq!(refresher.refresh_once().await, RefreshOutcome::Failed);
    assert_eq!(rx.borrow().maximum_positions_allowed, 4);
}

#[tokio::test]
async fn test_unconvertible_values_are_rejected() {
    let mut bad = raw(4, 3);
    bad.dispute_price = u128::MAX;
    let (refresher, rx) = ParametersRefresher::new(
        Arc::new(source_returning(bad)),
        LimitMultipliers::default(),
        Duration::from_secs(5),
    );
    assert_eq!(refresher.refresh_once().await, RefreshOutcome::Failed);
    assert!(!rx.borrow().is_loaded());
}

#[tokio::test(start_paused = true)]
async fn test_refresher_polls_until_shutdown() {
    let mut source = MockSource::new();
    source.expect_name().return_const("mock");
    let mut calls: u64 = 0;
    source.expect_fetch().returning(move || {
        calls += 1;
        // a new cap every poll so every poll publishes
        Ok(raw(calls + 2, 3))
    });

    let (refresher, mut rx) = ParametersRefresher::new(
        Arc::new(source),
        LimitMultipliers::default(),
        Duration::from_millis(5000),
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(async move { refresher.run(shutdown_rx).await });

    // first poll is immediate
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().maximum_positions_allowed, 3);

    tokio::time::sleep(Duration::from_millis(5001)).await;
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().maximum_positions_allowed, 4);

    shutdown_tx.send(()).unwrap();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_controller_sees_latest_snapshot() {
    let (refresher, rx) = ParametersRefresher::new(
        Arc::new(source_returning(raw(3, 1))),
        LimitMultipliers::default(),
        Duration::from_secs(5),
    );
    let mut c = controller(rx);

    // defaults until the first fetch lands
    assert!(c.add_position().is_ok());
    assert!(c.add_tag_by_id(1).is_ok());
    c.remove_position(2).unwrap();
    c.remove_tag(0).unwrap();

    refresher.refresh_once().await;
    assert!(c.add_position().is_ok());
    assert_eq!(c.add_position(), Err(DraftError::PositionLimitReached { max: 3 }));
    c.add_tag_by_id(1).unwrap();
    assert_eq!(c.add_tag_by_id(2), Err(DraftError::TagLimitReached { max: 1 }));
    assert!(c.view(now()).parameters_loaded);
}

// ---- Submission ----

#[tokio::test]
async fn test_submit_resets_draft_on_success() {
    let (_tx, rx) = tokio::sync::watch::channel(Arc::new(MarketsParameters {
        fixed_bond_amount: dec!(100),
        ..MarketsParameters::default()
    }));
    let mut c = controller(rx);
    fill(&mut c);
    c.add_tag_by_id(2).unwrap();

    let mut submitter = MockSubmitter::new();
    submitter
        .expect_submit()
        .withf(|s: &MarketSubmission| {
            s.draft.question == "Will X happen?"
                && s.draft.market_type == MarketType::Ticket
                && s.fixed_bond_amount == dec!(100)
                && s.ticket_price.is_some()
                && s.draft.tags.len() == 1
        })
        .times(1)
        .returning(|_| Ok(receipt("tx_1")));

    let result = submit_draft(&mut c, &submitter, now()).await.unwrap();
    assert_eq!(result.submission_id, "tx_1");
    assert!(c.draft().question.is_empty());
    assert!(c.draft().tags.is_empty());
}

#[tokio::test]
async fn test_unsubmittable_draft_never_reaches_submitter() {
    let (_tx, rx) = tokio::sync::watch::channel(Arc::new(MarketsParameters::default()));
    let mut c = controller(rx);
    c.set_question("Will X happen?");

    let mut submitter = MockSubmitter::new();
    submitter.expect_submit().times(0);

    let err = submit_draft(&mut c, &submitter, now()).await.unwrap_err();
    match err {
        SubmitError::Draft(DraftError::NotSubmittable(issues)) => {
            assert!(issues.contains(&DraftIssue::EmptyDataSource));
            assert!(issues.contains(&DraftIssue::EmptyPosition { index: 0 }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(c.draft().question, "Will X happen?");
}

#[tokio::test]
async fn test_submitter_failure_keeps_draft() {
    let (_tx, rx) = tokio::sync::watch::channel(Arc::new(MarketsParameters::default()));
    let mut c = controller(rx);
    fill(&mut c);
    let before = c.draft().clone();

    let mut submitter = MockSubmitter::new();
    submitter
        .expect_submit()
        .returning(|_| Err(anyhow::anyhow!("insufficient allowance")));

    let err = submit_draft(&mut c, &submitter, now()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Submitter(_)));
    assert!(err.to_string().contains("insufficient allowance"));
    assert_eq!(c.draft(), &before);
}

#[tokio::test]
async fn test_expired_end_date_blocks_submission() {
    let (_tx, rx) = tokio::sync::watch::channel(Arc::new(MarketsParameters::default()));
    let mut c = controller(rx);
    fill(&mut c);
    let later = c.draft().positioning_end + chrono::Duration::minutes(1);

    let mut submitter = MockSubmitter::new();
    submitter.expect_submit().times(0);

    let err = submit_draft(&mut c, &submitter, later).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Draft(DraftError::NotSubmittable(ref issues))
            if matches!(issues.as_slice(), [DraftIssue::EndDateOutOfRange { .. }])
    ));
}

// ---- File source end-to-end ----

#[tokio::test]
async fn test_file_source_feeds_controller() {
    use std::io::Write;

    use market_creator::adapters::parameters::FileParametersSource;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
fixed_bond_amount = "100000000000000000000"
maximum_positions_allowed = 3
dispute_price = "0"
payment_token = "0xpayment"
max_number_of_tags = 2
min_fixed_ticket_price = "1500000000000000000"
dispute_string_length_limit = 1100
market_question_string_limit = 110
market_source_string_limit = 110
market_position_string_limit = 24
"#
    )
    .unwrap();

    let (refresher, rx) = ParametersRefresher::new(
        Arc::new(FileParametersSource::new(file.path())),
        LimitMultipliers::default(),
        Duration::from_secs(5),
    );
    assert_eq!(refresher.refresh_once().await, RefreshOutcome::Published);

    let mut c = controller(rx);
    fill(&mut c);
    c.add_position().unwrap();
    c.set_position_text(2, "Maybe").unwrap();
    assert!(c.add_position().is_err());

    let view = c.view(now());
    assert_eq!(view.limits.question, 100);
    assert_eq!(view.limits.position, 20);
    assert_eq!(view.max_tags, 2);
    assert!(view.is_submittable);

    let submission = c.submission(now()).unwrap();
    assert_eq!(submission.ticket_price, Some(dec!(1.5)));
    assert_eq!(submission.fixed_bond_amount, dec!(100));
}
