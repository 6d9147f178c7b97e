//! Theorem mode: interval selection from timeline clicks and theorem
//! creation.

mod common;

use common::{Harness, state};
use dragon_client::{
    ControllerError, Popup, RequestKind, SelectionChange, TheoremCheck, TheoremRange,
    TimelineClick,
};

const HISTORY: [&str; 6] = ["s0", "s1", "s2", "s3", "s4", "s5"];

async fn theorem_harness() -> Harness {
    let harness = Harness::started(5, "s5").await;
    assert!(harness.controller.toggle_create_theorem());
    harness
}

async fn click(harness: &Harness, index: usize) -> SelectionChange {
    match harness
        .controller
        .timeline_clicked(index)
        .await
        .expect("click failed")
    {
        TimelineClick::Selection(change) => change,
        TimelineClick::Navigated => panic!("theorem mode should select, not navigate"),
    }
}

#[tokio::test]
async fn test_toggle_always_clears_selection() {
    let harness = theorem_harness().await;
    click(&harness, 1).await;
    click(&harness, 3).await;
    assert_eq!(harness.controller.selection().start(), Some(1));
    assert_eq!(harness.controller.selection().end(), Some(3));

    assert!(!harness.controller.toggle_create_theorem());
    assert!(harness.controller.selection().is_empty());

    assert!(harness.controller.toggle_create_theorem());
    assert!(harness.controller.selection().is_empty());
}

#[tokio::test]
async fn test_validation_orders_reversed_bounds() {
    let harness = theorem_harness().await;
    click(&harness, 5).await;
    click(&harness, 2).await;

    let check = harness.controller.valid_theorem();

    let range = TheoremRange { start: 2, end: 5 };
    assert_eq!(check, TheoremCheck::Ready(range));
    assert_eq!(harness.controller.selection().start(), Some(2));
    assert_eq!(harness.controller.selection().end(), Some(5));
    assert_eq!(harness.presenter.popups(), vec![Popup::ConfirmTheorem(range)]);
}

#[tokio::test]
async fn test_same_index_twice_empties_selection() {
    let harness = theorem_harness().await;

    assert_eq!(click(&harness, 4).await, SelectionChange::Selected(4));
    assert_eq!(click(&harness, 4).await, SelectionChange::Deselected(4));

    assert!(harness.controller.selection().is_empty());
}

#[tokio::test]
async fn test_third_index_is_ignored() {
    let harness = theorem_harness().await;
    click(&harness, 0).await;
    click(&harness, 2).await;

    assert_eq!(click(&harness, 4).await, SelectionChange::Ignored(4));
    assert_eq!(harness.controller.selection().start(), Some(0));
    assert_eq!(harness.controller.selection().end(), Some(2));
}

#[tokio::test]
async fn test_incomplete_selection_is_reported() {
    let harness = theorem_harness().await;
    click(&harness, 3).await;

    assert_eq!(harness.controller.valid_theorem(), TheoremCheck::Incomplete);
    assert_eq!(harness.presenter.popups(), vec![Popup::IncompleteTheorem]);

    assert_eq!(
        harness.controller.send_theorem_creation().await,
        Err(ControllerError::IncompleteSelection)
    );
    assert!(!harness.controller.theorem_mode());
    assert_eq!(harness.transport.count(RequestKind::CreateTheorem), 0);
}

#[tokio::test]
async fn test_theorem_creation_sends_interval_and_resets() {
    let harness = theorem_harness().await;
    click(&harness, 3).await;
    click(&harness, 1).await;
    harness.controller.valid_theorem();

    harness
        .controller
        .send_theorem_creation()
        .await
        .expect("creation failed");

    assert_eq!(
        harness.transport.paths_of(RequestKind::CreateTheorem),
        vec!["/5/1/3"]
    );
    assert!(!harness.controller.theorem_mode());
    assert!(harness.controller.selection().is_empty());
}

#[tokio::test]
async fn test_click_outside_theorem_mode_navigates() {
    let harness = Harness::started(5, "s5").await;
    harness
        .transport
        .reply(RequestKind::Timeline, state("s2", &HISTORY, 2, "PLAYING"));

    let click = harness
        .controller
        .timeline_clicked(2)
        .await
        .expect("click failed");

    assert_eq!(click, TimelineClick::Navigated);
    assert_eq!(harness.transport.paths_of(RequestKind::Timeline), vec!["/5/2"]);
    let timeline = harness.controller.current_timeline().expect("timeline");
    assert_eq!(timeline.current(), 2);
    assert_eq!(timeline.len(), HISTORY.len());
    assert!(harness.controller.selection().is_empty());
}
