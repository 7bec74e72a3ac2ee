//! At-most-once application of inbound replies: the timestamp watermark,
//! replay behavior, and the guarantee that failed transitions never
//! advance the watermark.

mod common;

use chrono::{Duration, Utc};
use common::Harness;
use lineup_core::approval::ResolutionOutcome;
use lineup_core::orchestration::IntakeOutcome;
use lineup_core::state_machine::ContentState;
use lineup_core::store::ContentStore;

#[tokio::test]
async fn same_message_applied_twice_causes_one_transition() {
    let harness = Harness::new();
    let (thread_id, content_id) = harness.generate_first("idea").await;
    let received_at = Utc::now();

    let first = harness
        .reply(&thread_id, received_at, "approved")
        .await
        .unwrap();
    assert!(matches!(
        first,
        IntakeOutcome::Applied(ResolutionOutcome::Approved { position: 1, .. })
    ));

    // The polling transport observes the same message again.
    let second = harness
        .reply(&thread_id, received_at, "approved")
        .await
        .unwrap();
    assert!(
        matches!(second, IntakeOutcome::AlreadyApplied { .. }),
        "replay must be a no-op success, not an error"
    );

    let item = harness.store.get(content_id).await.unwrap().unwrap();
    assert_eq!(item.state, ContentState::Queued);
    assert_eq!(item.queue_position, Some(1));

    // Exactly one confirmation went out.
    let confirms = harness
        .transport
        .event_log()
        .iter()
        .filter(|e| e.starts_with("confirm:"))
        .count();
    assert_eq!(confirms, 1);
}

#[tokio::test]
async fn older_messages_are_skipped() {
    let harness = Harness::new();
    let (thread_id, _) = harness.generate_first("idea").await;
    let received_at = Utc::now();

    harness.classifier.set_intent("revise", Some("tighter"));
    harness
        .reply(&thread_id, received_at, "make it tighter")
        .await
        .unwrap();

    // A message from before the watermark shows up late.
    let stale = harness
        .reply(
            &thread_id,
            received_at - Duration::seconds(60),
            "old reply",
        )
        .await
        .unwrap();
    assert!(matches!(stale, IntakeOutcome::AlreadyApplied { .. }));
}

#[tokio::test]
async fn failed_transition_does_not_advance_the_watermark() {
    let harness = Harness::new();
    let (thread_id, content_id) = harness.generate_first("idea").await;
    let received_at = Utc::now();

    // The classifier hands back something outside the closed intent set.
    harness.classifier.set_intent("skip", None);
    let err = harness
        .reply(&thread_id, received_at, "skip this one")
        .await
        .unwrap_err();
    assert!(!err.is_transient());

    let thread = harness.store.thread(&thread_id).await.unwrap().unwrap();
    assert_eq!(thread.last_applied_at, None, "watermark must not move");

    // A genuine retry of the same message can still land.
    harness.classifier.set_intent("approve", None);
    let outcome = harness
        .reply(&thread_id, received_at, "approve it after all")
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        IntakeOutcome::Applied(ResolutionOutcome::Approved { .. })
    ));
    assert_eq!(
        harness.store.get(content_id).await.unwrap().unwrap().state,
        ContentState::Queued
    );
}

#[tokio::test]
async fn replies_on_resolved_threads_are_consumed_without_effect() {
    let harness = Harness::new();
    let (thread_id, content_id) = harness.generate_first("idea").await;

    harness
        .reply(&thread_id, Utc::now(), "approved")
        .await
        .unwrap();

    let late = harness
        .reply(
            &thread_id,
            Utc::now() + Duration::seconds(30),
            "wait, revise it",
        )
        .await
        .unwrap();
    assert!(matches!(late, IntakeOutcome::ThreadResolved { .. }));
    assert_eq!(
        harness.store.get(content_id).await.unwrap().unwrap().state,
        ContentState::Queued,
        "a resolved thread governs nothing"
    );
}

#[tokio::test]
async fn concurrent_deliveries_of_one_message_apply_once() {
    let harness = Harness::new();
    let (thread_id, content_id) = harness.generate_first("idea").await;
    let received_at = Utc::now();

    let (a, b) = tokio::join!(
        harness.reply(&thread_id, received_at, "approved"),
        harness.reply(&thread_id, received_at, "approved"),
    );

    let outcomes = [a.unwrap(), b.unwrap()];
    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, IntakeOutcome::Applied(_)))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o, IntakeOutcome::AlreadyApplied { .. }))
        .count();
    assert_eq!((applied, skipped), (1, 1));

    let item = harness.store.get(content_id).await.unwrap().unwrap();
    assert_eq!(item.queue_position, Some(1));
}
