//! Station 2 enqueueing and the station 3 queue monitor.

mod common;

use common::*;
use gradcheck_coordinator::CoordinatorError;
use gradcheck_coordinator::timers::TimerPurpose;
use gradcheck_core::{CaptureMode, StationId};
use gradcheck_services::Outcome;
use gradcheck_services::mock::{BackendCall, CallKind};
use std::time::Duration;

/// A kiosk at station 2 in code mode, with its first poll done.
async fn at_station_two() -> Kiosk {
    let kiosk = start().await;
    kiosk.activate(StationId::Confirmation, CaptureMode::Code).await;
    kiosk
}

fn scan(kiosk: &Kiosk, who: gradcheck_core::Identity) {
    kiosk
        .server
        .set_reading(StationId::Confirmation, CaptureMode::Code, who);
}

fn seeded() -> Vec<gradcheck_core::QueueEntry> {
    vec![
        entry("1", "Ann", false),
        entry("2", "Bob", true),
        entry("3", "Cy", false),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_scan_is_enqueued_once_per_appearance() {
    let kiosk = at_station_two().await;
    scan(&kiosk, ada());

    advance(3000).await;

    let panel = kiosk.scan();
    assert_eq!(panel.identity, Some(ada()));
    assert_eq!(panel.photo_url.as_deref(), Some("/static/photos/2201.jpg"));
    assert_eq!(panel.message.as_deref(), Some("Ada added to the queue"));
    assert_eq!(kiosk.server.queue().len(), 1);

    // The same code stays in view for the next poll.
    advance(3000).await;
    assert_eq!(kiosk.server.call_count(CallKind::Enqueue), 1);
    assert!(kiosk.server.calls().contains(&BackendCall::Enqueue {
        id: "2201".to_string()
    }));
}

#[tokio::test(start_paused = true)]
async fn test_scan_clears_after_dwell_and_can_repeat() {
    let kiosk = at_station_two().await;
    scan(&kiosk, ada());
    advance(3000).await;
    kiosk.server.clear_calls();

    advance(5000).await;

    assert!(kiosk.scan().is_clear());
    assert!(!kiosk.view().has_timer(TimerPurpose::Station2Clear));
    assert_eq!(kiosk.server.call_count(CallKind::ResetScan), 1);

    // Back in front of the camera after the clear: enqueued again, and the
    // server's refusal is shown.
    scan(&kiosk, ada());
    advance(1000).await;

    let panel = kiosk.scan();
    assert_eq!(panel.identity, Some(ada()));
    assert_eq!(panel.message.as_deref(), Some("2201 is already in the queue"));
    assert_eq!(kiosk.server.call_count(CallKind::Enqueue), 1);
    assert_eq!(kiosk.server.queue().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_new_scan_restarts_dwell() {
    let kiosk = at_station_two().await;
    scan(&kiosk, ada());
    advance(3000).await;

    scan(&kiosk, eve());
    advance(5000).await;

    // Ada's clear deadline has passed; Eve arrived later and is still shown.
    assert_eq!(kiosk.scan().identity, Some(eve()));
    assert_eq!(kiosk.server.call_count(CallKind::Enqueue), 2);

    advance(3000).await;
    assert!(kiosk.scan().is_clear());
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_failure_keeps_scan_visible() {
    let kiosk = at_station_two().await;
    kiosk.server.fail(CallKind::Enqueue);
    scan(&kiosk, ada());

    advance(3000).await;

    let panel = kiosk.scan();
    assert_eq!(panel.identity, Some(ada()));
    assert!(panel.message.is_none());
    assert!(kiosk.server.queue().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_queue_monitor_renders_current_and_next() {
    let kiosk = start_with(|server| server.seed_queue(seeded())).await;

    kiosk.activate(StationId::QueueMonitor, CaptureMode::Face).await;

    let view = kiosk.queue().view;
    assert_eq!(view.current_label(), "Bob");
    assert_eq!(view.next_label(), "Cy");
    assert_eq!(view.lines.len(), 3);
    assert_eq!(view.lines[0].position, 1);
    assert!(view.lines[1].is_current);

    let text = kiosk.view().to_string();
    assert!(text.contains("current: Bob"));
    assert!(text.contains(">  2. Bob (2)"));
}

#[tokio::test(start_paused = true)]
async fn test_advance_then_refresh() {
    let kiosk = start_with(|server| server.seed_queue(seeded())).await;
    kiosk.activate(StationId::QueueMonitor, CaptureMode::Face).await;

    let outcome = kiosk.handle.advance_queue().await.unwrap();
    settle().await;

    assert_eq!(outcome, Outcome::accepted("Now serving Cy"));
    let panel = kiosk.queue();
    assert_eq!(panel.view.current_label(), "Cy");
    assert_eq!(panel.view.next_label(), "none");
    assert_eq!(panel.message.as_deref(), Some("Now serving Cy"));
}

#[tokio::test(start_paused = true)]
async fn test_advance_refusal_is_surfaced() {
    let kiosk = start().await;
    kiosk.activate(StationId::QueueMonitor, CaptureMode::Face).await;

    let outcome = kiosk.handle.advance_queue().await.unwrap();

    assert!(!outcome.is_accepted());
    assert_eq!(kiosk.queue().message.as_deref(), Some("Queue is empty"));
}

#[tokio::test(start_paused = true)]
async fn test_advance_transport_failure() {
    let kiosk = start().await;
    kiosk.server.fail(CallKind::AdvanceCurrent);

    let error = kiosk.handle.advance_queue().await.unwrap_err();

    assert!(matches!(error, CoordinatorError::Service(_)));
    let message = kiosk.queue().message.unwrap();
    assert!(message.starts_with("Could not advance:"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_keeps_snapshot() {
    let kiosk = start_with(|server| server.seed_queue(seeded())).await;
    kiosk.activate(StationId::QueueMonitor, CaptureMode::Face).await;
    let before = kiosk.queue().view;

    kiosk.server.fail(CallKind::FetchQueue);
    advance(3000).await;

    assert_eq!(kiosk.queue().view, before);
    assert!(kiosk.server.call_count(CallKind::FetchQueue) >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_refreshes_coalesce() {
    let kiosk = start().await;
    kiosk
        .server
        .set_latency(CallKind::FetchQueue, Duration::from_secs(1));

    for _ in 0..3 {
        kiosk.handle.refresh_queue().await.unwrap();
    }
    advance(3000).await;

    // One fetch, then one replay for everything requested meanwhile.
    assert_eq!(kiosk.server.call_count(CallKind::FetchQueue), 2);
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_shows_up_on_the_monitor() {
    let kiosk = at_station_two().await;
    scan(&kiosk, ada());
    advance(3000).await;

    kiosk.activate(StationId::QueueMonitor, CaptureMode::Face).await;

    let view = kiosk.queue().view;
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.current_label(), "none");
    assert_eq!(view.next_label(), "Ada");
}
