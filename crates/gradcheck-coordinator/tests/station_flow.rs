//! Station routing, polling discipline and settings.

mod common;

use common::*;
use gradcheck_coordinator::timers::TimerPurpose;
use gradcheck_coordinator::{CoordinatorError, HandshakeStatus};
use gradcheck_core::{BarcodeModel, CaptureMode, FaceModel, ModelSelection, StationId};
use gradcheck_services::mock::{BackendCall, CallKind};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_starts_at_station_one_in_face_mode() {
    let kiosk = start().await;
    let view = kiosk.view();

    assert_eq!(view.active, StationId::CheckIn);
    assert_eq!(kiosk.mode(StationId::CheckIn), CaptureMode::Face);
    assert_eq!(view.timers, [TimerPurpose::RecognitionPoll]);

    let calls = kiosk.server.calls();
    assert!(calls.contains(&BackendCall::SelectStream {
        station: StationId::CheckIn,
        mode: CaptureMode::Face
    }));
    assert!(calls.contains(&BackendCall::PollRecognition {
        station: StationId::CheckIn,
        mode: CaptureMode::Face
    }));
    assert_eq!(kiosk.server.call_count(CallKind::ResetScan), 1);

    let stream = view.station(StationId::CheckIn).unwrap().display.stream.clone();
    assert_eq!(stream.unwrap().as_str(), "mock://video/1?mode=face");
}

#[tokio::test(start_paused = true)]
async fn test_one_active_station_through_any_sequence() {
    let kiosk = start().await;
    let sequence = [
        (StationId::Confirmation, CaptureMode::Code),
        (StationId::QueueMonitor, CaptureMode::Face),
        (StationId::CheckIn, CaptureMode::Face),
        (StationId::Confirmation, CaptureMode::Face),
        (StationId::Confirmation, CaptureMode::Code),
        (StationId::CheckIn, CaptureMode::Code),
        (StationId::QueueMonitor, CaptureMode::Face),
    ];

    for (station, mode) in sequence {
        kiosk.activate(station, mode).await;
        advance(1500).await;

        let view = kiosk.view();
        let active: Vec<_> = view
            .stations
            .iter()
            .filter(|s| s.active)
            .map(|s| s.display.station)
            .collect();
        assert_eq!(active, [station]);
        assert_eq!(view.active, station);

        let polling = view.has_timer(TimerPurpose::RecognitionPoll);
        let refreshing = view.has_timer(TimerPurpose::QueueRefresh);
        assert_eq!(polling, station != StationId::QueueMonitor);
        assert_eq!(refreshing, station == StationId::QueueMonitor);
    }
}

#[tokio::test(start_paused = true)]
async fn test_queue_monitor_suppresses_recognition() {
    let kiosk = start().await;
    kiosk.activate(StationId::QueueMonitor, CaptureMode::Face).await;
    kiosk.server.clear_calls();

    advance(10_000).await;

    assert_eq!(kiosk.server.call_count(CallKind::PollRecognition), 0);
    // Refreshes at 3s, 6s and 9s after the immediate one.
    assert_eq!(kiosk.server.call_count(CallKind::FetchQueue), 3);
}

#[tokio::test(start_paused = true)]
async fn test_entering_station_two_resets_server_once() {
    let kiosk = start().await;
    kiosk.server.clear_calls();

    kiosk.activate(StationId::Confirmation, CaptureMode::Code).await;

    assert_eq!(kiosk.server.call_count(CallKind::ResetScan), 1);
    assert!(kiosk.server.calls().contains(&BackendCall::SelectStream {
        station: StationId::Confirmation,
        mode: CaptureMode::Code
    }));
    assert!(kiosk.scan().is_clear());
}

#[tokio::test(start_paused = true)]
async fn test_switching_away_cancels_station2_clear() {
    let kiosk = start().await;
    kiosk.activate(StationId::Confirmation, CaptureMode::Code).await;
    kiosk
        .server
        .set_reading(StationId::Confirmation, CaptureMode::Code, ada());
    advance(3000).await;

    assert_eq!(kiosk.scan().identity, Some(ada()));
    assert!(kiosk.view().has_timer(TimerPurpose::Station2Clear));

    kiosk.activate(StationId::CheckIn, CaptureMode::Face).await;
    assert!(!kiosk.view().has_timer(TimerPurpose::Station2Clear));
    kiosk.server.clear_calls();

    advance(10_000).await;

    // The clear never ran: no reset request and the panel is untouched.
    assert_eq!(kiosk.server.call_count(CallKind::ResetScan), 0);
    assert_eq!(kiosk.scan().identity, Some(ada()));
}

#[tokio::test(start_paused = true)]
async fn test_stale_reading_is_discarded() {
    let kiosk = start_with(|server| {
        server.set_latency(CallKind::PollRecognition, Duration::from_secs(2));
        server.set_reading(StationId::CheckIn, CaptureMode::Face, ada());
    })
    .await;

    kiosk.activate(StationId::QueueMonitor, CaptureMode::Face).await;
    advance(3000).await;

    let handshake = kiosk.handshake();
    assert_eq!(handshake.status, HandshakeStatus::Idle);
    assert!(handshake.face.is_sentinel());
    assert!(kiosk.view().reading(StationId::CheckIn).unwrap().is_sentinel());
}

#[tokio::test(start_paused = true)]
async fn test_poll_failure_renders_sentinel_and_keeps_session() {
    let kiosk = start_with(|server| {
        server.set_reading(StationId::CheckIn, CaptureMode::Face, ada());
    })
    .await;
    assert_eq!(kiosk.view().reading(StationId::CheckIn), Some(&ada()));

    kiosk.server.fail(CallKind::PollRecognition);
    advance(3000).await;

    assert!(kiosk.view().reading(StationId::CheckIn).unwrap().is_sentinel());
    let handshake = kiosk.handshake();
    assert_eq!(handshake.status, HandshakeStatus::FaceCaptured);
    assert_eq!(handshake.face, ada());

    kiosk.server.recover(CallKind::PollRecognition);
    advance(3000).await;
    assert_eq!(kiosk.view().reading(StationId::CheckIn), Some(&ada()));
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_poll_tick_is_skipped() {
    let kiosk = start_with(|server| {
        server.set_latency(CallKind::PollRecognition, Duration::from_secs(7));
    })
    .await;

    // Ticks at 0s, 3s, 6s, 9s; the first request holds the slot until 7s.
    advance(10_000).await;

    assert_eq!(kiosk.server.call_count(CallKind::PollRecognition), 2);
}

#[tokio::test(start_paused = true)]
async fn test_switch_polls_new_station_while_old_request_pending() {
    let kiosk = start_with(|server| {
        server.set_latency(CallKind::PollRecognition, Duration::from_millis(2500));
        server.set_reading(StationId::Confirmation, CaptureMode::Code, ada());
    })
    .await;

    // Station 1's first poll is still outstanding when the operator switches.
    kiosk.activate(StationId::Confirmation, CaptureMode::Code).await;

    assert!(kiosk.server.calls().contains(&BackendCall::PollRecognition {
        station: StationId::Confirmation,
        mode: CaptureMode::Code,
    }));

    // Both answers land; only station 2's is used.
    advance(2900).await;

    assert_eq!(kiosk.scan().identity, Some(ada()));
    assert_eq!(kiosk.server.call_count(CallKind::PollRecognition), 2);
    assert_eq!(kiosk.server.call_count(CallKind::Enqueue), 1);
}

#[tokio::test(start_paused = true)]
async fn test_station_two_poll_failure_keeps_panel() {
    let kiosk = start().await;
    kiosk.activate(StationId::Confirmation, CaptureMode::Code).await;
    kiosk
        .server
        .set_reading(StationId::Confirmation, CaptureMode::Code, ada());
    advance(3000).await;

    kiosk.server.fail(CallKind::PollRecognition);
    advance(3000).await;

    assert_eq!(kiosk.scan().identity, Some(ada()));
    assert!(kiosk
        .view()
        .reading(StationId::Confirmation)
        .unwrap()
        .is_sentinel());
}

#[tokio::test(start_paused = true)]
async fn test_save_settings_reselects_stream() {
    let kiosk = start().await;
    kiosk.server.clear_calls();
    let selection = ModelSelection {
        face: FaceModel::Mtcnn,
        barcode: BarcodeModel::Pyzbar,
    };

    let stored = kiosk.handle.save_settings(selection).await.unwrap();
    settle().await;

    assert_eq!(stored, selection);
    assert_eq!(kiosk.server.settings(), selection);
    assert_eq!(kiosk.server.call_count(CallKind::SelectStream), 1);
    assert_eq!(kiosk.view().settings, Some(selection));
}

#[tokio::test(start_paused = true)]
async fn test_load_settings() {
    let kiosk = start().await;

    let selection = kiosk.handle.load_settings().await.unwrap();

    assert_eq!(selection, ModelSelection::default());
    assert_eq!(kiosk.view().settings, Some(selection));
}

#[tokio::test(start_paused = true)]
async fn test_settings_failure_is_reported() {
    let kiosk = start().await;
    kiosk.server.fail(CallKind::LoadSettings);

    let error = kiosk.handle.load_settings().await.unwrap_err();

    assert!(matches!(error, CoordinatorError::Service(_)));
    assert!(kiosk.view().settings.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    let kiosk = start().await;

    kiosk.handle.shutdown();
    kiosk.task.await.unwrap();

    assert!(!kiosk.handle.is_running());
    let error = kiosk
        .handle
        .activate_station(StationId::Confirmation, CaptureMode::Face)
        .await
        .unwrap_err();
    assert!(matches!(error, CoordinatorError::ChannelClosed));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_is_refused() {
    let (backend, _server) = gradcheck_services::mock::MockBackend::new();
    let config = gradcheck_coordinator::CoordinatorConfig {
        recognition_poll_ms: 0,
        ..Default::default()
    };

    let result = gradcheck_coordinator::spawn_coordinator(backend, config);

    assert!(matches!(result, Err(CoordinatorError::Core(_))));
}

#[tokio::test(start_paused = true)]
async fn test_view_updates_are_observable() {
    let kiosk = start().await;
    let mut updates = kiosk.handle.subscribe();
    updates.borrow_and_update();

    kiosk
        .handle
        .activate_station(StationId::QueueMonitor, CaptureMode::Face)
        .await
        .unwrap();

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow().active, StationId::QueueMonitor);
}
