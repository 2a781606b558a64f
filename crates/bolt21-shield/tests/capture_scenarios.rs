//! End-to-end capture protection scenarios
//!
//! Drives the monitor through the mock platform exactly as native
//! notifications would, then checks the overlay and the window.

use bolt21_shield::{
    CaptureMonitor, MockCapturePlatform, MockWindowHost, OverlayState, RecordingDiagnostics,
    ShieldConfig, ShieldEvent, ShieldMachine,
};
use proptest::prelude::*;
use std::sync::Arc;

struct App {
    platform: Arc<MockCapturePlatform>,
    window: Arc<MockWindowHost>,
    diagnostics: Arc<RecordingDiagnostics>,
    monitor: CaptureMonitor,
}

fn launch() -> App {
    let platform = Arc::new(MockCapturePlatform::new());
    let window = Arc::new(MockWindowHost::new());
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let mut monitor = CaptureMonitor::with_diagnostics(
        platform.clone(),
        window.clone(),
        ShieldConfig::default(),
        diagnostics.clone(),
    );
    monitor.install();
    App {
        platform,
        window,
        diagnostics,
        monitor,
    }
}

#[test]
fn test_recording_starts_and_stops() {
    let mut app = launch();
    assert_eq!(app.monitor.overlay_state(), OverlayState::Hidden);

    app.platform.set_captured_and_notify(true);
    app.monitor.pump();
    assert_eq!(app.monitor.overlay_state(), OverlayState::Shown);
    assert_eq!(app.window.attached_count(), 1);

    app.platform.set_captured_and_notify(false);
    app.monitor.pump();
    assert_eq!(app.monitor.overlay_state(), OverlayState::Hidden);
    assert_eq!(app.window.attached_count(), 0);
}

#[test]
fn test_foreground_while_still_recording_stays_covered() {
    let mut app = launch();
    app.platform.set_captured_and_notify(true);
    app.monitor.pump();

    assert_eq!(app.monitor.will_resign_active(), OverlayState::Shown);
    assert_eq!(app.monitor.did_become_active(), OverlayState::Shown);
    assert_eq!(app.window.attached_count(), 1);
}

#[test]
fn test_background_without_recording_is_defensive() {
    let mut app = launch();

    assert_eq!(app.monitor.will_resign_active(), OverlayState::Shown);
    assert_eq!(app.window.attached_count(), 1);

    assert_eq!(app.monitor.did_become_active(), OverlayState::Hidden);
    assert_eq!(app.window.attached_count(), 0);
}

#[test]
fn test_recording_started_while_backgrounded() {
    let mut app = launch();
    app.monitor.will_resign_active();

    app.platform.set_captured_and_notify(true);
    app.monitor.pump();

    assert_eq!(app.monitor.did_become_active(), OverlayState::Shown);
}

#[test]
fn test_stale_stop_notification_ignored() {
    let mut app = launch();
    app.platform.set_captured_and_notify(true);
    app.monitor.pump();

    // "Stopped" delivered while the platform still reports capture
    app.platform
        .post(ShieldEvent::CaptureStatusChanged { is_captured: false });
    app.monitor.pump();

    assert_eq!(app.monitor.overlay_state(), OverlayState::Shown);
    assert_eq!(app.window.attached_count(), 1);
}

#[test]
fn test_screenshots_reported_not_covered() {
    let mut app = launch();
    app.platform.take_screenshot();
    app.platform.take_screenshot();
    app.monitor.pump();

    assert_eq!(app.diagnostics.count(), 2);
    assert_eq!(app.monitor.overlay_state(), OverlayState::Hidden);
    assert_eq!(app.window.attach_calls(), 0);
}

#[test]
fn test_no_window_never_panics() {
    let mut app = launch();
    app.window.set_window_available(false);

    app.monitor.will_resign_active();
    app.platform.set_captured_and_notify(true);
    app.monitor.pump();
    app.monitor.did_become_active();

    assert_eq!(app.monitor.overlay_state(), OverlayState::Hidden);
    assert_eq!(app.window.attached_count(), 0);
}

fn event_strategy() -> impl Strategy<Value = (ShieldEvent, bool)> {
    let event = prop_oneof![
        any::<bool>().prop_map(|is_captured| ShieldEvent::CaptureStatusChanged { is_captured }),
        Just(ShieldEvent::ScreenshotTaken),
        Just(ShieldEvent::AppWillResignActive),
        Just(ShieldEvent::AppDidBecomeActive),
    ];
    (event, any::<bool>())
}

proptest! {
    #[test]
    fn prop_capture_events_follow_live_status(
        steps in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..40)
    ) {
        let mut machine = ShieldMachine::default();
        for (payload, live) in steps {
            let event = ShieldEvent::CaptureStatusChanged {
                is_captured: payload,
            };
            machine = machine.next(event, live);
            let expected = if live { OverlayState::Shown } else { OverlayState::Hidden };
            prop_assert_eq!(machine.overlay, expected);
        }
    }

    #[test]
    fn prop_lifecycle_rules(steps in proptest::collection::vec(event_strategy(), 1..40)) {
        let mut machine = ShieldMachine::default();
        for (event, live) in steps {
            let before = machine;
            machine = machine.next(event, live);
            match event {
                ShieldEvent::AppWillResignActive => {
                    prop_assert_eq!(machine.overlay, OverlayState::Shown)
                }
                ShieldEvent::AppDidBecomeActive => prop_assert_eq!(
                    machine.overlay,
                    if live { OverlayState::Shown } else { OverlayState::Hidden }
                ),
                ShieldEvent::ScreenshotTaken => prop_assert_eq!(machine, before),
                ShieldEvent::CaptureStatusChanged { .. } => {}
            }
        }
    }

    #[test]
    fn prop_window_never_holds_duplicate_overlays(
        steps in proptest::collection::vec(event_strategy(), 1..60)
    ) {
        let mut app = launch();
        for (event, live) in steps {
            app.platform.set_captured(live);
            app.monitor.handle(event);

            let attached = app.window.attached_count();
            prop_assert!(attached <= 1);
            let expected = if app.monitor.overlay_state() == OverlayState::Shown { 1 } else { 0 };
            prop_assert_eq!(attached, expected);
        }
    }
}
