//! End-to-end scenarios on the virtual clock.
//!
//! Each test drives a monitor wired to headless providers and checks the
//! resulting state, force-submit calls and telemetry stream.

mod common;

use common::Harness;
use proctor_monitor::{CapabilityError, MonitorConfig, MonitorEvent};
use proctor_types::{ClipboardAction, MonitorState, TelemetryEventType, ViolationKind};

// ---------------------------------------------------------------------------
// Setup failures
// ---------------------------------------------------------------------------

#[test]
fn camera_denied_during_setup_is_critical() {
    let mut h = Harness::new(MonitorConfig::default());
    h.send(MonitorEvent::Start, 0);
    assert_eq!(h.monitor.state(), MonitorState::Initializing);

    h.send(
        MonitorEvent::SetupFailed(CapabilityError::CameraDenied("NotAllowedError".into())),
        250,
    );

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    let message = h.monitor.session().critical_message.clone().unwrap_or_default();
    assert!(message.contains("Camera access denied"), "got {message}");
    assert_eq!(h.count(TelemetryEventType::GraceStarted), 0);
    assert_eq!(h.providers.force_submit.calls(), 1);
    assert_eq!(h.monitor.next_deadline(), None);
}

#[test]
fn model_load_failure_is_critical() {
    let mut h = Harness::new(MonitorConfig::default());
    h.send(MonitorEvent::Start, 0);
    h.send(MonitorEvent::CameraReady, 10);
    h.send(MonitorEvent::FullscreenChanged { engaged: true }, 20);
    h.send(
        MonitorEvent::SetupFailed(CapabilityError::ModelLoadFailed("wasm backend".into())),
        30,
    );

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    assert!(h.providers.camera.is_released());
    assert_eq!(h.providers.fullscreen.exit_calls(), 1);
    assert_eq!(h.count(TelemetryEventType::GraceStarted), 0);
}

#[test]
fn lost_frame_during_setup_keeps_gate_closed() {
    let mut h = Harness::new(MonitorConfig::default());
    h.send(MonitorEvent::Start, 0);
    h.send(MonitorEvent::CameraReady, 10);
    h.send(
        MonitorEvent::SetupFailed(CapabilityError::FrameUnavailable("track ended".into())),
        20,
    );
    h.send(MonitorEvent::FullscreenChanged { engaged: true }, 30);
    h.send(MonitorEvent::ModelLoaded, 40);

    assert_eq!(h.monitor.state(), MonitorState::Initializing);
    assert!(!h.monitor.session().camera_ready);
    assert_eq!(h.providers.force_submit.calls(), 0);
    assert_eq!(h.count(TelemetryEventType::SetupFailed), 1);

    h.send(MonitorEvent::CameraReady, 500);
    assert_eq!(h.monitor.state(), MonitorState::Active);
}

#[test]
fn inference_error_during_setup_is_not_fatal() {
    let mut h = Harness::new(MonitorConfig::default());
    h.send(MonitorEvent::Start, 0);
    h.send(
        MonitorEvent::SetupFailed(CapabilityError::InferenceFailed("warmup".into())),
        10,
    );
    assert_eq!(h.monitor.state(), MonitorState::Initializing);

    h.send(MonitorEvent::CameraReady, 20);
    h.send(MonitorEvent::FullscreenChanged { engaged: true }, 30);
    h.send(MonitorEvent::ModelLoaded, 40);
    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.providers.force_submit.calls(), 0);
}

#[test]
fn setup_signals_before_start_are_ignored() {
    let mut h = Harness::new(MonitorConfig::default());

    h.send(MonitorEvent::CameraReady, 0);
    h.send(MonitorEvent::ModelLoaded, 10);
    h.send(
        MonitorEvent::SetupFailed(CapabilityError::CameraDenied("NotAllowedError".into())),
        20,
    );

    assert_eq!(h.monitor.state(), MonitorState::AwaitingStart);
    assert!(!h.monitor.session().camera_ready);
    assert!(!h.monitor.session().model_loaded);
    assert_eq!(h.monitor.capture_attempts(), 0);
    assert_eq!(h.monitor.next_deadline(), None);
    assert_eq!(h.count(TelemetryEventType::SetupFailed), 0);
    assert_eq!(h.providers.force_submit.calls(), 0);
}

// ---------------------------------------------------------------------------
// Face presence
// ---------------------------------------------------------------------------

#[test]
fn missing_face_past_grace_forces_submission() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.providers.inference.set_face_count(0);
    h.run(0, 16_000);

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    assert_eq!(
        h.monitor.session().critical_message.as_deref(),
        Some("No face detected in camera feed. persisted for 15s.")
    );
    assert_eq!(h.providers.force_submit.calls(), 1);
    assert_eq!(h.count(TelemetryEventType::GraceExpired), 1);
    assert_eq!(h.count(TelemetryEventType::GraceTick), 14);
}

#[test]
fn face_returning_within_grace_recovers() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.providers.inference.set_face_count(0);
    h.run(0, 10_000);
    assert_eq!(
        h.monitor.state(),
        MonitorState::GracePeriod {
            kind: ViolationKind::NoFace
        }
    );
    assert!(h.monitor.status().countdown_secs.is_some());

    h.providers.inference.set_face_count(1);
    h.run(10_000, 30_000);

    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.providers.force_submit.calls(), 0);
    assert_eq!(h.monitor.escalation().count(ViolationKind::NoFace), 0);
    assert_eq!(h.count(TelemetryEventType::GraceCleared), 1);
    assert_eq!(h.count(TelemetryEventType::CriticalError), 0);
}

#[test]
fn second_face_replaces_missing_face_grace() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.providers.inference.set_face_count(0);
    h.run(0, 5_000);
    h.providers.inference.set_face_count(2);
    h.run(5_000, 6_000);

    assert_eq!(
        h.monitor.state(),
        MonitorState::GracePeriod {
            kind: ViolationKind::MultipleFaces
        }
    );
    let grace = h.monitor.grace().primary().cloned().expect("grace running");
    assert_eq!(grace.duration_secs, 15);
    assert!(grace.remaining_secs >= 14);
}

#[test]
fn failing_inference_counts_as_missing_face() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.providers.inference.fail_estimates(true);
    h.run(0, 120_000);

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    assert_eq!(
        h.monitor.session().critical_message.as_deref(),
        Some("No face detected in camera feed. persisted for 15s.")
    );
    assert_eq!(h.providers.force_submit.calls(), 1);
    assert_eq!(h.count(TelemetryEventType::InferenceFailed), 1);
    assert_eq!(h.count(TelemetryEventType::GraceStarted), 1);
}

#[test]
fn inference_recovering_within_grace_clears_it() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.providers.inference.fail_estimates(true);
    h.run(0, 3_000);
    assert_eq!(
        h.monitor.state(),
        MonitorState::GracePeriod {
            kind: ViolationKind::NoFace
        }
    );

    h.providers.inference.fail_estimates(false);
    h.run(3_000, 30_000);
    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.providers.force_submit.calls(), 0);
}

#[test]
fn short_inference_outage_keeps_last_face_count() {
    let mut config = MonitorConfig::default();
    config.detection.sample_failure_limit = 50;
    let mut h = Harness::new(config);
    h.activate();

    h.providers.inference.fail_estimates(true);
    h.run(0, 2_000);
    h.providers.inference.fail_estimates(false);
    h.run(2_000, 3_000);

    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.count(TelemetryEventType::GraceStarted), 0);
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

#[test]
fn fourth_fullscreen_exit_skips_grace() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    for i in 0..3u64 {
        let t = 1_000 + i * 10_000;
        h.send(MonitorEvent::FullscreenChanged { engaged: false }, t);
        assert_eq!(
            h.monitor.state(),
            MonitorState::GracePeriod {
                kind: ViolationKind::FullscreenExit
            }
        );
        h.send(MonitorEvent::FullscreenChanged { engaged: true }, t + 2_000);
        assert_eq!(h.monitor.state(), MonitorState::Active);
    }
    let opened_before = h.count(TelemetryEventType::GraceStarted);
    assert_eq!(opened_before, 3);

    h.send(MonitorEvent::FullscreenChanged { engaged: false }, 40_000);

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    assert_eq!(h.providers.force_submit.calls(), 1);
    assert_eq!(h.count(TelemetryEventType::GraceStarted), opened_before);
    assert_eq!(h.monitor.status().countdown_secs, None);
    let message = h.monitor.session().critical_message.clone().unwrap_or_default();
    assert!(message.contains("Fullscreen exit limit exceeded"), "got {message}");
    assert!(message.contains("4 occurrences"));
}

#[test]
fn tab_switch_within_grace_counts_once() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.send(MonitorEvent::VisibilityChanged { visible: false }, 5_000);
    h.run(5_000, 12_000);
    h.send(MonitorEvent::VisibilityChanged { visible: true }, 12_000);

    assert_eq!(h.monitor.escalation().count(ViolationKind::TabSwitch), 1);
    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.count(TelemetryEventType::ViolationRecorded), 1);
    assert_eq!(h.count(TelemetryEventType::GraceCleared), 1);
    assert_eq!(h.count(TelemetryEventType::GraceExpired), 0);
}

#[test]
fn tab_hidden_past_grace_expires() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.send(MonitorEvent::VisibilityChanged { visible: false }, 5_000);
    h.run(5_000, 16_000);

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    assert_eq!(
        h.monitor.session().critical_message.as_deref(),
        Some("Exam tab is not visible. persisted for 10s. Tab switch violations: 1 of 3.")
    );
}

#[test]
fn fullscreen_grace_expiry_cites_budget() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.send(MonitorEvent::FullscreenChanged { engaged: false }, 1_000);
    h.run(1_000, 32_000);

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    let message = h.monitor.session().critical_message.clone().unwrap_or_default();
    assert!(message.starts_with("Fullscreen mode"), "got {message}");
    assert!(message.ends_with("Fullscreen exit violations: 1 of 3."), "got {message}");
}

#[test]
fn budgets_are_independent() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    for i in 0..3u64 {
        let t = 1_000 + i * 5_000;
        h.send(MonitorEvent::FullscreenChanged { engaged: false }, t);
        h.send(MonitorEvent::FullscreenChanged { engaged: true }, t + 1_000);
    }
    h.send(MonitorEvent::VisibilityChanged { visible: false }, 20_000);

    assert_eq!(
        h.monitor.state(),
        MonitorState::GracePeriod {
            kind: ViolationKind::TabSwitch
        }
    );
    assert_eq!(
        h.monitor.status().notice.as_deref(),
        Some("2 of 3 warnings remaining.")
    );
}

#[test]
fn clipboard_attempts_exhaust_their_own_budget() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    for i in 0..3u64 {
        h.send(MonitorEvent::ClipboardAttempt(ClipboardAction::Copy), 1_000 + i * 100);
    }
    assert!(h.monitor.grace().is_running(ViolationKind::ClipboardAttempt));
    assert_eq!(
        h.monitor.status().notice.as_deref(),
        Some("0 of 3 warnings remaining.")
    );

    h.send(MonitorEvent::ClipboardAttempt(ClipboardAction::Paste), 2_000);
    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    assert_eq!(h.count(TelemetryEventType::ClipboardBlocked), 4);
}

// ---------------------------------------------------------------------------
// Camera feed
// ---------------------------------------------------------------------------

#[test]
fn reacquired_camera_drops_stale_tamper_signal() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.providers.camera.pause(true);
    h.send(MonitorEvent::FrameTick, 100);
    assert_eq!(
        h.monitor.state(),
        MonitorState::GracePeriod {
            kind: ViolationKind::WebcamTamper
        }
    );

    h.send(
        MonitorEvent::SetupFailed(CapabilityError::FrameUnavailable("track ended".into())),
        200,
    );
    assert_eq!(
        h.monitor.state(),
        MonitorState::GracePeriod {
            kind: ViolationKind::CameraUnavailable
        }
    );

    h.providers.camera.pause(false);
    h.send(MonitorEvent::CameraReady, 300);
    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert!(!h.monitor.grace().is_running(ViolationKind::WebcamTamper));

    h.run(300, 2_000);
    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.providers.force_submit.calls(), 0);
}

// ---------------------------------------------------------------------------
// Photo capture
// ---------------------------------------------------------------------------

#[test]
fn capture_runs_on_interval_through_grace() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();

    h.run(0, 115_000);
    h.providers.inference.set_face_count(0);
    h.run(115_000, 120_000);
    assert_eq!(
        h.monitor.state(),
        MonitorState::GracePeriod {
            kind: ViolationKind::NoFace
        }
    );
    assert_eq!(h.monitor.capture_attempts(), 3);

    h.providers.inference.set_face_count(1);
    h.run(120_000, 185_000);

    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.monitor.capture_attempts(), 4);
    assert_eq!(h.uploads_queued(), 4);
    assert_eq!(h.count(TelemetryEventType::PhotoCaptured), 4);
    assert_eq!(h.providers.force_submit.calls(), 0);
}

#[test]
fn capture_stops_on_critical_error() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();
    h.providers.inference.set_face_count(0);
    h.run(0, 20_000);
    assert_eq!(h.monitor.state(), MonitorState::CriticalError);

    h.monitor.advance(300_000);
    assert_eq!(h.monitor.capture_attempts(), 1);
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

#[test]
fn events_after_termination_are_ignored() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();
    h.providers.inference.set_face_count(0);
    h.run(0, 16_000);
    let before = h.drain().len();

    h.send(MonitorEvent::FullscreenChanged { engaged: false }, 17_000);
    h.send(MonitorEvent::FrameTick, 17_100);
    h.send(MonitorEvent::Submitted, 18_000);

    assert_eq!(h.monitor.state(), MonitorState::CriticalError);
    assert_eq!(h.drain().len(), before);
    assert_eq!(h.providers.force_submit.calls(), 1);
}

#[test]
fn extended_display_is_informational() {
    let mut h = Harness::new(MonitorConfig::default());
    h.activate();
    h.send(MonitorEvent::ScreenConfiguration { extended: true }, 1_000);
    h.send(MonitorEvent::ScreenConfiguration { extended: true }, 2_000);

    assert_eq!(h.monitor.state(), MonitorState::Active);
    assert_eq!(h.count(TelemetryEventType::MultipleMonitorsDetected), 1);
}
