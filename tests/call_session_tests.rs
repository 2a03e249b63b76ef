mod common;

use common::MemoryGateway;
use parley::gateway::{CallDirection, CallStatus, CallType};
use parley::media::TrackSource;
use parley::{CallConfig, CallSession, CallState, SimulatedDevices};
use std::sync::Arc;
use std::time::Duration;

fn call_config(call_type: CallType) -> CallConfig {
    CallConfig {
        call_type,
        peer_name: "Sarah Connor".to_string(),
        connect_delay: Duration::from_secs(2),
        ..CallConfig::default()
    }
}

fn session_with(
    call_type: CallType,
) -> (Arc<CallSession>, Arc<MemoryGateway>, Arc<SimulatedDevices>) {
    let gateway = Arc::new(MemoryGateway::new("user-1"));
    let devices = Arc::new(SimulatedDevices::default());
    let session = CallSession::new(call_config(call_type), gateway.clone(), devices.clone());
    (session, gateway, devices)
}

#[tokio::test(start_paused = true)]
async fn audio_call_scenario_creates_connects_and_completes() {
    let (session, gateway, _) = session_with(CallType::Audio);
    session.start().await.expect("start");

    // Call record logged at start: ongoing, outgoing, audio
    {
        let records = gateway.call_records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, CallStatus::Ongoing);
        assert_eq!(records[0].direction, CallDirection::Outgoing);
        assert_eq!(records[0].call_type, CallType::Audio);
        assert_eq!(records[0].other_participant_name, "Sarah Connor");
        assert_eq!(records[0].duration, 0);
    }

    // Still connecting before the simulated signaling ack
    assert_eq!(session.state(), CallState::Initializing);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(session.state(), CallState::Connected);

    // End after ten ticks total
    tokio::time::sleep(Duration::from_millis(8000)).await;
    assert_eq!(session.duration_secs(), 10);

    session.end().await;

    let updates = gateway.record_updates.lock().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1.duration, 10);
    assert_eq!(updates[0].1.status, CallStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn ending_twice_updates_the_record_once() {
    let (session, gateway, _) = session_with(CallType::Audio);
    session.start().await.expect("start");

    tokio::time::sleep(Duration::from_millis(3100)).await;

    // Explicit end-call and teardown cleanup may both run
    session.end().await;
    session.end().await;

    let updates = gateway.record_updates.lock().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1.duration, 3);
}

#[tokio::test(start_paused = true)]
async fn concurrent_end_paths_update_once() {
    let (session, gateway, _) = session_with(CallType::Video);
    session.start().await.expect("start");

    tokio::join!(session.end(), session.end());

    assert_eq!(gateway.record_updates.lock().await.len(), 1);
    assert_eq!(session.state(), CallState::Ended);
}

#[tokio::test(start_paused = true)]
async fn end_releases_stream_and_peer() {
    let (session, _, _) = session_with(CallType::Video);
    session.start().await.expect("start");

    let stream = session.local_stream().await.expect("local stream");
    let mic = stream.audio_tracks()[0].clone();
    let camera = stream.video_track().await.expect("camera track");
    let peer = session.peer().await.expect("peer connection");

    session.end().await;

    assert!(mic.is_stopped());
    assert!(camera.is_stopped());
    assert!(peer.is_closed());
    assert!(session.local_stream().await.is_none());
    assert!(session.peer().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn mute_round_trip_restores_track_enabled() {
    let (session, _, _) = session_with(CallType::Audio);
    session.start().await.expect("start");

    let stream = session.local_stream().await.expect("local stream");
    let mic = stream.audio_tracks()[0].clone();
    assert!(mic.is_enabled());

    assert!(session.toggle_mute().await);
    assert!(!mic.is_enabled());

    assert!(!session.toggle_mute().await);
    assert!(mic.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn video_toggle_flips_camera_track() {
    let (session, _, _) = session_with(CallType::Video);
    session.start().await.expect("start");

    let stream = session.local_stream().await.expect("local stream");
    let camera = stream.video_track().await.expect("camera track");

    assert!(session.toggle_video().await);
    assert!(!camera.is_enabled());
    assert!(!session.toggle_video().await);
    assert!(camera.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn denied_media_access_is_fatal_to_the_call() {
    let gateway = Arc::new(MemoryGateway::new("user-1"));
    let devices = Arc::new(SimulatedDevices::default());
    devices.deny_capture();

    let session = CallSession::new(call_config(CallType::Video), gateway.clone(), devices);
    let err = session.start().await.expect_err("media denied");

    assert!(err.is_fatal_to_call());
    // No record was captured, so teardown must not issue an update
    session.end().await;
    assert!(gateway.record_updates.lock().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn screen_share_replaces_and_restores_video_track() {
    let (session, _, _) = session_with(CallType::Video);
    session.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert!(session.toggle_screen_share().await.expect("share on"));
    assert!(session.is_screen_sharing());

    let stream = session.local_stream().await.expect("local stream");
    let sharing = stream.video_track().await.expect("video track");
    assert_eq!(sharing.source(), TrackSource::Display);

    let peer = session.peer().await.expect("peer");
    let sender = peer.video_sender().await.expect("video sender");
    assert_eq!(sender.track().await.source(), TrackSource::Display);

    assert!(!session.toggle_screen_share().await.expect("share off"));
    assert!(!session.is_screen_sharing());

    let restored = stream.video_track().await.expect("video track");
    assert_eq!(restored.source(), TrackSource::Camera);
    assert_eq!(sender.track().await.source(), TrackSource::Camera);
}

#[tokio::test(start_paused = true)]
async fn browser_stop_sharing_falls_back_to_camera() {
    let (session, _, _) = session_with(CallType::Video);
    session.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(2100)).await;

    session.toggle_screen_share().await.expect("share on");
    let stream = session.local_stream().await.expect("local stream");
    let sharing = stream.video_track().await.expect("video track");
    assert_eq!(sharing.source(), TrackSource::Display);

    // The user hits the browser's stop-sharing control
    sharing.end();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!session.is_screen_sharing());
    let restored = stream.video_track().await.expect("video track");
    assert_eq!(restored.source(), TrackSource::Camera);

    // The call is unaffected
    assert_eq!(session.state(), CallState::Connected);
}

#[tokio::test(start_paused = true)]
async fn denied_display_capture_leaves_call_running() {
    let (session, _, devices) = session_with(CallType::Video);
    session.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(2100)).await;

    devices.deny_display();

    let err = session.toggle_screen_share().await.expect_err("share denied");
    assert!(!err.is_fatal_to_call());
    assert!(!session.is_screen_sharing());
    assert_eq!(session.state(), CallState::Connected);

    // The camera is still the outbound video track
    let peer = session.peer().await.expect("peer");
    let sender = peer.video_sender().await.expect("video sender");
    assert_eq!(sender.track().await.source(), TrackSource::Camera);
}

#[tokio::test(start_paused = true)]
async fn audio_call_has_no_video_sender_to_share_to() {
    let (session, _, _) = session_with(CallType::Audio);
    session.start().await.expect("start");
    tokio::time::sleep(Duration::from_millis(2100)).await;

    // Screen share needs an outbound video sender; an audio call has none
    assert!(session.toggle_screen_share().await.is_err());
    assert_eq!(session.state(), CallState::Connected);
}

#[tokio::test(start_paused = true)]
async fn failed_record_update_still_tears_down() {
    let (session, gateway, _) = session_with(CallType::Audio);
    session.start().await.expect("start");
    gateway
        .fail_record_update
        .store(true, std::sync::atomic::Ordering::SeqCst);

    session.end().await;
    session.end().await;

    // Reported once, never retried into a duplicate
    assert_eq!(gateway.record_updates.lock().await.len(), 1);
    assert_eq!(session.state(), CallState::Ended);
}

#[tokio::test(start_paused = true)]
async fn ending_before_connect_never_reaches_connected() {
    let (session, _, _) = session_with(CallType::Audio);
    session.start().await.expect("start");

    tokio::time::sleep(Duration::from_millis(500)).await;
    session.end().await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(session.state(), CallState::Ended);
}
