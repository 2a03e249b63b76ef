mod common;

use common::MemoryGateway;
use parley::{Error, SimulatedDevices, VoiceRecorder, VoiceState, LEVEL_BUCKETS};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

async fn recorder() -> (Arc<VoiceRecorder>, Arc<MemoryGateway>) {
    let gateway = Arc::new(MemoryGateway::new("user-1"));
    let devices = Arc::new(SimulatedDevices::default());
    let rec = VoiceRecorder::start(devices, gateway.clone())
        .await
        .expect("start recording");
    (rec, gateway)
}

#[tokio::test(start_paused = true)]
async fn recording_tracks_elapsed_time_and_levels() {
    let (rec, _) = recorder().await;
    assert_eq!(rec.state().await, VoiceState::Recording);

    tokio::time::sleep(Duration::from_millis(3050)).await;

    assert_eq!(rec.elapsed_secs(), 3);
    let levels = rec.levels().await;
    assert_eq!(levels.len(), LEVEL_BUCKETS);
    assert!(levels.iter().any(|&l| l > 0.0), "tone should register");
    assert!(levels.iter().all(|&l| (0.0..=1.0).contains(&l)));

    rec.cancel().await;
}

#[tokio::test(start_paused = true)]
async fn stop_finalizes_wav_and_releases_microphone() {
    let (rec, _) = recorder().await;
    tokio::time::sleep(Duration::from_millis(1050)).await;

    rec.stop().await.expect("stop");

    assert_eq!(rec.state().await, VoiceState::Stopped);
    assert!(rec.microphone_released().await);

    let blob = rec.blob().await.expect("wav blob");
    assert_eq!(&blob[0..4], b"RIFF");
    assert_eq!(&blob[8..12], b"WAVE");
    assert!(blob.len() > 44, "payload beyond the header");

    // Stop again is a no-op
    rec.stop().await.expect("stop twice");
    assert_eq!(rec.state().await, VoiceState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn send_transcribes_the_stopped_recording() {
    let (rec, _) = recorder().await;
    tokio::time::sleep(Duration::from_millis(550)).await;
    rec.stop().await.expect("stop");

    let text = rec.send().await.expect("send");
    assert_eq!(text, "hello world");
    assert_eq!(rec.state().await, VoiceState::Sent);
}

#[tokio::test(start_paused = true)]
async fn send_while_recording_is_rejected() {
    let (rec, _) = recorder().await;

    let err = rec.send().await.expect_err("nothing finalized yet");
    assert!(matches!(err, Error::Transcription(_)));
    assert_eq!(rec.state().await, VoiceState::Recording);

    rec.cancel().await;
}

#[tokio::test(start_paused = true)]
async fn failed_transcription_keeps_blob_for_retry() {
    let (rec, gateway) = recorder().await;
    tokio::time::sleep(Duration::from_millis(550)).await;
    rec.stop().await.expect("stop");

    gateway.fail_transcription.store(true, Ordering::SeqCst);
    let err = rec.send().await.expect_err("transcription down");
    assert!(matches!(err, Error::Transcription(_)));
    assert_eq!(rec.state().await, VoiceState::Stopped);
    assert!(rec.blob().await.is_some(), "blob survives the failure");

    gateway.fail_transcription.store(false, Ordering::SeqCst);
    let text = rec.send().await.expect("retry");
    assert_eq!(text, "hello world");
    assert_eq!(rec.state().await, VoiceState::Sent);
}

#[tokio::test(start_paused = true)]
async fn cancel_discards_everything_while_recording() {
    let (rec, gateway) = recorder().await;
    tokio::time::sleep(Duration::from_millis(1050)).await;

    rec.cancel().await;

    assert_eq!(rec.state().await, VoiceState::Cancelled);
    assert!(rec.microphone_released().await);
    assert!(rec.blob().await.is_none());
    assert!(gateway.messages.lock().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_after_stop_discards_the_blob() {
    let (rec, _) = recorder().await;
    tokio::time::sleep(Duration::from_millis(550)).await;
    rec.stop().await.expect("stop");
    assert!(rec.blob().await.is_some());

    rec.cancel().await;

    assert_eq!(rec.state().await, VoiceState::Cancelled);
    assert!(rec.blob().await.is_none());

    // A cancelled recording can never be sent
    assert!(rec.send().await.is_err());
    assert_eq!(rec.state().await, VoiceState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_failed_send_discards_the_blob() {
    let (rec, gateway) = recorder().await;
    tokio::time::sleep(Duration::from_millis(550)).await;
    rec.stop().await.expect("stop");

    gateway.fail_transcription.store(true, Ordering::SeqCst);
    rec.send().await.expect_err("transcription down");

    rec.cancel().await;
    assert_eq!(rec.state().await, VoiceState::Cancelled);
    assert!(rec.blob().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn denied_microphone_never_starts_a_recorder() {
    let gateway = Arc::new(MemoryGateway::new("user-1"));
    let devices = Arc::new(SimulatedDevices::default());
    devices.deny_capture();

    let err = VoiceRecorder::start(devices, gateway)
        .await
        .expect_err("mic denied");
    assert!(matches!(err, Error::MediaAccess(_)));
}
