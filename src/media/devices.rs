use super::stream::{MediaStream, MediaTrack, TrackKind, TrackSource};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Captured audio samples (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Fixed capture profile for every acquisition
#[derive(Debug, Clone)]
pub struct MediaConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// Platform seam for camera/microphone/display capture.
///
/// The real devices belong to the platform; implementations negotiate
/// access and hand back owned tracks. Denied permission or a missing
/// device surfaces as `Error::MediaAccess`, which the caller must treat
/// as fatal to the call attempt rather than retry silently.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Microphone always, camera only when `wants_video` is set.
    async fn acquire(&self, wants_video: bool) -> Result<MediaStream>;

    async fn acquire_camera(&self) -> Result<Arc<MediaTrack>>;

    /// Display capture for screen sharing (video only, no audio)
    async fn acquire_display(&self) -> Result<Arc<MediaTrack>>;

    /// Begin pulling PCM frames off an audio track. Capture ends when the
    /// track is stopped or the receiver is dropped.
    async fn capture_audio(&self, track: Arc<MediaTrack>) -> Result<mpsc::Receiver<AudioFrame>>;
}

/// In-process device layer used by the binary and the tests.
///
/// There is no signaling peer in this system, so captured media never
/// leaves the process; tracks are synthesized and audio frames carry a
/// generated tone so amplitude display has something to show. Access can
/// be denied to exercise the permission-failure paths.
pub struct SimulatedDevices {
    constraints: MediaConstraints,
    allow_capture: AtomicBool,
    allow_display: AtomicBool,
}

impl SimulatedDevices {
    pub fn new(constraints: MediaConstraints) -> Self {
        Self {
            constraints,
            allow_capture: AtomicBool::new(true),
            allow_display: AtomicBool::new(true),
        }
    }

    /// Simulate the user denying camera/microphone permission.
    pub fn deny_capture(&self) {
        self.allow_capture.store(false, Ordering::SeqCst);
    }

    /// Simulate the user denying display capture.
    pub fn deny_display(&self) {
        self.allow_display.store(false, Ordering::SeqCst);
    }

    pub fn constraints(&self) -> &MediaConstraints {
        &self.constraints
    }
}

impl Default for SimulatedDevices {
    fn default() -> Self {
        Self::new(MediaConstraints::default())
    }
}

const CAPTURE_SAMPLE_RATE: u32 = 16_000;
const CAPTURE_FRAME_MS: u64 = 100;

#[async_trait]
impl MediaDevices for SimulatedDevices {
    async fn acquire(&self, wants_video: bool) -> Result<MediaStream> {
        if !self.allow_capture.load(Ordering::SeqCst) {
            return Err(Error::MediaAccess(
                "microphone/camera permission denied".to_string(),
            ));
        }

        info!(
            "Acquired local stream (video={}, {}x{} ideal)",
            wants_video, self.constraints.ideal_width, self.constraints.ideal_height
        );

        let mic = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone);
        let camera = wants_video.then(|| MediaTrack::new(TrackKind::Video, TrackSource::Camera));

        Ok(MediaStream::new(vec![mic], camera))
    }

    async fn acquire_camera(&self) -> Result<Arc<MediaTrack>> {
        if !self.allow_capture.load(Ordering::SeqCst) {
            return Err(Error::MediaAccess("camera permission denied".to_string()));
        }

        Ok(MediaTrack::new(TrackKind::Video, TrackSource::Camera))
    }

    async fn acquire_display(&self) -> Result<Arc<MediaTrack>> {
        if !self.allow_display.load(Ordering::SeqCst) {
            return Err(Error::MediaAccess(
                "display capture permission denied".to_string(),
            ));
        }

        Ok(MediaTrack::new(TrackKind::Video, TrackSource::Display))
    }

    async fn capture_audio(&self, track: Arc<MediaTrack>) -> Result<mpsc::Receiver<AudioFrame>> {
        if track.kind() != TrackKind::Audio {
            return Err(Error::MediaAccess(
                "capture requires an audio track".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let samples_per_frame =
                (CAPTURE_SAMPLE_RATE as u64 * CAPTURE_FRAME_MS / 1000) as usize;
            let mut interval =
                tokio::time::interval(std::time::Duration::from_millis(CAPTURE_FRAME_MS));
            interval.tick().await;

            let mut elapsed_ms = 0u64;
            let mut phase = 0usize;

            loop {
                interval.tick().await;
                if track.is_stopped() {
                    break;
                }

                // 440 Hz tone so the waveform buckets are non-zero
                let samples: Vec<i16> = (0..samples_per_frame)
                    .map(|i| {
                        let t = (phase + i) as f32 / CAPTURE_SAMPLE_RATE as f32;
                        ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16
                    })
                    .collect();
                phase += samples_per_frame;
                elapsed_ms += CAPTURE_FRAME_MS;

                let frame = AudioFrame {
                    samples,
                    sample_rate: CAPTURE_SAMPLE_RATE,
                    channels: 1,
                    timestamp_ms: elapsed_ms,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}
