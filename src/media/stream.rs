use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    Microphone,
    Camera,
    Display,
}

/// One captured media track.
///
/// `enabled` is the reversible mute/video-off flip; `stop` releases the
/// underlying device. The `ended` signal fires both on stop and when the
/// platform ends the track externally (browser-chrome "stop sharing").
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    source: TrackSource,
    enabled: AtomicBool,
    stopped: AtomicBool,
    ended_tx: watch::Sender<bool>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, source: TrackSource) -> Arc<Self> {
        let (ended_tx, _) = watch::channel(false);
        Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            source,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            ended_tx,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn source(&self) -> TrackSource {
        self.source
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Release the track and fire the `ended` signal.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!("Track {} ({:?}) stopped", self.id, self.source);
            let _ = self.ended_tx.send(true);
        }
    }

    /// External end of the track, e.g. the user stops sharing via browser
    /// chrome. The device is gone either way, so this also marks it stopped.
    pub fn end(&self) {
        self.stop();
    }

    /// Observe the `ended` signal; the receiver yields `true` once.
    pub fn ended(&self) -> watch::Receiver<bool> {
        self.ended_tx.subscribe()
    }
}

/// The local (or remote) stream owned by one call screen: a fixed set of
/// audio tracks plus a swappable video slot for the camera/screen dance.
pub struct MediaStream {
    audio: Vec<Arc<MediaTrack>>,
    video: Mutex<Option<Arc<MediaTrack>>>,
}

impl MediaStream {
    pub fn new(audio: Vec<Arc<MediaTrack>>, video: Option<Arc<MediaTrack>>) -> Self {
        Self {
            audio,
            video: Mutex::new(video),
        }
    }

    pub fn audio_tracks(&self) -> &[Arc<MediaTrack>] {
        &self.audio
    }

    pub async fn video_track(&self) -> Option<Arc<MediaTrack>> {
        self.video.lock().await.clone()
    }

    /// Swap the video slot, returning the previous track.
    pub async fn swap_video_track(&self, new: Arc<MediaTrack>) -> Option<Arc<MediaTrack>> {
        self.video.lock().await.replace(new)
    }

    /// Stop every track. Called exactly once on teardown; no component may
    /// retain a usable reference afterward.
    pub async fn stop_all(&self) {
        for track in &self.audio {
            track.stop();
        }
        if let Some(video) = self.video.lock().await.as_ref() {
            video.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enabled_flag_round_trips() {
        let track = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone);
        assert!(track.is_enabled());
        track.set_enabled(false);
        assert!(!track.is_enabled());
        track.set_enabled(true);
        assert!(track.is_enabled());
    }

    #[tokio::test]
    async fn stop_fires_ended_once() {
        let track = MediaTrack::new(TrackKind::Video, TrackSource::Display);
        let mut ended = track.ended();
        assert!(!*ended.borrow());

        track.stop();
        track.stop();

        ended.changed().await.expect("ended signal");
        assert!(*ended.borrow());
        assert!(track.is_stopped());
    }

    #[tokio::test]
    async fn stream_stops_swapped_in_video() {
        let mic = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone);
        let cam = MediaTrack::new(TrackKind::Video, TrackSource::Camera);
        let stream = MediaStream::new(vec![mic.clone()], Some(cam.clone()));

        let screen = MediaTrack::new(TrackKind::Video, TrackSource::Display);
        let old = stream.swap_video_track(screen.clone()).await;
        assert_eq!(old.as_deref().map(MediaTrack::id), Some(cam.id()));

        stream.stop_all().await;
        assert!(mic.is_stopped());
        assert!(screen.is_stopped());
    }
}
