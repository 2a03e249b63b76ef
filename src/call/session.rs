use super::config::CallConfig;
use super::peer::PeerConnection;
use crate::error::{Error, Result};
use crate::gateway::{
    CallDirection, CallRecordUpdate, CallStatus, CallType, Gateway, NewCallRecord,
};
use crate::media::{MediaDevices, MediaStream, MediaTrack};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lifecycle of one outgoing call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    Idle,
    Initializing,
    Connected,
    Ended,
}

/// Snapshot returned to the control surface
#[derive(Debug, Clone, Serialize)]
pub struct CallStatusReport {
    pub id: String,
    pub peer_name: String,
    pub call_type: CallType,
    pub state: CallState,
    pub duration_secs: u64,
    pub muted: bool,
    pub video_off: bool,
    pub speaker_off: bool,
    pub screen_sharing: bool,
    pub has_remote_stream: bool,
}

/// One outgoing call session.
///
/// Owns the local stream, the screen-share track, and the peer connection
/// for the lifetime of the call screen; `end` releases all of them and
/// performs the single call-record update. `end` is safe under double
/// invocation: the explicit end-call action and the teardown path may both
/// run, and at most one record update is issued.
pub struct CallSession {
    id: String,
    config: CallConfig,
    gateway: Arc<dyn Gateway>,
    devices: Arc<dyn MediaDevices>,

    state_tx: watch::Sender<CallState>,

    local_stream: Mutex<Option<Arc<MediaStream>>>,
    screen_track: Mutex<Option<Arc<MediaTrack>>>,
    peer: Mutex<Option<Arc<PeerConnection>>>,

    /// Assigned call_history row id, taken exactly once at end-of-call
    record_id: Mutex<Option<String>>,

    muted: AtomicBool,
    video_off: AtomicBool,
    speaker_off: AtomicBool,
    screen_sharing: AtomicBool,

    /// One-second tick from session start, read once by the end update
    duration_secs: AtomicU64,

    ended: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CallSession {
    pub fn new(
        config: CallConfig,
        gateway: Arc<dyn Gateway>,
        devices: Arc<dyn MediaDevices>,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(CallState::Idle);
        let video_off = !config.call_type.wants_video();

        Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            gateway,
            devices,
            state_tx,
            local_stream: Mutex::new(None),
            screen_track: Mutex::new(None),
            peer: Mutex::new(None),
            record_id: Mutex::new(None),
            muted: AtomicBool::new(false),
            video_off: AtomicBool::new(video_off),
            speaker_off: AtomicBool::new(false),
            screen_sharing: AtomicBool::new(false),
            duration_secs: AtomicU64::new(0),
            ended: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> CallState {
        *self.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<CallState> {
        self.state_tx.subscribe()
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs.load(Ordering::SeqCst)
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen_sharing.load(Ordering::SeqCst)
    }

    pub async fn local_stream(&self) -> Option<Arc<MediaStream>> {
        self.local_stream.lock().await.clone()
    }

    pub async fn peer(&self) -> Option<Arc<PeerConnection>> {
        self.peer.lock().await.clone()
    }

    /// Acquire media, set up the peer connection, and log the call record.
    ///
    /// A `MediaAccess` failure here is fatal to the call attempt: the
    /// caller surfaces the error and exits the call screen. A failed
    /// record insert is reported and the call proceeds without one.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        info!(
            "Starting {:?} call to {} (session {})",
            self.config.call_type, self.config.peer_name, self.id
        );

        self.transition(CallState::Initializing);

        let stream = Arc::new(
            self.devices
                .acquire(self.config.call_type.wants_video())
                .await?,
        );

        let pc = Arc::new(PeerConnection::new(&self.config.ice_servers));
        for track in stream.audio_tracks() {
            pc.add_track(track.clone()).await?;
        }
        if let Some(video) = stream.video_track().await {
            pc.add_track(video).await?;
        }

        *self.local_stream.lock().await = Some(stream);
        *self.peer.lock().await = Some(pc);

        match self
            .gateway
            .create_call_record(NewCallRecord {
                other_participant_name: self.config.peer_name.clone(),
                other_participant_avatar: self.config.peer_avatar.clone(),
                call_type: self.config.call_type,
                duration: 0,
                status: CallStatus::Ongoing,
                direction: CallDirection::Outgoing,
            })
            .await
        {
            Ok(record) => {
                *self.record_id.lock().await = Some(record.id);
            }
            Err(e) => warn!("Failed to save call record: {}", e),
        }

        // No signaling exchange exists; the delay stands in for the
        // offer/answer acknowledgment.
        let session = Arc::clone(self);
        let connect = tokio::spawn(async move {
            tokio::time::sleep(session.config.connect_delay).await;
            if !session.ended.load(Ordering::SeqCst) {
                session.transition(CallState::Connected);
            }
        });

        let session = Arc::clone(self);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                if session.ended.load(Ordering::SeqCst) {
                    break;
                }
                session.duration_secs.fetch_add(1, Ordering::SeqCst);
            }
        });

        self.tasks.lock().await.extend([connect, ticker]);

        Ok(())
    }

    /// Flip the audio tracks' enabled flag. Local and reversible; the
    /// peer connection is untouched. Returns the new muted state.
    pub async fn toggle_mute(&self) -> bool {
        let muted = !self.muted.fetch_xor(true, Ordering::SeqCst);
        if let Some(stream) = self.local_stream.lock().await.as_ref() {
            for track in stream.audio_tracks() {
                track.set_enabled(!muted);
            }
        }
        muted
    }

    /// Flip the video track's enabled flag. Returns the new video-off state.
    pub async fn toggle_video(&self) -> bool {
        let video_off = !self.video_off.fetch_xor(true, Ordering::SeqCst);
        if let Some(stream) = self.local_stream.lock().await.as_ref() {
            if let Some(video) = stream.video_track().await {
                video.set_enabled(!video_off);
            }
        }
        video_off
    }

    /// UI-only output routing flag. Returns the new speaker-off state.
    pub fn toggle_speaker(&self) -> bool {
        !self.speaker_off.fetch_xor(true, Ordering::SeqCst)
    }

    /// Toggle screen sharing; returns the new sharing state. Failure in
    /// either direction is a `ScreenShare` error and leaves the call
    /// otherwise unaffected.
    pub async fn toggle_screen_share(self: &Arc<Self>) -> Result<bool> {
        if self.screen_sharing.load(Ordering::SeqCst) {
            self.stop_screen_share().await?;
            Ok(false)
        } else {
            self.start_screen_share().await?;
            Ok(true)
        }
    }

    async fn start_screen_share(self: &Arc<Self>) -> Result<()> {
        let display = self
            .devices
            .acquire_display()
            .await
            .map_err(|e| Error::ScreenShare(e.to_string()))?;

        {
            let peer = self.peer.lock().await;
            let pc = peer
                .as_ref()
                .ok_or_else(|| Error::ScreenShare("no active peer connection".to_string()))?;
            pc.replace_video_track(display.clone())
                .await
                .map_err(|e| Error::ScreenShare(e.to_string()))?;
        }

        // Swap the local preview and release the camera it was holding
        if let Some(stream) = self.local_stream.lock().await.as_ref() {
            if let Some(old) = stream.swap_video_track(display.clone()).await {
                old.stop();
            }
        }

        *self.screen_track.lock().await = Some(display.clone());
        self.screen_sharing.store(true, Ordering::SeqCst);

        // The user can end the capture from browser chrome; fall back to
        // the camera automatically when that happens.
        let session = Arc::clone(self);
        let mut ended_rx = display.ended();
        let watcher = tokio::spawn(async move {
            if ended_rx.changed().await.is_err() || !*ended_rx.borrow() {
                return;
            }
            if session.ended.load(Ordering::SeqCst) {
                return;
            }
            if let Err(e) = session.stop_screen_share().await {
                warn!("Failed to restore camera after screen share ended: {}", e);
            }
        });
        self.tasks.lock().await.push(watcher);

        info!("Screen sharing started (session {})", self.id);
        Ok(())
    }

    async fn stop_screen_share(&self) -> Result<()> {
        if !self.screen_sharing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(screen) = self.screen_track.lock().await.take() {
            screen.stop();
        }

        let camera = self
            .devices
            .acquire_camera()
            .await
            .map_err(|e| Error::ScreenShare(format!("failed to re-acquire camera: {e}")))?;
        camera.set_enabled(!self.video_off.load(Ordering::SeqCst));

        {
            let peer = self.peer.lock().await;
            let pc = peer
                .as_ref()
                .ok_or_else(|| Error::ScreenShare("no active peer connection".to_string()))?;
            pc.replace_video_track(camera.clone())
                .await
                .map_err(|e| Error::ScreenShare(e.to_string()))?;
        }

        if let Some(stream) = self.local_stream.lock().await.as_ref() {
            stream.swap_video_track(camera).await;
        }

        info!("Screen sharing stopped (session {})", self.id);
        Ok(())
    }

    /// Tear the session down: stop local and screen tracks, close the
    /// peer connection, and issue the single end-of-call record update.
    /// Safe to call more than once; every call after the first is a no-op.
    pub async fn end(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Ending call session {}", self.id);
        self.transition(CallState::Ended);

        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }

        if let Some(screen) = self.screen_track.lock().await.take() {
            screen.stop();
        }
        if let Some(stream) = self.local_stream.lock().await.take() {
            stream.stop_all().await;
        }
        if let Some(pc) = self.peer.lock().await.take() {
            pc.close();
        }

        // record_id is taken, so a racing teardown cannot update twice
        if let Some(record_id) = self.record_id.lock().await.take() {
            let duration = self.duration_secs.load(Ordering::SeqCst);
            if let Err(e) = self
                .gateway
                .update_call_record(
                    &record_id,
                    CallRecordUpdate {
                        duration,
                        status: CallStatus::Completed,
                    },
                )
                .await
            {
                warn!("Failed to update call record {}: {}", record_id, e);
            }
        }
    }

    pub async fn status(&self) -> CallStatusReport {
        let has_remote_stream = match self.peer.lock().await.as_ref() {
            Some(pc) => pc.remote_track().await.is_some(),
            None => false,
        };

        CallStatusReport {
            id: self.id.clone(),
            peer_name: self.config.peer_name.clone(),
            call_type: self.config.call_type,
            state: self.state(),
            duration_secs: self.duration_secs(),
            muted: self.muted.load(Ordering::SeqCst),
            video_off: self.video_off.load(Ordering::SeqCst),
            speaker_off: self.speaker_off.load(Ordering::SeqCst),
            screen_sharing: self.is_screen_sharing(),
            has_remote_stream,
        }
    }

    fn transition(&self, next: CallState) {
        self.state_tx.send_if_modified(|state| {
            if *state == next || *state == CallState::Ended {
                return false;
            }
            info!("Call {}: {:?} -> {:?}", self.id, state, next);
            *state = next;
            true
        });
    }
}
