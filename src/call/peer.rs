use crate::error::{Error, Result};
use crate::media::{MediaTrack, TrackKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Outbound track slot on the peer connection; screen share replaces the
/// video sender's track in place.
pub struct TrackSender {
    kind: TrackKind,
    track: Mutex<Arc<MediaTrack>>,
}

impl TrackSender {
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub async fn track(&self) -> Arc<MediaTrack> {
        self.track.lock().await.clone()
    }

    pub async fn replace_track(&self, new: Arc<MediaTrack>) {
        *self.track.lock().await = new;
    }
}

/// Direct transport session between the two call participants.
///
/// ICE candidates are logged, never transmitted: there is no signaling
/// channel in this system, so negotiation stops at candidate gathering.
/// At most one peer connection exists per call session.
pub struct PeerConnection {
    id: String,
    ice_servers: Vec<String>,
    senders: Mutex<Vec<Arc<TrackSender>>>,
    remote_track: Mutex<Option<Arc<MediaTrack>>>,
    closed: AtomicBool,
}

impl PeerConnection {
    pub fn new(ice_servers: &[String]) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        info!(
            "Created peer connection {} (ICE servers: {:?})",
            id, ice_servers
        );

        Self {
            id,
            ice_servers: ice_servers.to_vec(),
            senders: Mutex::new(Vec::new()),
            remote_track: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ice_servers(&self) -> &[String] {
        &self.ice_servers
    }

    /// Attach an outbound track. Candidate gathering for the new
    /// transceiver is logged here; a signaling transport would forward it.
    pub async fn add_track(&self, track: Arc<MediaTrack>) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::PeerConnection(
                "cannot add track to closed connection".to_string(),
            ));
        }

        debug!(
            "Peer {}: local ICE candidate gathered for {:?} track {} (not transmitted)",
            self.id,
            track.kind(),
            track.id()
        );

        self.senders.lock().await.push(Arc::new(TrackSender {
            kind: track.kind(),
            track: Mutex::new(track),
        }));

        Ok(())
    }

    /// The sender carrying outbound video, if any
    pub async fn video_sender(&self) -> Option<Arc<TrackSender>> {
        self.senders
            .lock()
            .await
            .iter()
            .find(|s| s.kind() == TrackKind::Video)
            .cloned()
    }

    /// Replace the outbound video track (screen-share on/off).
    pub async fn replace_video_track(&self, new: Arc<MediaTrack>) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::PeerConnection("connection is closed".to_string()));
        }

        let sender = self.video_sender().await.ok_or_else(|| {
            Error::PeerConnection("no outbound video sender on this call".to_string())
        })?;

        sender.replace_track(new).await;
        Ok(())
    }

    /// Remote track arrival; driven by a signaling layer, which this
    /// system does not have, so in practice this stays empty.
    pub async fn set_remote_track(&self, track: Arc<MediaTrack>) {
        info!("Peer {}: received remote {:?} track", self.id, track.kind());
        *self.remote_track.lock().await = Some(track);
    }

    pub async fn remote_track(&self) -> Option<Arc<MediaTrack>> {
        self.remote_track.lock().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Peer connection {} closed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TrackSource;

    #[tokio::test]
    async fn replace_video_track_swaps_sender() {
        let pc = PeerConnection::new(&["stun:stun.example.org:3478".to_string()]);
        let cam = MediaTrack::new(TrackKind::Video, TrackSource::Camera);
        pc.add_track(cam.clone()).await.expect("add track");

        let screen = MediaTrack::new(TrackKind::Video, TrackSource::Display);
        pc.replace_video_track(screen.clone()).await.expect("replace");

        let sender = pc.video_sender().await.expect("video sender");
        assert_eq!(sender.track().await.id(), screen.id());
    }

    #[tokio::test]
    async fn replace_without_video_sender_fails() {
        let pc = PeerConnection::new(&[]);
        let mic = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone);
        pc.add_track(mic).await.expect("add track");

        let screen = MediaTrack::new(TrackKind::Video, TrackSource::Display);
        let err = pc.replace_video_track(screen).await.unwrap_err();
        assert!(matches!(err, Error::PeerConnection(_)));
    }

    #[tokio::test]
    async fn closed_connection_rejects_tracks() {
        let pc = PeerConnection::new(&[]);
        pc.close();
        pc.close();

        let mic = MediaTrack::new(TrackKind::Audio, TrackSource::Microphone);
        assert!(pc.add_track(mic).await.is_err());
        assert!(pc.is_closed());
    }
}
