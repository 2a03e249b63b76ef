use super::levels::{amplitude_buckets, LEVEL_BUCKETS};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::media::{MediaDevices, MediaStream};
use base64::Engine;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceState {
    Recording,
    Stopped,
    Transcribing,
    Sent,
    Cancelled,
}

/// One voice-message recording session.
///
/// Recording starts immediately on creation: microphone capture feeds an
/// accumulating sample buffer, a one-second timer tracks elapsed time, and
/// every frame refreshes the 40-bucket waveform. `stop` finalizes the
/// buffer into a WAV blob, `send` transcribes it remotely, and `cancel`
/// discards everything from any state — no partial message is ever sent.
pub struct VoiceRecorder {
    id: String,
    gateway: Arc<dyn Gateway>,

    state: Mutex<VoiceState>,
    mic: Mutex<Option<Arc<MediaStream>>>,

    samples: Arc<Mutex<Vec<i16>>>,
    sample_rate: Arc<AtomicU32>,
    levels: Arc<RwLock<Vec<f32>>>,
    elapsed_secs: Arc<AtomicU64>,

    /// Finalized WAV bytes, present from Stopped onward; retained across
    /// a failed transcription so Send can be retried without re-recording
    blob: Mutex<Option<Vec<u8>>>,

    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for VoiceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRecorder")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl VoiceRecorder {
    /// Request the microphone and begin recording.
    ///
    /// A `MediaAccess` failure means the recorder never starts; the caller
    /// dismisses the recording UI.
    pub async fn start(
        devices: Arc<dyn MediaDevices>,
        gateway: Arc<dyn Gateway>,
    ) -> Result<Arc<Self>> {
        let stream = Arc::new(devices.acquire(false).await?);
        let track = stream
            .audio_tracks()
            .first()
            .cloned()
            .ok_or_else(|| Error::MediaAccess("no microphone track".to_string()))?;

        let mut frames = devices.capture_audio(track).await?;

        let recorder = Arc::new(Self {
            id: uuid::Uuid::new_v4().to_string(),
            gateway,
            state: Mutex::new(VoiceState::Recording),
            mic: Mutex::new(Some(stream)),
            samples: Arc::new(Mutex::new(Vec::new())),
            sample_rate: Arc::new(AtomicU32::new(16_000)),
            levels: Arc::new(RwLock::new(vec![0.0; LEVEL_BUCKETS])),
            elapsed_secs: Arc::new(AtomicU64::new(0)),
            blob: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        });

        info!("Voice recording started ({})", recorder.id);

        // Capture + analyser loop
        let samples = Arc::clone(&recorder.samples);
        let sample_rate = Arc::clone(&recorder.sample_rate);
        let levels = Arc::clone(&recorder.levels);
        let capture = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                sample_rate.store(frame.sample_rate, Ordering::SeqCst);
                *levels.write().await = amplitude_buckets(&frame.samples, LEVEL_BUCKETS);
                samples.lock().await.extend(frame.samples);
            }
        });

        // Elapsed-seconds timer
        let elapsed = Arc::clone(&recorder.elapsed_secs);
        let timer = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        });

        recorder.tasks.lock().await.extend([capture, timer]);

        Ok(recorder)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn state(&self) -> VoiceState {
        *self.state.lock().await
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs.load(Ordering::SeqCst)
    }

    /// Latest waveform buckets (normalized 0..1)
    pub async fn levels(&self) -> Vec<f32> {
        self.levels.read().await.clone()
    }

    /// The finalized WAV blob, available after stop for local playback
    pub async fn blob(&self) -> Option<Vec<u8>> {
        self.blob.lock().await.clone()
    }

    /// True once the microphone stream has been stopped and dropped
    pub async fn microphone_released(&self) -> bool {
        self.mic.lock().await.is_none()
    }

    /// Finalize the recording into a single WAV blob and release the
    /// microphone. No-op outside the Recording state.
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state != VoiceState::Recording {
            return Ok(());
        }

        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        if let Some(stream) = self.mic.lock().await.take() {
            stream.stop_all().await;
        }

        let samples = self.samples.lock().await;
        let blob = encode_wav(&samples, self.sample_rate.load(Ordering::SeqCst))?;
        info!(
            "Voice recording stopped ({}): {} samples, {} bytes",
            self.id,
            samples.len(),
            blob.len()
        );

        *self.blob.lock().await = Some(blob);
        *state = VoiceState::Stopped;

        Ok(())
    }

    /// Transcribe the stopped recording and return the text to submit as
    /// a normal outgoing message. On failure the recorder returns to
    /// Stopped with the blob intact, so Send can simply be retried.
    pub async fn send(&self) -> Result<String> {
        {
            let mut state = self.state.lock().await;
            if *state != VoiceState::Stopped {
                return Err(Error::Transcription(format!(
                    "nothing to send in state {state:?}"
                )));
            }
            *state = VoiceState::Transcribing;
        }

        let blob = match self.blob.lock().await.clone() {
            Some(blob) => blob,
            None => {
                *self.state.lock().await = VoiceState::Stopped;
                return Err(Error::Transcription("no recording captured".to_string()));
            }
        };

        let audio = base64::engine::general_purpose::STANDARD.encode(&blob);

        match self.gateway.transcribe(&audio).await {
            Ok(text) => {
                let mut state = self.state.lock().await;
                if *state != VoiceState::Transcribing {
                    // Cancelled while the request was in flight
                    return Err(Error::Transcription(
                        "recording was cancelled".to_string(),
                    ));
                }
                *state = VoiceState::Sent;
                info!("Voice message transcribed ({})", self.id);
                Ok(text)
            }
            Err(e) => {
                let mut state = self.state.lock().await;
                if *state == VoiceState::Transcribing {
                    *state = VoiceState::Stopped;
                }
                Err(match e {
                    Error::Transcription(_) => e,
                    other => Error::Transcription(other.to_string()),
                })
            }
        }
    }

    /// Abort from any state: stop capture, release the microphone, and
    /// discard the buffer and blob.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        if *state == VoiceState::Cancelled {
            return;
        }

        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        if let Some(stream) = self.mic.lock().await.take() {
            stream.stop_all().await;
        }
        self.samples.lock().await.clear();
        *self.blob.lock().await = None;

        info!("Voice recording cancelled ({})", self.id);
        *state = VoiceState::Cancelled;
    }
}

fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Internal(format!("failed to create WAV writer: {e}")))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| Error::Internal(format!("failed to encode sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::Internal(format!("failed to finalize WAV blob: {e}")))?;
    }

    Ok(cursor.into_inner())
}
