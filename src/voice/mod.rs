//! Voice capture and transcription
//!
//! Records a voice message from the microphone, exposes elapsed time and a
//! 40-bucket waveform while recording, and turns the finished blob into
//! text via the gateway's voice-to-text function.

mod levels;
mod recorder;

pub use levels::{amplitude_buckets, LEVEL_BUCKETS};
pub use recorder::{VoiceRecorder, VoiceState};
