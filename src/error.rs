use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// One variant per failure domain; the HTTP surface maps these onto
/// status codes and every controller propagates them with `?`.
#[derive(Debug, Error)]
pub enum Error {
    /// Camera/microphone permission denied or device missing
    #[error("media access error: {0}")]
    MediaAccess(String),

    #[error("peer connection error: {0}")]
    PeerConnection(String),

    #[error("screen share error: {0}")]
    ScreenShare(String),

    /// Remote data gateway request failed
    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this failure aborts the call attempt. Media and peer
    /// failures do; everything else leaves the call running.
    pub fn is_fatal_to_call(&self) -> bool {
        matches!(self, Error::MediaAccess(_) | Error::PeerConnection(_))
    }
}
