//! Call session controller
//!
//! Owns the lifecycle of one outgoing call: media acquisition, the peer
//! connection, mute/video/speaker/screen-share toggles, the call-history
//! record, and guaranteed teardown.

mod config;
mod peer;
mod session;

pub use config::CallConfig;
pub use peer::{PeerConnection, TrackSender};
pub use session::{CallSession, CallState, CallStatusReport};
