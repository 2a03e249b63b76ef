//! Media acquisition
//!
//! Wraps camera/microphone/display negotiation into owned tracks and
//! streams. The `MediaDevices` trait is the platform seam; the simulated
//! implementation backs the binary and the tests.

pub mod devices;
pub mod stream;

pub use devices::{AudioFrame, MediaConstraints, MediaDevices, SimulatedDevices};
pub use stream::{MediaStream, MediaTrack, TrackKind, TrackSource};
