//! HTTP control surface
//!
//! The REST edge that plays the part of the UI: it mounts/unmounts call
//! screens, opens and closes conversations, and drives voice recording.
//! - POST /calls/start?type=&name=&avatar= - mount a call screen
//! - POST /calls/:id/{mute,video,speaker,screen-share} - toggles
//! - POST /calls/:id/end, DELETE /calls/:id - teardown
//! - GET/POST /conversations/:id/messages - read and send
//! - POST /voice/start ... - voice message flow
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, CallSettings, SessionContext};
