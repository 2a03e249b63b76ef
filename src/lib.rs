pub mod call;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod media;
pub mod sync;
pub mod voice;

pub use call::{CallConfig, CallSession, CallState, CallStatusReport, PeerConnection};
pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{
    CallDirection, CallRecord, CallRecordUpdate, CallStatus, CallType, ChangeEvent, ChangeKind,
    Conversation, Gateway, Message, NatsGateway, NewCallRecord, NewMessage, Profile,
};
pub use http::{create_router, AppState, CallSettings};
pub use media::{AudioFrame, MediaConstraints, MediaDevices, MediaStream, MediaTrack, SimulatedDevices};
pub use sync::{ConversationSync, GuestConversations};
pub use voice::{VoiceRecorder, VoiceState, LEVEL_BUCKETS};
