//! Remote data gateway client
//!
//! The hosted backend provides row storage (profiles, conversations,
//! messages, call_history), an auth identity, per-conversation change
//! feeds, and the voice-to-text function endpoint. This module holds the
//! typed records validated at that boundary, the `Gateway` trait, and the
//! NATS-backed client.

pub mod client;
pub mod subjects;
pub mod types;

pub use client::{ChangeFeed, Gateway, NatsGateway};
pub use types::{
    AuthUser, CallDirection, CallRecord, CallRecordUpdate, CallStatus, CallType, ChangeEvent,
    ChangeKind, Conversation, Message, NewCallRecord, NewMessage, Profile, TranscribeRequest,
    TranscribeResponse,
};
