use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal sender profile joined onto messages and conversations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// A conversation as seen by one user: the other participant is attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    pub participant: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Audio,
    Video,
}

impl CallType {
    /// Deep-link `type` parameter; anything unrecognized falls back to audio.
    pub fn from_param(value: &str) -> Self {
        match value {
            "video" => CallType::Video,
            _ => CallType::Audio,
        }
    }

    pub fn wants_video(self) -> bool {
        matches!(self, CallType::Video)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Completed,
    Missed,
    Rejected,
    Ongoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

/// One row of the call_history table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub user_id: String,
    pub other_participant_name: String,
    pub other_participant_avatar: Option<String>,
    pub call_type: CallType,
    /// Final duration in seconds; 0 while the call is ongoing
    pub duration: u64,
    pub status: CallStatus,
    pub direction: CallDirection,
    pub created_at: DateTime<Utc>,
}

/// Insert shape: the gateway assigns id, user_id, and created_at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCallRecord {
    pub other_participant_name: String,
    pub other_participant_avatar: Option<String>,
    pub call_type: CallType,
    pub duration: u64,
    pub status: CallStatus,
    pub direction: CallDirection,
}

/// The single mutation a call session performs at end-of-call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecordUpdate {
    pub duration: u64,
    pub status: CallStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Row-change notification from the gateway's per-conversation feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub event: ChangeKind,
    pub conversation_id: String,
}

/// Identity issued by the gateway's auth subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
}

/// Remote function invocation: { audio: base64 } -> { text }
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub audio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}
