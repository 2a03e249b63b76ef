//! Subject layout for the remote data gateway.
//!
//! Row operations are request/reply subjects; the per-conversation change
//! feed is a plain subscription filtered server-side by conversation id.

pub const AUTH_USER: &str = "gateway.auth.user";
pub const MESSAGES_SELECT: &str = "gateway.messages.select";
pub const MESSAGES_INSERT: &str = "gateway.messages.insert";
pub const CONVERSATIONS_SELECT: &str = "gateway.conversations.select";
pub const CALL_HISTORY_SELECT: &str = "gateway.call_history.select";
pub const CALL_HISTORY_INSERT: &str = "gateway.call_history.insert";
pub const CALL_HISTORY_UPDATE: &str = "gateway.call_history.update";
pub const VOICE_TO_TEXT: &str = "gateway.fn.voice-to-text";

/// Insert/update/delete events for one conversation's messages
pub fn message_changes(conversation_id: &str) -> String {
    format!("gateway.changes.messages.{conversation_id}")
}
