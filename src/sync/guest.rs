use super::seed;
use crate::gateway::{Conversation, Message};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Guest-mode conversation store.
///
/// Messages live in transient local memory, merged with the mock seed and
/// sorted by creation time on every read. No gateway call and no
/// subscription exists on this path.
pub struct GuestConversations {
    local: RwLock<HashMap<String, Vec<Message>>>,
}

impl GuestConversations {
    pub fn new() -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
        }
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        seed::seed_conversations()
    }

    /// Seed messages merged with locally sent ones, ascending by creation
    /// time regardless of insertion order.
    pub async fn messages(&self, conversation_id: &str) -> Vec<Message> {
        let mut messages = seed::seed_messages(conversation_id);
        if let Some(local) = self.local.read().await.get(conversation_id) {
            messages.extend(local.iter().cloned());
        }
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        messages
    }

    /// Append a guest message; it only ever exists in this process.
    pub async fn send(&self, conversation_id: &str, content: &str) -> Message {
        let message = Message {
            id: format!("guest-msg-{}", uuid::Uuid::new_v4()),
            conversation_id: conversation_id.to_string(),
            sender_id: seed::GUEST_USER_ID.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            sender: seed::guest_profile(),
        };

        self.local
            .write()
            .await
            .entry(conversation_id.to_string())
            .or_default()
            .push(message.clone());

        message
    }
}

impl Default for GuestConversations {
    fn default() -> Self {
        Self::new()
    }
}
