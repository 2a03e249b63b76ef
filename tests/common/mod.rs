#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parley::error::{Error, Result};
use parley::gateway::{
    CallRecord, CallRecordUpdate, ChangeEvent, ChangeFeed, ChangeKind, Conversation, Gateway,
    Message, NewCallRecord, NewMessage, Profile,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Mutex};

pub fn profile(id: &str, name: &str) -> Profile {
    Profile {
        id: id.to_string(),
        full_name: name.to_string(),
        username: name.to_lowercase().replace(' ', "_"),
        avatar_url: None,
    }
}

pub fn message(
    id: &str,
    conversation_id: &str,
    sender: &Profile,
    content: &str,
    created_at: DateTime<Utc>,
) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        sender_id: sender.id.clone(),
        content: content.to_string(),
        created_at,
        sender: sender.clone(),
    }
}

/// In-memory gateway standing in for the hosted backend. Inserts notify
/// any open change feeds, mirroring the real per-conversation channel.
pub struct MemoryGateway {
    pub user_id: String,
    pub messages: Mutex<Vec<Message>>,
    pub conversations: Mutex<Vec<Conversation>>,
    pub call_records: Mutex<Vec<CallRecord>>,
    /// Every attempted call-record update, in order
    pub record_updates: Mutex<Vec<(String, CallRecordUpdate)>>,
    pub fail_record_update: AtomicBool,
    pub fail_transcription: AtomicBool,
    pub transcript: Mutex<String>,
    feeds: Mutex<Vec<(String, mpsc::UnboundedSender<ChangeEvent>)>>,
}

impl MemoryGateway {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            messages: Mutex::new(Vec::new()),
            conversations: Mutex::new(Vec::new()),
            call_records: Mutex::new(Vec::new()),
            record_updates: Mutex::new(Vec::new()),
            fail_record_update: AtomicBool::new(false),
            fail_transcription: AtomicBool::new(false),
            transcript: Mutex::new("hello world".to_string()),
            feeds: Mutex::new(Vec::new()),
        }
    }

    async fn notify_insert(&self, conversation_id: &str) {
        let event = ChangeEvent {
            table: "messages".to_string(),
            event: ChangeKind::Insert,
            conversation_id: conversation_id.to_string(),
        };
        self.feeds.lock().await.retain(|(conv, tx)| {
            conv != conversation_id || tx.send(event.clone()).is_ok()
        });
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn current_user_id(&self) -> Result<String> {
        Ok(self.user_id.clone())
    }

    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .messages
            .lock()
            .await
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn send_message(&self, new: NewMessage) -> Result<Message> {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: new.conversation_id.clone(),
            sender_id: new.sender_id.clone(),
            content: new.content,
            created_at: Utc::now(),
            sender: profile(&new.sender_id, &new.sender_id),
        };

        self.messages.lock().await.push(message.clone());
        self.notify_insert(&new.conversation_id).await;

        Ok(message)
    }

    async fn list_conversations(&self, _user_id: &str) -> Result<Vec<Conversation>> {
        Ok(self.conversations.lock().await.clone())
    }

    async fn create_call_record(&self, new: NewCallRecord) -> Result<CallRecord> {
        let record = CallRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            other_participant_name: new.other_participant_name,
            other_participant_avatar: new.other_participant_avatar,
            call_type: new.call_type,
            duration: new.duration,
            status: new.status,
            direction: new.direction,
            created_at: Utc::now(),
        };

        self.call_records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update_call_record(&self, id: &str, update: CallRecordUpdate) -> Result<CallRecord> {
        self.record_updates
            .lock()
            .await
            .push((id.to_string(), update.clone()));

        if self.fail_record_update.load(Ordering::SeqCst) {
            return Err(Error::Gateway("call_history update failed".to_string()));
        }

        let mut records = self.call_records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::Gateway(format!("call record {id} not found")))?;

        record.duration = update.duration;
        record.status = update.status;
        Ok(record.clone())
    }

    async fn list_call_history(&self, user_id: &str) -> Result<Vec<CallRecord>> {
        let mut records: Vec<CallRecord> = self
            .call_records
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn transcribe(&self, _audio_base64: &str) -> Result<String> {
        if self.fail_transcription.load(Ordering::SeqCst) {
            return Err(Error::Transcription(
                "voice-to-text function failed".to_string(),
            ));
        }
        Ok(self.transcript.lock().await.clone())
    }

    async fn subscribe_message_changes(&self, conversation_id: &str) -> Result<ChangeFeed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds
            .lock()
            .await
            .push((conversation_id.to_string(), tx));

        let feed = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed();

        Ok(feed)
    }
}

/// Assert messages are ascending by creation time
pub fn assert_chronological(messages: &[Message]) {
    for pair in messages.windows(2) {
        assert!(
            pair[0].created_at <= pair[1].created_at,
            "messages out of order: {} after {}",
            pair[0].id,
            pair[1].id
        );
    }
}
