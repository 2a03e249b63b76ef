use super::subjects;
use super::types::{
    AuthUser, CallRecord, CallRecordUpdate, ChangeEvent, Conversation, Message, NewCallRecord,
    NewMessage, TranscribeRequest, TranscribeResponse,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Stream of row-change notifications for one conversation.
///
/// Dropping the stream releases the underlying subscription.
pub type ChangeFeed = BoxStream<'static, ChangeEvent>;

/// Remote data gateway: row storage, auth identity, change feeds, and the
/// voice-to-text function endpoint. The hosted backend is an external
/// collaborator; this trait is the seam the controllers talk through.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Identity of the authenticated user for this session
    async fn current_user_id(&self) -> Result<String>;

    /// Messages for one conversation, joined with minimal sender profiles,
    /// ordered ascending by creation time
    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    async fn send_message(&self, new: NewMessage) -> Result<Message>;

    /// Conversations for a user, each with the other participant attached
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>>;

    async fn create_call_record(&self, new: NewCallRecord) -> Result<CallRecord>;

    async fn update_call_record(&self, id: &str, update: CallRecordUpdate) -> Result<CallRecord>;

    /// The user's call_history rows, ordered descending by creation time
    async fn list_call_history(&self, user_id: &str) -> Result<Vec<CallRecord>>;

    /// Invoke the remote transcription function on base64-encoded audio
    async fn transcribe(&self, audio_base64: &str) -> Result<String>;

    /// Open the insert/update/delete feed for one conversation's messages
    async fn subscribe_message_changes(&self, conversation_id: &str) -> Result<ChangeFeed>;
}

#[derive(Serialize)]
struct MessagesQuery<'a> {
    conversation_id: &'a str,
}

#[derive(Serialize)]
struct ConversationsQuery<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct CallHistoryQuery<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct CallRecordUpdateRequest<'a> {
    id: &'a str,
    #[serde(flatten)]
    update: CallRecordUpdate,
}

#[derive(Serialize, Deserialize)]
struct Empty {}

/// Gateway client over NATS request/reply and subscriptions
pub struct NatsGateway {
    client: async_nats::Client,
    user_id: Mutex<Option<String>>,
}

impl NatsGateway {
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to gateway at {}", url);

        let client = async_nats::connect(url)
            .await
            .map_err(|e| Error::Gateway(format!("failed to connect to {url}: {e}")))?;

        info!("Connected to gateway");

        Ok(Self {
            client,
            user_id: Mutex::new(None),
        })
    }

    async fn request<T: Serialize, R: DeserializeOwned>(&self, subject: &str, body: &T) -> Result<R> {
        let payload =
            serde_json::to_vec(body).map_err(|e| Error::Gateway(format!("encode request: {e}")))?;

        let reply = self
            .client
            .request(subject.to_string(), payload.into())
            .await
            .map_err(|e| Error::Gateway(format!("{subject}: {e}")))?;

        serde_json::from_slice(&reply.payload)
            .map_err(|e| Error::Gateway(format!("{subject}: bad reply: {e}")))
    }
}

#[async_trait]
impl Gateway for NatsGateway {
    async fn current_user_id(&self) -> Result<String> {
        let mut cached = self.user_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let user: AuthUser = self.request(subjects::AUTH_USER, &Empty {}).await?;
        *cached = Some(user.id.clone());
        Ok(user.id)
    }

    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.request(subjects::MESSAGES_SELECT, &MessagesQuery { conversation_id })
            .await
    }

    async fn send_message(&self, new: NewMessage) -> Result<Message> {
        self.request(subjects::MESSAGES_INSERT, &new).await
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        self.request(subjects::CONVERSATIONS_SELECT, &ConversationsQuery { user_id })
            .await
    }

    async fn create_call_record(&self, new: NewCallRecord) -> Result<CallRecord> {
        self.request(subjects::CALL_HISTORY_INSERT, &new).await
    }

    async fn update_call_record(&self, id: &str, update: CallRecordUpdate) -> Result<CallRecord> {
        self.request(
            subjects::CALL_HISTORY_UPDATE,
            &CallRecordUpdateRequest { id, update },
        )
        .await
    }

    async fn list_call_history(&self, user_id: &str) -> Result<Vec<CallRecord>> {
        self.request(subjects::CALL_HISTORY_SELECT, &CallHistoryQuery { user_id })
            .await
    }

    async fn transcribe(&self, audio_base64: &str) -> Result<String> {
        let response: TranscribeResponse = self
            .request(
                subjects::VOICE_TO_TEXT,
                &TranscribeRequest {
                    audio: audio_base64.to_string(),
                },
            )
            .await
            .map_err(|e| Error::Transcription(e.to_string()))?;

        Ok(response.text)
    }

    async fn subscribe_message_changes(&self, conversation_id: &str) -> Result<ChangeFeed> {
        let subject = subjects::message_changes(conversation_id);

        info!("Subscribing to {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| Error::Gateway(format!("{subject}: {e}")))?;

        let feed = subscriber
            .filter_map(|msg| async move {
                match serde_json::from_slice::<ChangeEvent>(&msg.payload) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        warn!("Dropping malformed change event: {}", e);
                        None
                    }
                }
            })
            .boxed();

        Ok(feed)
    }
}
