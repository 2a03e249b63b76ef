use crate::error::Result;
use crate::gateway::{ChangeKind, Gateway, Message, NewMessage};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Live message cache for one conversation.
///
/// The initial fetch populates the cache; a single subscription on the
/// conversation's change feed triggers a full refetch on every insert.
/// Refetching instead of merging keeps ordering authoritative at the cost
/// of redundant reads. Closing (or dropping) the sync releases the
/// subscription; at most one exists per conversation id.
pub struct ConversationSync {
    conversation_id: String,
    gateway: Arc<dyn Gateway>,
    messages: Arc<RwLock<Vec<Message>>>,
    revision_tx: Arc<watch::Sender<u64>>,
    feed_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationSync {
    pub async fn open(gateway: Arc<dyn Gateway>, conversation_id: &str) -> Result<Self> {
        let messages = Arc::new(RwLock::new(Vec::new()));
        let (revision_tx, _) = watch::channel(0u64);
        let revision_tx = Arc::new(revision_tx);

        refetch(&gateway, conversation_id, &messages, &revision_tx).await?;

        let mut feed = gateway.subscribe_message_changes(conversation_id).await?;

        let task = tokio::spawn({
            let gateway = Arc::clone(&gateway);
            let messages = Arc::clone(&messages);
            let revision_tx = Arc::clone(&revision_tx);
            let conversation_id = conversation_id.to_string();
            async move {
                while let Some(event) = feed.next().await {
                    if event.event != ChangeKind::Insert {
                        continue;
                    }
                    if let Err(e) =
                        refetch(&gateway, &conversation_id, &messages, &revision_tx).await
                    {
                        warn!("Refetch for {} failed: {}", conversation_id, e);
                    }
                }
            }
        });

        info!("Conversation sync open: {}", conversation_id);

        Ok(Self {
            conversation_id: conversation_id.to_string(),
            gateway,
            messages,
            revision_tx,
            feed_task: Mutex::new(Some(task)),
        })
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Current cached messages, ascending by creation time
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Bumps once per completed refetch; lets consumers await updates
    pub fn revision(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    /// Insert a message through the gateway. The cache updates via the
    /// change feed, not here.
    pub async fn send(&self, sender_id: &str, content: &str) -> Result<Message> {
        self.gateway
            .send_message(NewMessage {
                conversation_id: self.conversation_id.clone(),
                sender_id: sender_id.to_string(),
                content: content.to_string(),
            })
            .await
    }

    /// Drop the subscription. Idempotent; also runs on drop.
    pub fn close(&self) {
        if let Ok(mut guard) = self.feed_task.lock() {
            if let Some(task) = guard.take() {
                task.abort();
                info!("Conversation sync closed: {}", self.conversation_id);
            }
        }
    }
}

impl Drop for ConversationSync {
    fn drop(&mut self) {
        self.close();
    }
}

async fn refetch(
    gateway: &Arc<dyn Gateway>,
    conversation_id: &str,
    messages: &Arc<RwLock<Vec<Message>>>,
    revision_tx: &Arc<watch::Sender<u64>>,
) -> Result<()> {
    let mut fetched = gateway.fetch_messages(conversation_id).await?;

    // The gateway orders ascending already; re-sort anyway so display
    // order never depends on arrival order.
    fetched.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    *messages.write().await = fetched;
    revision_tx.send_modify(|rev| *rev += 1);

    Ok(())
}
