use crate::call::CallSession;
use crate::gateway::Gateway;
use crate::media::MediaDevices;
use crate::sync::{ConversationSync, GuestConversations};
use crate::voice::VoiceRecorder;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Session-scoped context for the whole surface: the guest flag and the
/// currently selected conversation. Explicit state owned here, not
/// ambient globals.
pub struct SessionContext {
    pub guest: bool,
    pub selected_conversation: RwLock<Option<String>>,
}

/// Defaults applied to every new call session
#[derive(Clone)]
pub struct CallSettings {
    pub stun_servers: Vec<String>,
    pub connect_delay: Duration,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
            ],
            connect_delay: Duration::from_secs(2),
        }
    }
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    pub devices: Arc<dyn MediaDevices>,
    pub context: Arc<SessionContext>,
    pub call_settings: CallSettings,

    /// Active call sessions (call id → session)
    pub calls: Arc<RwLock<HashMap<String, Arc<CallSession>>>>,

    /// Open conversation syncs (conversation id → sync); at most one
    /// subscription per conversation id
    pub syncs: Arc<RwLock<HashMap<String, Arc<ConversationSync>>>>,

    /// Guest-mode conversation store
    pub guest_store: Arc<GuestConversations>,

    /// Active voice recorders (voice id → recorder)
    pub recorders: Arc<RwLock<HashMap<String, Arc<VoiceRecorder>>>>,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        devices: Arc<dyn MediaDevices>,
        guest: bool,
        call_settings: CallSettings,
    ) -> Self {
        Self {
            gateway,
            devices,
            context: Arc::new(SessionContext {
                guest,
                selected_conversation: RwLock::new(None),
            }),
            call_settings,
            calls: Arc::new(RwLock::new(HashMap::new())),
            syncs: Arc::new(RwLock::new(HashMap::new())),
            guest_store: Arc::new(GuestConversations::new()),
            recorders: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
