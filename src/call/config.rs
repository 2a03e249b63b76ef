use crate::gateway::CallType;
use std::time::Duration;

/// Configuration for one outgoing call, built from the deep-link
/// parameters (`type`, `name`, `avatar`) and the configured ICE servers.
#[derive(Debug, Clone)]
pub struct CallConfig {
    pub call_type: CallType,
    pub peer_name: String,
    pub peer_avatar: Option<String>,

    /// STUN endpoints only; no TURN relay is configured
    pub ice_servers: Vec<String>,

    /// Stand-in for the signaling acknowledgment. There is no offer/answer
    /// exchange in this system; a real one replaces this delay.
    pub connect_delay: Duration,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            call_type: CallType::Audio,
            peer_name: "Unknown".to_string(),
            peer_avatar: None,
            ice_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
            ],
            connect_delay: Duration::from_secs(2),
        }
    }
}
