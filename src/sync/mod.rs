//! Conversation sync
//!
//! Fetches a conversation's message history and keeps it live via one
//! change-feed subscription per active conversation. Guest mode swaps the
//! gateway for a local mock-seeded store.

mod guest;
pub mod seed;
mod sync;

pub use guest::GuestConversations;
pub use sync::ConversationSync;
