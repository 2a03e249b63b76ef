//! Mock seed data backing guest mode.
//!
//! Guest mode never touches the gateway; these fixtures play the role of
//! the remote rows, with timestamps relative to process time so the chat
//! list reads naturally.

use crate::gateway::{
    CallDirection, CallRecord, CallStatus, CallType, Conversation, Message, Profile,
};
use chrono::{Duration, Utc};

pub const GUEST_USER_ID: &str = "guest";

pub fn guest_profile() -> Profile {
    Profile {
        id: GUEST_USER_ID.to_string(),
        full_name: "Guest User".to_string(),
        username: "guest".to_string(),
        avatar_url: Some("https://api.dicebear.com/7.x/avataaars/svg?seed=guest".to_string()),
    }
}

pub fn seed_users() -> Vec<Profile> {
    let avatar = |seed: &str| {
        Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={seed}"
        ))
    };

    vec![
        Profile {
            id: "1".to_string(),
            full_name: "Jane Cooper".to_string(),
            username: "jane_cooper".to_string(),
            avatar_url: avatar("Jane"),
        },
        Profile {
            id: "2".to_string(),
            full_name: "Jenny Wilson".to_string(),
            username: "jenny_wilson".to_string(),
            avatar_url: avatar("Jenny"),
        },
        Profile {
            id: "3".to_string(),
            full_name: "Bessie Cooper".to_string(),
            username: "bessie_cooper".to_string(),
            avatar_url: avatar("Bessie"),
        },
        Profile {
            id: "4".to_string(),
            full_name: "Guy Hawkins".to_string(),
            username: "guy_hawkins".to_string(),
            avatar_url: avatar("Guy"),
        },
        Profile {
            id: "5".to_string(),
            full_name: "Ralph Edwards".to_string(),
            username: "ralph_edwards".to_string(),
            avatar_url: avatar("Ralph"),
        },
    ]
}

pub fn seed_conversations() -> Vec<Conversation> {
    let users = seed_users();
    let now = Utc::now();
    let ages_minutes = [30i64, 60, 120, 300, 1440];

    users
        .into_iter()
        .zip(ages_minutes)
        .enumerate()
        .map(|(i, (participant, age))| Conversation {
            id: format!("conv-{}", i + 1),
            updated_at: now - Duration::minutes(age),
            participant,
        })
        .collect()
}

/// Past calls shown on the guest calls list, newest first.
pub fn seed_call_history() -> Vec<CallRecord> {
    let users = seed_users();
    let now = Utc::now();

    let record = |id: &str,
                  participant: &Profile,
                  call_type: CallType,
                  duration: u64,
                  status: CallStatus,
                  direction: CallDirection,
                  minutes_ago: i64| {
        CallRecord {
            id: id.to_string(),
            user_id: GUEST_USER_ID.to_string(),
            other_participant_name: participant.full_name.clone(),
            other_participant_avatar: participant.avatar_url.clone(),
            call_type,
            duration,
            status,
            direction,
            created_at: now - Duration::minutes(minutes_ago),
        }
    };

    vec![
        record(
            "call-1",
            &users[0],
            CallType::Video,
            154,
            CallStatus::Completed,
            CallDirection::Incoming,
            120,
        ),
        record(
            "call-2",
            &users[1],
            CallType::Audio,
            47,
            CallStatus::Completed,
            CallDirection::Outgoing,
            210,
        ),
        record(
            "call-3",
            &users[2],
            CallType::Audio,
            0,
            CallStatus::Missed,
            CallDirection::Incoming,
            1320,
        ),
        record(
            "call-4",
            &users[3],
            CallType::Video,
            312,
            CallStatus::Completed,
            CallDirection::Outgoing,
            1920,
        ),
    ]
}

pub fn seed_messages(conversation_id: &str) -> Vec<Message> {
    let users = seed_users();
    let now = Utc::now();
    let guest = guest_profile();

    let message = |id: &str, conversation_id: &str, sender: &Profile, content: &str, minutes_ago: i64| {
        Message {
            id: id.to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender.id.clone(),
            content: content.to_string(),
            created_at: now - Duration::minutes(minutes_ago),
            sender: sender.clone(),
        }
    };

    match conversation_id {
        "conv-1" => vec![
            message("msg-1", "conv-1", &users[0], "Hello! How are you doing today?", 35),
            message("msg-2", "conv-1", &guest, "Hi! I'm doing great, thanks for asking!", 32),
            message(
                "msg-3",
                "conv-1",
                &users[0],
                "That's wonderful! Don't forget to check out all the features in the app.",
                30,
            ),
        ],
        "conv-2" => vec![
            message("msg-4", "conv-2", &users[1], "Hi there! Nice to meet you", 70),
            message("msg-5", "conv-2", &guest, "Nice to meet you too!", 65),
            message(
                "msg-6",
                "conv-2",
                &users[1],
                "This is a sample conversation to show how the chat works!",
                60,
            ),
        ],
        "conv-3" => vec![message("msg-7", "conv-3", &users[2], "How are you, my friend?", 120)],
        "conv-4" => vec![message("msg-8", "conv-4", &users[3], "Where are you right now?", 300)],
        "conv-5" => vec![message(
            "msg-9",
            "conv-5",
            &users[4],
            "Hello, I'm looking forward to chatting with you!",
            1440,
        )],
        _ => Vec::new(),
    }
}
