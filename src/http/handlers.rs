use super::state::AppState;
use crate::call::{CallConfig, CallSession, CallState, CallStatusReport};
use crate::error::Error;
use crate::gateway::{CallType, Conversation, Message, NewMessage};
use crate::sync::{seed, ConversationSync};
use crate::voice::{VoiceRecorder, VoiceState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Call deep-link parameters: `type`, `name`, `avatar`
#[derive(Debug, Deserialize)]
pub struct StartCallParams {
    #[serde(rename = "type")]
    pub call_type: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartCallResponse {
    pub call_id: String,
    pub peer_name: String,
    pub state: CallState,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub call_id: String,
    pub control: &'static str,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct EndCallResponse {
    pub call_id: String,
    pub duration_secs: u64,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationMessagesResponse {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct CloseConversationResponse {
    pub conversation_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceStartResponse {
    pub voice_id: String,
    pub state: VoiceState,
}

#[derive(Debug, Serialize)]
pub struct VoiceStatusResponse {
    pub voice_id: String,
    pub state: VoiceState,
    pub elapsed_secs: u64,
    pub levels: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct VoiceSendResponse {
    pub voice_id: String,
    pub text: String,
    /// The forwarded message, when a conversation is selected
    pub message: Option<Message>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Every error is caught here and converted to a user-visible response;
/// nothing propagates into the serving layer.
fn error_response(e: Error) -> Response {
    let status = match &e {
        Error::MediaAccess(_) => StatusCode::FORBIDDEN,
        Error::Gateway(_) | Error::Transcription(_) => StatusCode::BAD_GATEWAY,
        Error::PeerConnection(_) | Error::ScreenShare(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    error!("{}", e);
    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

fn not_found(what: &str, id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{what} {id} not found"),
        }),
    )
        .into_response()
}

// ============================================================================
// Calls
// ============================================================================

/// POST /calls/start?type=audio|video&name=...&avatar=...
/// Mount the call screen: acquire media, set up the peer connection, log
/// the call record, and begin connecting.
pub async fn start_call(
    State(state): State<AppState>,
    Query(params): Query<StartCallParams>,
) -> impl IntoResponse {
    let call_type = CallType::from_param(params.call_type.as_deref().unwrap_or("audio"));
    let peer_name = params.name.unwrap_or_else(|| "Unknown".to_string());

    let config = CallConfig {
        call_type,
        peer_name: peer_name.clone(),
        peer_avatar: params.avatar,
        ice_servers: state.call_settings.stun_servers.clone(),
        connect_delay: state.call_settings.connect_delay,
    };

    let session = CallSession::new(config, Arc::clone(&state.gateway), Arc::clone(&state.devices));

    if let Err(e) = session.start().await {
        // Media/peer failures are fatal to the attempt: release whatever
        // was acquired and exit the call screen.
        session.end().await;
        return error_response(e);
    }

    let call_id = session.id().to_string();
    state.calls.write().await.insert(call_id.clone(), session.clone());

    info!("Call {} started ({} -> {:?})", call_id, peer_name, call_type);

    (
        StatusCode::OK,
        Json(StartCallResponse {
            call_id,
            peer_name,
            state: session.state(),
        }),
    )
        .into_response()
}

async fn find_call(state: &AppState, call_id: &str) -> Option<Arc<CallSession>> {
    state.calls.read().await.get(call_id).cloned()
}

/// POST /calls/:call_id/mute
pub async fn toggle_mute(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    match find_call(&state, &call_id).await {
        Some(session) => {
            let active = session.toggle_mute().await;
            Json(ToggleResponse {
                call_id,
                control: "mute",
                active,
            })
            .into_response()
        }
        None => not_found("Call", &call_id),
    }
}

/// POST /calls/:call_id/video
pub async fn toggle_video(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    match find_call(&state, &call_id).await {
        Some(session) => {
            let active = session.toggle_video().await;
            Json(ToggleResponse {
                call_id,
                control: "video_off",
                active,
            })
            .into_response()
        }
        None => not_found("Call", &call_id),
    }
}

/// POST /calls/:call_id/speaker
pub async fn toggle_speaker(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    match find_call(&state, &call_id).await {
        Some(session) => {
            let active = session.toggle_speaker();
            Json(ToggleResponse {
                call_id,
                control: "speaker_off",
                active,
            })
            .into_response()
        }
        None => not_found("Call", &call_id),
    }
}

/// POST /calls/:call_id/screen-share
pub async fn toggle_screen_share(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    match find_call(&state, &call_id).await {
        Some(session) => match session.toggle_screen_share().await {
            Ok(active) => Json(ToggleResponse {
                call_id,
                control: "screen_share",
                active,
            })
            .into_response(),
            // Non-fatal: the call keeps running
            Err(e) => error_response(e),
        },
        None => not_found("Call", &call_id),
    }
}

/// GET /calls/:call_id/status
pub async fn call_status(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    match find_call(&state, &call_id).await {
        Some(session) => {
            let report: CallStatusReport = session.status().await;
            Json(report).into_response()
        }
        None => not_found("Call", &call_id),
    }
}

/// POST /calls/:call_id/end (also DELETE /calls/:call_id — the teardown
/// path). Both funnel into the same idempotent end.
pub async fn end_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    let session = state.calls.write().await.remove(&call_id);

    match session {
        Some(session) => {
            session.end().await;
            Json(EndCallResponse {
                call_id,
                duration_secs: session.duration_secs(),
                status: "ended".to_string(),
            })
            .into_response()
        }
        None => not_found("Call", &call_id),
    }
}

/// GET /calls/history
/// The user's past calls, newest first. Guest mode answers from the seed.
pub async fn call_history(State(state): State<AppState>) -> impl IntoResponse {
    if state.context.guest {
        return Json(seed::seed_call_history()).into_response();
    }

    let user_id = match state.gateway.current_user_id().await {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    match state.gateway.list_call_history(&user_id).await {
        Ok(mut records) => {
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Json(records).into_response()
        }
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Conversations
// ============================================================================

/// GET /conversations
pub async fn list_conversations(State(state): State<AppState>) -> impl IntoResponse {
    if state.context.guest {
        let conversations: Vec<Conversation> = state.guest_store.conversations();
        return Json(conversations).into_response();
    }

    let user_id = match state.gateway.current_user_id().await {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    match state.gateway.list_conversations(&user_id).await {
        Ok(conversations) => Json(conversations).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /conversations/:conversation_id/open
/// Select the conversation and open its sync. Any sync for a different
/// conversation is closed first; re-opening the same id reuses it.
pub async fn open_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    *state.context.selected_conversation.write().await = Some(conversation_id.clone());

    if state.context.guest {
        let messages = state.guest_store.messages(&conversation_id).await;
        return Json(ConversationMessagesResponse {
            conversation_id,
            messages,
        })
        .into_response();
    }

    let mut syncs = state.syncs.write().await;
    if !syncs.contains_key(&conversation_id) {
        for (_, old) in syncs.drain() {
            old.close();
        }
        match ConversationSync::open(Arc::clone(&state.gateway), &conversation_id).await {
            Ok(sync) => {
                syncs.insert(conversation_id.clone(), Arc::new(sync));
            }
            Err(e) => return error_response(e),
        }
    }

    let messages = match syncs.get(&conversation_id) {
        Some(sync) => sync.messages().await,
        None => Vec::new(),
    };

    Json(ConversationMessagesResponse {
        conversation_id,
        messages,
    })
    .into_response()
}

/// GET /conversations/:conversation_id/messages
pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    if state.context.guest {
        let messages = state.guest_store.messages(&conversation_id).await;
        return Json(ConversationMessagesResponse {
            conversation_id,
            messages,
        })
        .into_response();
    }

    if let Some(sync) = state.syncs.read().await.get(&conversation_id) {
        let messages = sync.messages().await;
        return Json(ConversationMessagesResponse {
            conversation_id,
            messages,
        })
        .into_response();
    }

    // Not open: one-shot fetch, no subscription
    match state.gateway.fetch_messages(&conversation_id).await {
        Ok(mut messages) => {
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Json(ConversationMessagesResponse {
                conversation_id,
                messages,
            })
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /conversations/:conversation_id/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> impl IntoResponse {
    if req.content.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message content is empty".to_string(),
            }),
        )
            .into_response();
    }

    if state.context.guest {
        let message = state.guest_store.send(&conversation_id, &req.content).await;
        return Json(message).into_response();
    }

    let sender_id = match state.gateway.current_user_id().await {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };

    let result = match state.syncs.read().await.get(&conversation_id) {
        Some(sync) => sync.send(&sender_id, &req.content).await,
        None => {
            state
                .gateway
                .send_message(NewMessage {
                    conversation_id: conversation_id.clone(),
                    sender_id,
                    content: req.content.clone(),
                })
                .await
        }
    };

    match result {
        Ok(message) => Json(message).into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /conversations/:conversation_id
/// Navigate away: close the sync and clear the selection.
pub async fn close_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    if let Some(sync) = state.syncs.write().await.remove(&conversation_id) {
        sync.close();
    }

    let mut selected = state.context.selected_conversation.write().await;
    if selected.as_deref() == Some(conversation_id.as_str()) {
        *selected = None;
    }

    Json(CloseConversationResponse {
        conversation_id,
        status: "closed".to_string(),
    })
    .into_response()
}

// ============================================================================
// Voice messages
// ============================================================================

/// POST /voice/start
pub async fn voice_start(State(state): State<AppState>) -> impl IntoResponse {
    match VoiceRecorder::start(Arc::clone(&state.devices), Arc::clone(&state.gateway)).await {
        Ok(recorder) => {
            let voice_id = recorder.id().to_string();
            state
                .recorders
                .write()
                .await
                .insert(voice_id.clone(), recorder.clone());
            Json(VoiceStartResponse {
                voice_id,
                state: recorder.state().await,
            })
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn find_recorder(state: &AppState, voice_id: &str) -> Option<Arc<VoiceRecorder>> {
    state.recorders.read().await.get(voice_id).cloned()
}

/// GET /voice/:voice_id
pub async fn voice_status(
    State(state): State<AppState>,
    Path(voice_id): Path<String>,
) -> impl IntoResponse {
    match find_recorder(&state, &voice_id).await {
        Some(recorder) => Json(VoiceStatusResponse {
            voice_id,
            state: recorder.state().await,
            elapsed_secs: recorder.elapsed_secs(),
            levels: recorder.levels().await,
        })
        .into_response(),
        None => not_found("Voice recording", &voice_id),
    }
}

/// POST /voice/:voice_id/stop
pub async fn voice_stop(
    State(state): State<AppState>,
    Path(voice_id): Path<String>,
) -> impl IntoResponse {
    match find_recorder(&state, &voice_id).await {
        Some(recorder) => match recorder.stop().await {
            Ok(()) => Json(VoiceStatusResponse {
                voice_id,
                state: recorder.state().await,
                elapsed_secs: recorder.elapsed_secs(),
                levels: recorder.levels().await,
            })
            .into_response(),
            Err(e) => error_response(e),
        },
        None => not_found("Voice recording", &voice_id),
    }
}

/// POST /voice/:voice_id/send
/// Transcribe the recording; on success the text is forwarded as a normal
/// message to the selected conversation. On failure the recorder stays
/// stopped so send can be retried without re-recording.
pub async fn voice_send(
    State(state): State<AppState>,
    Path(voice_id): Path<String>,
) -> impl IntoResponse {
    let recorder = match find_recorder(&state, &voice_id).await {
        Some(recorder) => recorder,
        None => return not_found("Voice recording", &voice_id),
    };

    let text = match recorder.send().await {
        Ok(text) => text,
        Err(e) => return error_response(e),
    };

    state.recorders.write().await.remove(&voice_id);

    let selected = state.context.selected_conversation.read().await.clone();
    let message = match selected {
        Some(conversation_id) if state.context.guest => {
            Some(state.guest_store.send(&conversation_id, &text).await)
        }
        Some(conversation_id) => {
            let sent = match state.gateway.current_user_id().await {
                Ok(sender_id) => {
                    state
                        .gateway
                        .send_message(NewMessage {
                            conversation_id,
                            sender_id,
                            content: text.clone(),
                        })
                        .await
                }
                Err(e) => Err(e),
            };
            match sent {
                Ok(message) => Some(message),
                Err(e) => {
                    // Transcription succeeded; the failed forward is
                    // reported without discarding the text.
                    error!("Failed to forward voice message: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    Json(VoiceSendResponse {
        voice_id,
        text,
        message,
    })
    .into_response()
}

/// POST /voice/:voice_id/cancel
pub async fn voice_cancel(
    State(state): State<AppState>,
    Path(voice_id): Path<String>,
) -> impl IntoResponse {
    match state.recorders.write().await.remove(&voice_id) {
        Some(recorder) => {
            recorder.cancel().await;
            Json(VoiceStartResponse {
                voice_id,
                state: recorder.state().await,
            })
            .into_response()
        }
        None => not_found("Voice recording", &voice_id),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
