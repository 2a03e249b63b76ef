use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Call screen
        .route("/calls/start", post(handlers::start_call))
        .route("/calls/:call_id/mute", post(handlers::toggle_mute))
        .route("/calls/:call_id/video", post(handlers::toggle_video))
        .route("/calls/:call_id/speaker", post(handlers::toggle_speaker))
        .route(
            "/calls/:call_id/screen-share",
            post(handlers::toggle_screen_share),
        )
        .route("/calls/:call_id/status", get(handlers::call_status))
        .route("/calls/:call_id/end", post(handlers::end_call))
        .route("/calls/:call_id", delete(handlers::end_call))
        .route("/calls/history", get(handlers::call_history))
        // Conversations
        .route("/conversations", get(handlers::list_conversations))
        .route(
            "/conversations/:conversation_id/open",
            post(handlers::open_conversation),
        )
        .route(
            "/conversations/:conversation_id/messages",
            get(handlers::get_messages).post(handlers::send_message),
        )
        .route(
            "/conversations/:conversation_id",
            delete(handlers::close_conversation),
        )
        // Voice messages
        .route("/voice/start", post(handlers::voice_start))
        .route("/voice/:voice_id", get(handlers::voice_status))
        .route("/voice/:voice_id/stop", post(handlers::voice_stop))
        .route("/voice/:voice_id/send", post(handlers::voice_send))
        .route("/voice/:voice_id/cancel", post(handlers::voice_cancel))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
