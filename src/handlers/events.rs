// src/handlers/events.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
    dialogue,
    error::AppError,
    models::event::{Caller, ConversationId, InboundEvent},
    state::AppState,
};

/// DTO posted by the chat bridge for every incoming message.
#[derive(Debug, Deserialize, Validate)]
pub struct EventRequest {
    pub conversation_id: ConversationId,
    pub caller: Caller,
    #[validate(length(max = 4096))]
    pub text: String,
}

/// Feeds one chat message through the dialogue engine.
///
/// Operator status comes from the configured allow-list, never from the
/// request. Returns the outbound actions for the bridge to deliver.
pub async fn receive_event(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let event = InboundEvent {
        conversation_id: req.conversation_id,
        is_operator: state.config.is_operator(req.caller.id),
        caller: req.caller,
        text: req.text,
    };

    let outbound = dialogue::handle_event(&state, event).await;
    Ok(Json(outbound))
}
