//! Telegram update handlers.
//!
//! Each handler converts the update into a core event, takes the per-user
//! lock and hands the event to the relay router. All user-visible responses
//! come from the router.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod convert;

pub use convert::{action_activation, incoming_message};

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(action) = action_activation(&q) else {
        // No chat to answer into; just stop the client spinner.
        if let Err(e) = state.transport.acknowledge_action(&q.id, None).await {
            tracing::warn!(error = %e, "failed to answer callback");
        }
        return Ok(());
    };

    let _guard = state.chat_locks.lock_chat(action.user_id.0).await;
    state.relay.handle_action(action).await;
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Relaying is one-to-one; group chats are not served.
    if !msg.chat.is_private() {
        tracing::debug!(chat = msg.chat.id.0, "ignoring non-private chat");
        return Ok(());
    }

    let Some(incoming) = incoming_message(&msg) else {
        tracing::debug!(chat = msg.chat.id.0, "ignoring service message");
        return Ok(());
    };

    let _guard = state.chat_locks.lock_chat(incoming.user_id.0).await;
    state.relay.handle_message(incoming).await;
    Ok(())
}
