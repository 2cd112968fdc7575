//! Telegram update handlers.
//!
//! The adapter stays thin: extract `(chat, caller id, display name, text)`
//! from the update and forward to the core dispatcher under the per-chat
//! lock. Non-text updates are ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use exb_core::domain::{ChatId, InboundMessage, UserId};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let inbound = InboundMessage {
        chat_id: ChatId(chat_id),
        user_id: UserId(user.id.0 as i64),
        display_name: user.first_name.clone(),
        text: text.to_string(),
    };

    let _guard = state.chat_locks.lock_chat(chat_id).await;
    if let Err(e) = state.dispatcher.dispatch(inbound).await {
        tracing::error!("message handling failed: {e}");
    }

    Ok(())
}
