//! Telegram update handlers.
//!
//! Each handler decodes a teloxide update into an [`Inbound`] action and hands
//! it to the core conversation flow. Failures are logged by the flow; the
//! dispatcher never sees an error.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};
use tracing::debug;

use winbot_core::{
    domain::{ChatId, UserId},
    messaging::types::{Action, Inbound},
};

use crate::router::AppState;

pub async fn handle_callback(
    _bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();
    let Some(action) = Action::from_callback_data(&data) else {
        debug!(data = %data, "ignoring callback with unknown action");
        state.conversation.acknowledge_unknown(&q.id).await;
        return Ok(());
    };

    let inbound = Inbound {
        chat_id: callback_chat(q.message.as_ref().map(|m| m.chat.id), q.from.id),
        user_id: UserId(q.from.id.0 as i64),
        username: q.from.username.clone(),
        callback_id: Some(q.id.clone()),
        action,
    };
    let _ = state.conversation.handle(inbound).await;
    Ok(())
}

/// Chat a button press is answered in. Presses on messages Telegram no
/// longer returns fall back to the presser's private chat.
fn callback_chat(
    message_chat: Option<teloxide::types::ChatId>,
    from: teloxide::types::UserId,
) -> ChatId {
    match message_chat {
        Some(chat) => ChatId(chat.0),
        None => ChatId(from.0 as i64),
    }
}

pub async fn handle_message(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(action) = msg.text().and_then(Action::from_command) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-command message");
        return Ok(());
    };

    let inbound = Inbound {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        callback_id: None,
        action,
    };
    let _ = state.conversation.handle(inbound).await;
    Ok(())
}
