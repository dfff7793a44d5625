//! Telegram adapter (teloxide).
//!
//! This crate implements the `winbot-core` MessagingPort over the Telegram Bot
//! API and runs the long-poll dispatcher.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ChatMemberKind, InlineKeyboardButton, InlineKeyboardMarkup, InputFile},
};

use tokio::time::sleep;
use tracing::warn;

pub mod handlers;
pub mod router;

use winbot_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ButtonKind, InlineKeyboard, MembershipStatus},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn msg_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }

    async fn with_retry<T, Fut>(
        &self,
        mut op: impl FnMut() -> Fut,
    ) -> std::result::Result<T, teloxide::RequestError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    warn!("telegram flood control, retrying in {d:?}");
                    sleep(d).await;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

fn external(e: teloxide::RequestError) -> Error {
    Error::External(format!("telegram error: {e}"))
}

/// Map a chat member record onto the statuses the gate understands.
pub fn membership_from_kind(kind: &ChatMemberKind) -> MembershipStatus {
    match kind {
        ChatMemberKind::Owner(_) => MembershipStatus::Owner,
        ChatMemberKind::Administrator(_) => MembershipStatus::Admin,
        ChatMemberKind::Member => MembershipStatus::Member,
        // Restricted users count as not subscribed, even when still in the channel.
        ChatMemberKind::Restricted(_) | ChatMemberKind::Left | ChatMemberKind::Banned(_) => {
            MembershipStatus::NotMember
        }
    }
}

/// Convert a core keyboard, one button per row. URL buttons with an
/// unparseable link are dropped.
pub fn to_markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .buttons
        .into_iter()
        .filter_map(|b| match b.kind {
            ButtonKind::Callback(data) => Some(InlineKeyboardButton::callback(b.label, data)),
            ButtonKind::Url(url) => match reqwest::Url::parse(&url) {
                Ok(parsed) => Some(InlineKeyboardButton::url(b.label, parsed)),
                Err(e) => {
                    warn!(url = %url, "dropping button with invalid url: {e}");
                    None
                }
            },
        })
        .map(|button| vec![button])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await
            .map_err(external)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = to_markup(keyboard);
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .reply_markup(markup.clone())
            })
            .await
            .map_err(external)?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_photo(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_photo(Self::tg_chat(chat_id), InputFile::file(path.to_path_buf()))
                    .caption(caption.to_string())
            })
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn membership_status(&self, channel: ChatId, user: UserId) -> Result<MembershipStatus> {
        let member = self
            .with_retry(|| {
                self.bot.get_chat_member(
                    Self::tg_chat(channel),
                    teloxide::types::UserId(user.0 as u64),
                )
            })
            .await
            .map_err(|e| Error::MembershipCheck(e.to_string()))?;
        Ok(membership_from_kind(&member.kind))
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.with_retry(|| self.bot.answer_callback_query(callback_id.to_string()))
            .await
            .map_err(external)?;
        Ok(())
    }
}
