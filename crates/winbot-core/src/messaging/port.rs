use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    messaging::types::{InlineKeyboard, MembershipStatus},
    Result,
};

/// Outbound side of the messaging transport plus the membership lookup.
///
/// Adapters map transport failures into `Error::Delivery` for photo sends,
/// `Error::MembershipCheck` for membership lookups and `Error::External`
/// otherwise.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    async fn send_photo(&self, chat_id: ChatId, path: &Path, caption: &str) -> Result<MessageRef>;

    async fn membership_status(&self, channel: ChatId, user: UserId) -> Result<MembershipStatus>;

    /// Clear the pending indicator of a button press.
    async fn answer_callback_query(&self, callback_id: &str) -> Result<()>;
}
