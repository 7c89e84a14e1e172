use super::{AdminNotice, Controls, MessageHandle, Notifier, NotifyError};
use crate::events::{approve_token, lock_token, reject_token, resubmit_token};
use crate::database::types::RejectReason;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};

impl From<teloxide::RequestError> for NotifyError {
    fn from(e: teloxide::RequestError) -> Self {
        NotifyError::Delivery(e.to_string())
    }
}

pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard(controls: &Controls) -> Option<InlineKeyboardMarkup> {
    match controls {
        Controls::Claim { request_id } => Some(InlineKeyboardMarkup::new([[
            InlineKeyboardButton::callback("🔒 Claim", lock_token(request_id)),
        ]])),
        Controls::Decide { request_id } => Some(InlineKeyboardMarkup::new([[
            InlineKeyboardButton::callback("✅ Approve", approve_token(request_id)),
            InlineKeyboardButton::callback("❌ Reject", reject_token(request_id)),
        ]])),
        Controls::RejectReasons { request_id } => Some(InlineKeyboardMarkup::new([
            vec![
                InlineKeyboardButton::callback(
                    "Wrong ID",
                    resubmit_token(RejectReason::WrongId, request_id),
                ),
                InlineKeyboardButton::callback(
                    "Wrong amount",
                    resubmit_token(RejectReason::WrongAmount, request_id),
                ),
            ],
            vec![
                InlineKeyboardButton::callback(
                    "Wrong screenshot",
                    resubmit_token(RejectReason::WrongEvidence, request_id),
                ),
                InlineKeyboardButton::callback(
                    "Other",
                    resubmit_token(RejectReason::Other, request_id),
                ),
            ],
        ])),
        Controls::None => None,
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn post(&self, channel: i64, notice: &AdminNotice) -> Result<MessageHandle, NotifyError> {
        let chat_id = ChatId(channel);
        let message = match &notice.photo_ref {
            Some(file_id) => {
                let mut request = self
                    .bot
                    .send_photo(chat_id, InputFile::file_id(file_id))
                    .caption(notice.caption.clone());
                if let Some(markup) = keyboard(&notice.controls) {
                    request = request.reply_markup(markup);
                }
                request.await?
            }
            None => {
                let mut request = self.bot.send_message(chat_id, notice.caption.clone());
                if let Some(markup) = keyboard(&notice.controls) {
                    request = request.reply_markup(markup);
                }
                request.await?
            }
        };

        Ok(MessageHandle {
            chat_id: channel,
            message_id: message.id.0,
        })
    }

    async fn edit(
        &self,
        handle: MessageHandle,
        notice: &AdminNotice,
    ) -> Result<MessageHandle, NotifyError> {
        let mut request = self
            .bot
            .edit_message_caption(ChatId(handle.chat_id), MessageId(handle.message_id))
            .caption(notice.caption.clone());
        if let Some(markup) = keyboard(&notice.controls) {
            request = request.reply_markup(markup);
        }
        request.await?;
        Ok(handle)
    }

    async fn delete(&self, handle: MessageHandle) -> Result<(), NotifyError> {
        self.bot
            .delete_message(ChatId(handle.chat_id), MessageId(handle.message_id))
            .await?;
        Ok(())
    }

    async fn send_direct(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        self.bot.send_message(ChatId(user_id), text).await?;
        Ok(())
    }
}
