//! Delivery of engine replies through the Bot API.

use async_trait::async_trait;
use engine::{ConversationId, Keyboard, MessageId, Reply, Transport, TransportError};
use teloxide::{
    prelude::*,
    types::{CallbackQueryId, MessageId as TgMessageId},
};

use crate::ui;

#[derive(Clone)]
pub(crate) struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub(crate) fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn transport_error(err: teloxide::RequestError) -> TransportError {
    TransportError(err.to_string())
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        conversation: ConversationId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        let mut request = self.bot.send_message(ChatId(conversation.0), reply.text.clone());
        if let Some(keyboard) = &reply.keyboard {
            request = request.reply_markup(ui::reply_markup(keyboard));
        }
        request.await.map(|_| ()).map_err(transport_error)
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await
            .map(|_| ())
            .map_err(transport_error)
    }

    async fn edit_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        let mut request = self.bot.edit_message_text(
            ChatId(conversation.0),
            TgMessageId(message.0),
            reply.text.clone(),
        );
        // Only inline keyboards can be attached to an edited message.
        if let Some(Keyboard::Inline(rows)) = &reply.keyboard {
            request = request.reply_markup(ui::inline_markup(rows));
        }
        request.await.map(|_| ()).map_err(transport_error)
    }

    async fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(conversation.0), TgMessageId(message.0))
            .await
            .map(|_| ())
            .map_err(transport_error)
    }
}
