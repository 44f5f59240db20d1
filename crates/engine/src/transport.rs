//! Outbound messages and the transport that delivers them.

use async_trait::async_trait;

use crate::{error::TransportError, session::ConversationId};

/// An inline button: a label and the payload sent back when tapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn callback(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyboard {
    /// Buttons attached to the message; taps arrive as callbacks.
    Inline(Vec<Vec<Button>>),
    /// Persistent menu under the input field; taps arrive as plain text.
    Menu(Vec<Vec<String>>),
    /// Removes a previously shown menu keyboard.
    Remove,
}

/// One outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Identifier of a message already delivered to a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, conversation: ConversationId, reply: &Reply)
    -> Result<(), TransportError>;

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError>;

    async fn edit_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError>;

    async fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), TransportError>;
}
