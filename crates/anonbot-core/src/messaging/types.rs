use crate::{
    domain::{ChatId, UserId},
    payload::RelayPayload,
};

/// Where a forwarded message came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardOrigin {
    User(UserId),
    /// Forwarded, but the author hides their account (or it was a channel post).
    Hidden,
}

/// Cross-messenger incoming message.
///
/// Telegram-specific fields should live in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub forward: Option<ForwardOrigin>,
    pub payload: RelayPayload,
}

impl IncomingMessage {
    /// Plain text message from a private chat (used heavily in tests).
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_id: user_id.into(),
            user_id,
            forward: None,
            payload: RelayPayload::Text(text.into()),
        }
    }

    pub fn with_payload(user_id: UserId, payload: RelayPayload) -> Self {
        Self {
            chat_id: user_id.into(),
            user_id,
            forward: None,
            payload,
        }
    }

    pub fn forwarded(mut self, origin: ForwardOrigin) -> Self {
        self.forward = Some(origin);
        self
    }
}

/// Activation of an inline control (Telegram callback query).
#[derive(Clone, Debug)]
pub struct ActionActivation {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub action_id: String,
    pub data: String,
}

/// Inline keyboard (buttons) attached to a delivered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    pub fn single(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self::new(vec![InlineButton {
            label: label.into(),
            callback_data: callback_data.into(),
        }])
    }
}
