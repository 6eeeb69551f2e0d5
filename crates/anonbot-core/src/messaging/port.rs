use async_trait::async_trait;

use crate::{
    domain::{ChatId, UserId},
    errors::{DeliveryError, LookupError},
    messaging::types::InlineKeyboard,
    payload::RelayPayload,
    Result,
};

/// Outbound side of the relay.
///
/// Telegram is the only implementation; the router only ever talks to this
/// trait, so tests drive it with an in-memory fake.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Directory lookup of a public handle (without the `@`).
    async fn resolve_handle(&self, handle: &str) -> std::result::Result<UserId, LookupError>;

    /// Deliver a payload, optionally with interactive controls attached to the
    /// delivered message.
    async fn deliver(
        &self,
        destination: ChatId,
        payload: &RelayPayload,
        controls: Option<InlineKeyboard>,
    ) -> std::result::Result<(), DeliveryError>;

    /// Send an HTML notice back to a chat.
    async fn notify(&self, chat_id: ChatId, html: &str) -> Result<()>;

    /// Answer an interactive activation, optionally with a short toast.
    async fn acknowledge_action(&self, action_id: &str, text: Option<&str>) -> Result<()>;
}
