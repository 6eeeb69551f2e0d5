//! Per-event relay state machine.
//!
//! For a message, in strict order:
//! 1. identity-setting message → identity resolver
//! 2. no pending target → guidance notice
//! 3. supported payload → deliver with a reply button
//! 4. unsupported payload → "format not supported"
//!
//! Every branch ends with exactly one notice to the originating chat.

use std::sync::Arc;

use crate::{
    domain::{ChatId, UserId},
    messaging::{
        port::RelayTransport,
        types::{ActionActivation, IncomingMessage, InlineKeyboard},
    },
    notice::Notice,
    resolver::IdentityResolver,
    store::SessionStore,
    tokens::{parse_reply_callback, reply_callback_data, ReplyTokens},
};

pub const REPLY_BUTTON_LABEL: &str = "💬 Reply anonymously";

/// What happened to an inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    Greeted,
    TargetSet(UserId),
    TargetNotResolved,
    NoTarget,
    Unsupported,
    Delivered { recipient: UserId },
    DeliveryFailed { recipient: UserId },
}

/// What happened to an activated reply button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Ignored,
    ReplyArmed { sender: UserId },
    UnknownSender,
    Superseded,
}

pub struct Router {
    transport: Arc<dyn RelayTransport>,
    store: Arc<dyn SessionStore>,
    tokens: Arc<ReplyTokens>,
    resolver: IdentityResolver,
}

impl Router {
    pub fn new(
        transport: Arc<dyn RelayTransport>,
        store: Arc<dyn SessionStore>,
        tokens: Arc<ReplyTokens>,
    ) -> Self {
        let resolver = IdentityResolver::new(transport.clone(), store.clone());
        Self {
            transport,
            store,
            tokens,
            resolver,
        }
    }

    pub async fn handle_message(&self, msg: IncomingMessage) -> MessageOutcome {
        if msg.forward.is_none() && msg.payload.text().is_some_and(is_greeting_command) {
            self.notify(msg.chat_id, Notice::Greeting).await;
            return MessageOutcome::Greeted;
        }

        if let Some(claim) = IdentityResolver::classify(&msg) {
            return match self.resolver.apply(&msg, &claim).await {
                Some(recipient) => MessageOutcome::TargetSet(recipient),
                None => MessageOutcome::TargetNotResolved,
            };
        }

        let Some(recipient) = self.store.pending(msg.user_id).await else {
            self.notify(msg.chat_id, Notice::NoTarget).await;
            return MessageOutcome::NoTarget;
        };

        if !msg.payload.is_supported() {
            tracing::info!(
                sender = msg.user_id.0,
                kind = msg.payload.kind(),
                "unsupported payload"
            );
            self.notify(
                msg.chat_id,
                Notice::Unsupported {
                    kind: msg.payload.kind().to_string(),
                },
            )
            .await;
            return MessageOutcome::Unsupported;
        }

        self.relay(&msg, recipient).await
    }

    async fn relay(&self, msg: &IncomingMessage, recipient: UserId) -> MessageOutcome {
        let token = self.tokens.issue(recipient, msg.user_id).await;
        let controls = InlineKeyboard::single(REPLY_BUTTON_LABEL, reply_callback_data(&token));
        let outbound = msg.payload.anonymized();

        match self
            .transport
            .deliver(recipient.into(), &outbound, Some(controls))
            .await
        {
            Ok(()) => {
                self.store.set_last_sender(recipient, msg.user_id).await;
                tracing::info!(
                    sender = msg.user_id.0,
                    recipient = recipient.0,
                    kind = outbound.kind(),
                    "relayed"
                );
                self.notify(msg.chat_id, Notice::Sent).await;
                MessageOutcome::Delivered { recipient }
            }
            Err(e) => {
                // Nothing about this attempt may outlive it.
                self.tokens.revoke(&token).await;
                tracing::warn!(
                    sender = msg.user_id.0,
                    recipient = recipient.0,
                    kind = outbound.kind(),
                    error = %e,
                    "delivery failed"
                );
                self.notify(msg.chat_id, Notice::DeliveryFailed(e)).await;
                MessageOutcome::DeliveryFailed { recipient }
            }
        }
    }

    /// Handle a pressed "reply anonymously" button.
    ///
    /// The presser becomes a sender whose pending target is the user who last
    /// wrote to them, provided that is the sender whose message carried the button.
    pub async fn handle_action(&self, action: ActionActivation) -> ActionOutcome {
        let Some(token) = parse_reply_callback(&action.data) else {
            self.acknowledge(&action.action_id, None).await;
            return ActionOutcome::Ignored;
        };

        let ticket = self
            .tokens
            .lookup(token)
            .await
            .filter(|t| t.recipient == action.user_id);
        let last = self.store.last_sender(action.user_id).await;

        let outcome = match (ticket, last) {
            (Some(ticket), Some(last)) if ticket.sender == last => {
                self.store.set_pending(action.user_id, last).await;
                ActionOutcome::ReplyArmed { sender: last }
            }
            (Some(_), Some(_)) => ActionOutcome::Superseded,
            _ => ActionOutcome::UnknownSender,
        };
        tracing::info!(user = action.user_id.0, outcome = ?outcome, "reply action");

        match outcome {
            ActionOutcome::ReplyArmed { .. } => {
                self.acknowledge(&action.action_id, None).await;
                self.notify(action.chat_id, Notice::ReplyPrompt).await;
            }
            ActionOutcome::Superseded => {
                self.acknowledge(&action.action_id, Some(Notice::ReplySuperseded))
                    .await;
            }
            ActionOutcome::UnknownSender | ActionOutcome::Ignored => {
                self.acknowledge(&action.action_id, Some(Notice::ReplyUnknown))
                    .await;
            }
        }
        outcome
    }

    async fn notify(&self, chat_id: ChatId, notice: Notice) {
        if let Err(e) = self.transport.notify(chat_id, &notice.render()).await {
            tracing::warn!(chat = chat_id.0, error = %e, "failed to send notice");
        }
    }

    async fn acknowledge(&self, action_id: &str, notice: Option<Notice>) {
        let text = notice.map(|n| n.render());
        if let Err(e) = self
            .transport
            .acknowledge_action(action_id, text.as_deref())
            .await
        {
            tracing::warn!(error = %e, "failed to answer action");
        }
    }
}

/// `/start` or `/help`, optionally addressed as `/start@botname`.
fn is_greeting_command(text: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or("");
    let Some(cmd) = first.strip_prefix('/') else {
        return false;
    };
    let cmd = cmd.split('@').next().unwrap_or("").to_lowercase();
    matches!(cmd.as_str(), "start" | "help")
}
