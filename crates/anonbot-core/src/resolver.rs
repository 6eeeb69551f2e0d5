//! Identity resolution: turn an identity-setting message into a recipient.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::{
    domain::UserId,
    errors::ResolveError,
    messaging::{
        port::RelayTransport,
        types::{ForwardOrigin, IncomingMessage},
    },
    notice::{Notice, Resolution},
    store::SessionStore,
};

/// A message that picks a recipient instead of carrying content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityClaim {
    Forwarded(ForwardOrigin),
    Numeric(String),
    Handle(String),
}

fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{4,32}$").expect("valid regex"))
}

pub struct IdentityResolver {
    transport: Arc<dyn RelayTransport>,
    store: Arc<dyn SessionStore>,
}

impl IdentityResolver {
    pub fn new(transport: Arc<dyn RelayTransport>, store: Arc<dyn SessionStore>) -> Self {
        Self { transport, store }
    }

    /// First match wins: forward metadata, then an all-digit text, then `@handle`.
    ///
    /// An all-digit text is always a claim, even if the sender meant it as content.
    pub fn classify(msg: &IncomingMessage) -> Option<IdentityClaim> {
        if let Some(origin) = msg.forward {
            return Some(IdentityClaim::Forwarded(origin));
        }

        let text = msg.payload.text()?.trim();
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            return Some(IdentityClaim::Numeric(text.to_string()));
        }
        if text.starts_with('@') {
            let handle = text.trim_start_matches('@').trim();
            return Some(IdentityClaim::Handle(handle.to_string()));
        }
        None
    }

    pub async fn resolve(
        &self,
        claim: &IdentityClaim,
    ) -> Result<(UserId, Resolution), ResolveError> {
        match claim {
            IdentityClaim::Forwarded(ForwardOrigin::User(id)) => Ok((*id, Resolution::Forwarded)),
            IdentityClaim::Forwarded(ForwardOrigin::Hidden) => {
                Err(ResolveError::HiddenForwardOrigin)
            }
            IdentityClaim::Numeric(digits) => digits
                .parse::<i64>()
                .map(|id| (UserId(id), Resolution::Numeric))
                .map_err(|_| ResolveError::InvalidId(digits.clone())),
            IdentityClaim::Handle(handle) => {
                if !handle_re().is_match(handle) {
                    return Err(ResolveError::InvalidHandle(handle.clone()));
                }
                self.transport
                    .resolve_handle(handle)
                    .await
                    .map(|id| (id, Resolution::Handle(handle.clone())))
                    .map_err(|source| ResolveError::Lookup {
                        handle: handle.clone(),
                        source,
                    })
            }
        }
    }

    /// Resolve the claim; on success make it the sender's pending target.
    ///
    /// Either way the sender gets a notice. Failures leave the store untouched.
    pub async fn apply(&self, msg: &IncomingMessage, claim: &IdentityClaim) -> Option<UserId> {
        let (notice, resolved) = match self.resolve(claim).await {
            Ok((recipient, via)) => {
                self.store.set_pending(msg.user_id, recipient).await;
                tracing::info!(
                    sender = msg.user_id.0,
                    recipient = recipient.0,
                    via = ?via,
                    "pending target set"
                );
                (Notice::TargetSet { recipient, via }, Some(recipient))
            }
            Err(e) => {
                tracing::info!(sender = msg.user_id.0, error = %e, "recipient not resolved");
                (failure_notice(&e), None)
            }
        };

        if let Err(e) = self.transport.notify(msg.chat_id, &notice.render()).await {
            tracing::warn!(chat = msg.chat_id.0, error = %e, "failed to send notice");
        }
        resolved
    }
}

fn failure_notice(e: &ResolveError) -> Notice {
    match e {
        ResolveError::HiddenForwardOrigin => Notice::HiddenForward,
        ResolveError::InvalidId(raw) => Notice::InvalidId(raw.clone()),
        ResolveError::InvalidHandle(_) | ResolveError::Lookup { .. } => Notice::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Media, RelayPayload};

    fn text(s: &str) -> IncomingMessage {
        IncomingMessage::text(UserId(1), s)
    }

    #[test]
    fn classifies_digits_handles_and_forwards() {
        assert_eq!(
            IdentityResolver::classify(&text("123456789")),
            Some(IdentityClaim::Numeric("123456789".to_string()))
        );
        assert_eq!(
            IdentityResolver::classify(&text("@someone")),
            Some(IdentityClaim::Handle("someone".to_string()))
        );
        assert_eq!(IdentityResolver::classify(&text("hello")), None);
        assert_eq!(IdentityResolver::classify(&text("12 34")), None);
        assert_eq!(IdentityResolver::classify(&text("-5")), None);
    }

    #[test]
    fn forward_takes_precedence_over_text() {
        let msg = text("@someone").forwarded(ForwardOrigin::User(UserId(42)));
        assert_eq!(
            IdentityResolver::classify(&msg),
            Some(IdentityClaim::Forwarded(ForwardOrigin::User(UserId(42))))
        );
    }

    #[test]
    fn captions_never_set_a_target() {
        let msg = IncomingMessage::with_payload(
            UserId(1),
            RelayPayload::Photo(Media::new("f", Some("123".to_string()))),
        );
        assert_eq!(IdentityResolver::classify(&msg), None);
    }

    #[test]
    fn handle_syntax() {
        assert!(handle_re().is_match("unknownhandle"));
        assert!(handle_re().is_match("user_01"));
        assert!(!handle_re().is_match("abc"));
        assert!(!handle_re().is_match(""));
        assert!(!handle_re().is_match("has space"));
    }
}
