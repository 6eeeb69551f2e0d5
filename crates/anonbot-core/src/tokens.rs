//! Server-side correlation for "reply anonymously" buttons.
//!
//! The button only carries an opaque token; the sender it refers to never
//! leaves the server.

use std::{
    collections::HashMap,
    fmt::Write,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::domain::UserId;

/// Callback data prefix for reply buttons.
pub const REPLY_PREFIX: &str = "reply:";

const TOKEN_HEX_LEN: usize = 24;

/// What a reply token stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyTicket {
    /// The user the button was delivered to (the only one allowed to press it).
    pub recipient: UserId,
    /// The user whose message carried the button.
    pub sender: UserId,
}

pub struct ReplyTokens {
    salt: [u8; 16],
    counter: AtomicU64,
    tickets: Mutex<HashMap<String, ReplyTicket>>,
}

impl Default for ReplyTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyTokens {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let mut h = Sha256::new();
        h.update(nanos.to_le_bytes());
        h.update(std::process::id().to_le_bytes());
        let digest = h.finalize();

        let mut salt = [0u8; 16];
        salt.copy_from_slice(&digest[..16]);

        Self {
            salt,
            counter: AtomicU64::new(0),
            tickets: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a fresh token for a message about to be delivered to `recipient`.
    pub async fn issue(&self, recipient: UserId, sender: UserId) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut h = Sha256::new();
        h.update(self.salt);
        h.update(n.to_le_bytes());
        h.update(recipient.0.to_le_bytes());
        h.update(sender.0.to_le_bytes());
        let token = hex_prefix(&h.finalize(), TOKEN_HEX_LEN);

        self.tickets
            .lock()
            .await
            .insert(token.clone(), ReplyTicket { recipient, sender });
        token
    }

    pub async fn lookup(&self, token: &str) -> Option<ReplyTicket> {
        self.tickets.lock().await.get(token).copied()
    }

    pub async fn revoke(&self, token: &str) {
        self.tickets.lock().await.remove(token);
    }
}

/// Callback data for a reply button.
pub fn reply_callback_data(token: &str) -> String {
    format!("{REPLY_PREFIX}{token}")
}

/// Extract the token from reply-button callback data.
pub fn parse_reply_callback(data: &str) -> Option<&str> {
    let token = data.strip_prefix(REPLY_PREFIX)?;
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    let mut out = String::with_capacity(len);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
        if out.len() >= len {
            out.truncate(len);
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_are_unique_and_opaque() {
        let tokens = ReplyTokens::new();
        let a = tokens.issue(UserId(2), UserId(1)).await;
        let b = tokens.issue(UserId(2), UserId(1)).await;
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_HEX_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(tokens.lookup(&a).await.is_some());
        assert!(tokens.lookup(&b).await.is_some());
    }

    #[tokio::test]
    async fn lookup_and_revoke() {
        let tokens = ReplyTokens::new();
        let t = tokens.issue(UserId(7), UserId(3)).await;
        assert_eq!(
            tokens.lookup(&t).await,
            Some(ReplyTicket {
                recipient: UserId(7),
                sender: UserId(3)
            })
        );
        tokens.revoke(&t).await;
        assert_eq!(tokens.lookup(&t).await, None);
    }

    #[test]
    fn callback_data_round_trip() {
        let data = reply_callback_data("abc123");
        assert_eq!(data, "reply:abc123");
        assert_eq!(parse_reply_callback(&data), Some("abc123"));
        assert_eq!(parse_reply_callback("reply:"), None);
        assert_eq!(parse_reply_callback("askuser:1:2"), None);
    }

    #[test]
    fn callback_data_fits_telegram_limit() {
        // Telegram caps callback_data at 64 bytes.
        let data = reply_callback_data(&"f".repeat(TOKEN_HEX_LEN));
        assert!(data.len() <= 64);
    }
}
