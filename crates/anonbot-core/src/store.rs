use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::UserId;

/// Relay session state: who each sender is writing to, and who last wrote to
/// each recipient.
///
/// Every operation is an atomic get or set of a single key. The router never
/// needs a transaction across keys.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set_pending(&self, sender: UserId, recipient: UserId);
    async fn pending(&self, sender: UserId) -> Option<UserId>;

    async fn set_last_sender(&self, recipient: UserId, sender: UserId);
    async fn last_sender(&self, recipient: UserId) -> Option<UserId>;
}

/// Process-wide in-memory store. Unbounded, never evicts, lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    pending: Mutex<HashMap<UserId, UserId>>,
    last_sender: Mutex<HashMap<UserId, UserId>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_pending(&self, sender: UserId, recipient: UserId) {
        self.pending.lock().await.insert(sender, recipient);
    }

    async fn pending(&self, sender: UserId) -> Option<UserId> {
        self.pending.lock().await.get(&sender).copied()
    }

    async fn set_last_sender(&self, recipient: UserId, sender: UserId) {
        self.last_sender.lock().await.insert(recipient, sender);
    }

    async fn last_sender(&self, recipient: UserId) -> Option<UserId> {
        self.last_sender.lock().await.get(&recipient).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_is_last_write_wins() {
        let store = MemorySessionStore::new();
        let s = UserId(1);
        assert_eq!(store.pending(s).await, None);

        store.set_pending(s, UserId(10)).await;
        store.set_pending(s, UserId(20)).await;
        assert_eq!(store.pending(s).await, Some(UserId(20)));

        // Reads do not consume the entry.
        assert_eq!(store.pending(s).await, Some(UserId(20)));
    }

    #[tokio::test]
    async fn last_sender_keeps_a_single_slot_per_recipient() {
        let store = MemorySessionStore::new();
        let r = UserId(99);
        store.set_last_sender(r, UserId(1)).await;
        store.set_last_sender(r, UserId(2)).await;
        assert_eq!(store.last_sender(r).await, Some(UserId(2)));
        assert_eq!(store.last_sender(UserId(1)).await, None);
    }

    #[tokio::test]
    async fn maps_are_independent() {
        let store = MemorySessionStore::new();
        store.set_pending(UserId(1), UserId(2)).await;
        assert_eq!(store.last_sender(UserId(1)).await, None);
        assert_eq!(store.last_sender(UserId(2)).await, None);
    }
}
