use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use anonbot_core::{
    config::Config,
    messaging::port::RelayTransport,
    router::Router,
    store::{MemorySessionStore, SessionStore},
    tokens::ReplyTokens,
};

use crate::handlers;
use crate::TelegramTransport;

#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn RelayTransport>,
    pub relay: Arc<Router>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Per-user locks so two events from the same user never interleave.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "anonbot started"),
        Err(e) => tracing::warn!(error = %e, "could not fetch bot profile"),
    }

    let transport: Arc<dyn RelayTransport> =
        Arc::new(TelegramTransport::new(bot.clone(), cfg.retry_on_flood));
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let relay = Arc::new(Router::new(
        transport.clone(),
        store,
        Arc::new(ReplyTokens::new()),
    ));

    let state = Arc::new(AppState {
        transport,
        relay,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_events_are_serialized() {
        let locks = Arc::new(ChatLocks::default());
        let guard = locks.lock_chat(1).await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.lock_chat(1).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let locks = ChatLocks::default();
        let _a = locks.lock_chat(1).await;
        tokio::time::timeout(Duration::from_millis(200), locks.lock_chat(2))
            .await
            .unwrap();
    }
}
