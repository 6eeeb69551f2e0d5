use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use anonbot_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), anonbot_core::Error> {
    anonbot_core::logging::init("anonbot")?;

    let cfg = Arc::new(Config::load()?);
    tracing::debug!(config = ?cfg, "configuration loaded");

    let cancel = CancellationToken::new();
    let keepalive = cfg.keepalive_enabled.then(|| {
        let addr = cfg.keepalive_addr;
        let cancel = cancel.clone();
        tokio::spawn(async move {
            // The bot keeps running without the endpoint.
            if let Err(e) = anonbot_keepalive::serve(addr, cancel).await {
                tracing::error!(%addr, error = %e, "keep-alive endpoint failed");
            }
        })
    });

    let polled = anonbot_telegram::router::run_polling(cfg).await;

    cancel.cancel();
    if let Some(task) = keepalive {
        join_keepalive(task).await;
    }

    polled.map_err(|e| anonbot_core::Error::External(format!("telegram bot failed: {e}")))
}

/// Wait for the keep-alive task; returns false if it panicked or was aborted.
async fn join_keepalive(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "keep-alive task did not finish cleanly");
            false
        }
    }
}
