//! Liveness endpoint for uptime monitors.
//!
//! Holds no relay state; it only proves the process is up.

use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub const RUNNING_TEXT: &str = "✅ Bot is running!";

#[derive(Clone)]
pub struct KeepAliveState {
    started_at: DateTime<Utc>,
}

impl KeepAliveState {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

impl Default for KeepAliveState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub started_at: String,
    pub uptime_secs: i64,
}

pub fn app(state: Arc<KeepAliveState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .with_state(state)
}

async fn home() -> &'static str {
    RUNNING_TEXT
}

async fn health(State(state): State<Arc<KeepAliveState>>) -> Json<Health> {
    let uptime = Utc::now().signed_duration_since(state.started_at);
    Json(Health {
        status: "ok",
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: uptime.num_seconds().max(0),
    })
}

/// Serve until `cancel` fires.
pub async fn serve(addr: SocketAddr, cancel: CancellationToken) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "keep-alive endpoint listening");

    axum::serve(listener, app(Arc::new(KeepAliveState::new())))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    tracing::info!("keep-alive endpoint stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn home_is_static() {
        assert_eq!(home().await, RUNNING_TEXT);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let state = Arc::new(KeepAliveState::new());
        let Json(h) = health(State(state.clone())).await;
        assert_eq!(h.status, "ok");
        assert!(h.uptime_secs >= 0);

        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["started_at"], state.started_at.to_rfc3339());
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve("127.0.0.1:0".parse().unwrap(), cancel.clone()));
        cancel.cancel();
        let res = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(res.is_ok());
    }
}
