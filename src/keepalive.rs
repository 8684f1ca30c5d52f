use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::SelfPingConfig;

/// Periodically GETs our own `/health` so free-tier hosts keep the
/// instance awake. Returns `None` when disabled.
pub fn spawn_self_ping(cfg: &SelfPingConfig) -> Option<JoinHandle<()>> {
    if !cfg.enabled {
        return None;
    }

    let url = format!("{}/health", cfg.base_url.trim_end_matches('/'));
    let period = Duration::from_millis(cfg.interval_ms.max(1));

    Some(tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await; // first tick completes immediately

        loop {
            ticker.tick().await;
            match client.get(&url).send().await {
                Ok(resp) => info!(url = %url, status = %resp.status(), "self-ping ok"),
                Err(e) => error!(url = %url, error = %e, "self-ping failed"),
            }
        }
    }))
}
