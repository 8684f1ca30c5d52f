use anyhow::Context;

use crate::{error::AppError, state::AppState};

// Key derivation is CPU and memory heavy: it runs on the blocking pool and
// waits for a permit so a burst of logins cannot starve the runtime.

pub async fn hash_password(state: &AppState, password: String) -> Result<String, AppError> {
    let _permit = state
        .kdf_permits
        .acquire()
        .await
        .context("kdf limiter closed")?;
    let store = state.credentials.clone();
    let hash = tokio::task::spawn_blocking(move || store.hash(&password))
        .await
        .context("hash task failed")??;
    Ok(hash)
}

pub async fn verify_password(
    state: &AppState,
    password: String,
    stored: String,
) -> Result<bool, AppError> {
    let _permit = state
        .kdf_permits
        .acquire()
        .await
        .context("kdf limiter closed")?;
    let store = state.credentials.clone();
    let ok = tokio::task::spawn_blocking(move || store.verify(&password, &stored))
        .await
        .context("verify task failed")?;
    Ok(ok)
}
