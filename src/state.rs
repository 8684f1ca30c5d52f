use std::{sync::Arc, time::Instant};

use anyhow::Context;
use tokio::sync::Semaphore;

use crate::{
    auth::{
        password::CredentialStore,
        repo::{PgUserRepo, UserRepo},
    },
    config::AppConfig,
    locations::repo::{LocationRepo, PgLocationRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub locations: Arc<dyn LocationRepo>,
    pub credentials: CredentialStore,
    /// Bounds how many key derivations run at once.
    pub kdf_permits: Arc<Semaphore>,
    pub started_at: Instant,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let users = Arc::new(PgUserRepo::new(db.clone())) as Arc<dyn UserRepo>;
        let locations = Arc::new(PgLocationRepo::new(db)) as Arc<dyn LocationRepo>;

        Self::from_parts(Arc::new(config), users, locations)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        locations: Arc<dyn LocationRepo>,
    ) -> anyhow::Result<Self> {
        let credentials =
            CredentialStore::new(&config.kdf).context("invalid key derivation parameters")?;
        let kdf_permits = Arc::new(Semaphore::new(config.kdf.max_concurrency.max(1)));
        Ok(Self {
            config,
            users,
            locations,
            credentials,
            kdf_permits,
            started_at: Instant::now(),
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{auth::repo::MemoryUserRepo, locations::repo::MemoryLocationRepo};

        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryLocationRepo::default()),
        )
        .expect("test config is valid")
    }
}
