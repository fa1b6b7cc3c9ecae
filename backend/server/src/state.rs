use std::sync::Arc;

use tokio::task::spawn_blocking;

use super::{config::Config, database::Database, error::AppError};

pub struct State {
    pub config: Config,
    pub database: Database,
}

impl State {
    pub fn new() -> anyhow::Result<Arc<Self>> {
        let config = Config::load()?;
        let database = Database::open(&config.database_path)?;

        Ok(Self::with(config, database))
    }

    pub fn with(config: Config, database: Database) -> Arc<Self> {
        Arc::new(Self { config, database })
    }

    /// Runs store work on the blocking pool, off the async workers.
    pub async fn with_database<T, F>(self: &Arc<Self>, work: F) -> Result<T, AppError>
    where
        F: FnOnce(&Database) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        spawn_blocking(move || work(&state.database)).await?
    }
}
