use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::accounts::{AccountStore, MemoryAccountStore, PgAccountStore};
use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, JwtConfig};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    /// Connect the configured backend and run migrations when it is Postgres.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        if config.ephemeral_secret {
            warn!("JWT_SECRET not set; using a random secret, sessions will not survive a restart");
        }

        let store: Arc<dyn AccountStore> = match config.database.connect_options()? {
            Some(opts) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect_with(opts)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; assuming schema is provisioned");
                }
                info!("using postgres account store");
                Arc::new(PgAccountStore::new(db))
            }
            None => {
                warn!("no Postgres configuration found; using in-memory store, data will be lost on restart");
                Arc::new(MemoryAccountStore::seeded())
            }
        };

        Ok(Self::from_parts(store, &config.jwt))
    }

    pub fn from_parts(store: Arc<dyn AccountStore>, jwt: &JwtConfig) -> Self {
        Self {
            store,
            jwt: Arc::new(JwtKeys::from(jwt)),
        }
    }
}
