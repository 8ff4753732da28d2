use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, JwtAuthService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth = Arc::new(JwtAuthService::new(
            store.clone(),
            &config.auth,
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        Ok(Self {
            config,
            store,
            auth,
        })
    }
}
