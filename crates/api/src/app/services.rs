use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use pickline_infra::store::{
    ActorStore, InMemoryActorStore, InMemoryOrderStore, OrderStore, PostgresActorStore, PostgresOrderStore,
    postgres,
};
use pickline_infra::{Directory, LifecycleEngine, OrderReports};

use crate::config::{ApiConfig, Persistence};

/// Everything a handler needs, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub engine: LifecycleEngine,
    pub reports: OrderReports,
}

impl AppServices {
    pub fn from_stores(orders: Arc<dyn OrderStore>, actors: Arc<dyn ActorStore>) -> Self {
        let directory = Directory::new(actors);
        Self {
            engine: LifecycleEngine::new(orders.clone(), directory.clone()),
            reports: OrderReports::new(orders, directory),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::from_stores(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryActorStore::new()),
        )
    }

    pub fn persistent(pool: PgPool) -> Self {
        Self::from_stores(
            Arc::new(PostgresOrderStore::new(pool.clone())),
            Arc::new(PostgresActorStore::new(pool)),
        )
    }

    pub fn directory(&self) -> &Directory {
        self.engine.directory()
    }
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    match &config.persistence {
        Persistence::InMemory => {
            tracing::info!("using in-memory stores");
            Ok(AppServices::in_memory())
        }
        Persistence::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = postgres::connect(database_url, *max_connections)
                .await
                .context("failed to initialise persistent stores")?;
            tracing::info!(max_connections, "using Postgres stores");
            Ok(AppServices::persistent(pool))
        }
    }
}
