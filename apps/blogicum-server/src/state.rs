//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::admin::{AdminConfigError, AdminRegistry};
use blogicum_core::ports::{Clock, PasswordService, Repositories};
use blogicum_core::services::{AccountService, BlogService};
use blogicum_infra::database::DatabaseConnections;
use blogicum_infra::{
    Argon2PasswordService, InMemoryBlogStore, InMemoryRevocationStore, JwtConfig,
    JwtTokenService, SystemClock,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminRegistry>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, AdminConfigError> {
        let (repos, db) = open_repositories(config).await;

        let state = Self::assemble(
            repos,
            Arc::new(SystemClock),
            Arc::new(Argon2PasswordService::new()),
            config.jwt.clone(),
            db,
        )?;

        tracing::info!(
            persistent = state.db.is_some(),
            "Application state initialized"
        );
        Ok(state)
    }

    /// Wire services over the given repositories.
    pub fn assemble(
        repos: Repositories,
        clock: Arc<dyn Clock>,
        passwords: Arc<dyn PasswordService>,
        jwt: JwtConfig,
        db: Option<Arc<DatabaseConnections>>,
    ) -> Result<Self, AdminConfigError> {
        let accounts = AccountService::new(
            repos.users.clone(),
            passwords,
            Arc::new(JwtTokenService::new(jwt)),
            Arc::new(InMemoryRevocationStore::new(clock.clone())),
            clock.clone(),
        );

        Ok(Self {
            blog: Arc::new(BlogService::new(repos, clock)),
            accounts: Arc::new(accounts),
            admin: Arc::new(AdminRegistry::blog()?),
            db,
        })
    }
}

fn in_memory() -> (Repositories, Option<Arc<DatabaseConnections>>) {
    (Arc::new(InMemoryBlogStore::new()).repositories(), None)
}

#[cfg(feature = "postgres")]
async fn open_repositories(config: &AppConfig) -> (Repositories, Option<Arc<DatabaseConnections>>) {
    use blogicum_infra::database::postgres_repositories;
    use migration::{Migrator, MigratorTrait};

    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return in_memory();
    };

    let connections = match DatabaseConnections::init(db_config).await {
        Ok(connections) => connections,
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            return in_memory();
        }
    };

    if let Err(e) = Migrator::up(connections.main.as_ref(), None).await {
        tracing::error!("Failed to apply migrations: {}. Using in-memory fallback.", e);
        return in_memory();
    }

    let repos = postgres_repositories(&connections.main);
    (repos, Some(Arc::new(connections)))
}

#[cfg(not(feature = "postgres"))]
async fn open_repositories(
    _config: &AppConfig,
) -> (Repositories, Option<Arc<DatabaseConnections>>) {
    tracing::info!("Running without postgres feature - using in-memory repositories");
    in_memory()
}
