use crate::config::AppConfig;
use crate::errors::ServiceError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Type alias for the database connection pool
pub type DbPool = DatabaseConnection;

/// Pool tuning for the database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database
///
/// # Errors
/// Returns a `ServiceError` if the connection cannot be established
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };
    establish_connection_with_config(&config).await
}

/// Establishes a connection pool with custom pool tuning
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(true);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let pool = Database::connect(opt)
        .await
        .map_err(ServiceError::DatabaseError)?;

    info!("Database connection pool established");
    Ok(pool)
}

/// Establish the pool using `AppConfig` tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Runs the embedded database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }
    result
}

/// Checks that the database connection is alive
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    pool.ping().await.map_err(ServiceError::DatabaseError)
}

/// Closes the connection pool
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");
    pool.close().await.map_err(ServiceError::DatabaseError)
}

/// Closes a shared pool at shutdown. If other references are still alive the
/// explicit close is skipped with a warning; those connections drop with
/// their owners.
pub async fn shutdown_pool(pool: Arc<DbPool>) -> Result<(), ServiceError> {
    match Arc::try_unwrap(pool) {
        Ok(pool) => close_pool(pool).await,
        Err(shared) => {
            warn!(
                references = Arc::strong_count(&shared),
                "Connection pool still shared at shutdown, skipping explicit close"
            );
            Ok(())
        }
    }
}

/// Runs a service operation under an explicit deadline.
///
/// A transaction that exceeds the deadline is dropped, which rolls it back
/// and returns its connection to the pool; the caller sees a
/// `ServiceError::Timeout` rather than an opaque server error.
pub async fn with_deadline<T, F>(
    operation: &str,
    deadline: Duration,
    fut: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation = %operation, timeout = ?deadline, "Operation deadline exceeded");
            Err(ServiceError::Timeout(operation.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_passes_through_results() {
        let ok: Result<u32, ServiceError> =
            with_deadline("noop", Duration::from_secs(1), async { Ok(42) }).await;
        assert_eq!(ok.unwrap(), 42);

        let err: Result<u32, ServiceError> = with_deadline("fails", Duration::from_secs(1), async {
            Err(ServiceError::InternalError("boom".into()))
        })
        .await;
        assert!(matches!(err, Err(ServiceError::InternalError(_))));
    }

    #[tokio::test]
    async fn shutdown_closes_a_uniquely_owned_pool() {
        let pool = establish_connection("sqlite::memory:").await.unwrap();
        shutdown_pool(Arc::new(pool)).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_tolerates_a_still_shared_pool() {
        let pool = Arc::new(establish_connection("sqlite::memory:").await.unwrap());
        let survivor = pool.clone();

        shutdown_pool(pool).await.unwrap();

        // The remaining reference keeps its connections usable
        assert!(check_connection(&survivor).await.is_ok());
    }

    #[tokio::test]
    async fn deadline_expires_as_timeout() {
        let result: Result<(), ServiceError> =
            with_deadline("slow", Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Timeout(op)) if op == "slow"));
    }
}
