use std::str::FromStr;
use std::time::Duration;

use mat_connect::config::{AppConfig, load_environment};
use mat_connect::database::{CURRENT_SCHEMA, StoreFeatures, migrate_database_declaratively};
use mat_connect::db::clean_expired_sessions;
use mat_connect::telemetry::init_tracing;
use mat_connect::{Error, init_rocket};
use rocket::tokio;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{error, info};

#[rocket::main]
async fn main() -> Result<(), Error> {
    load_environment()?;
    let config = AppConfig::from_env()?;
    let _otel_guard = init_tracing(config.otlp.as_ref())?;

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    info!("Running database migrations...");
    let changed = migrate_database_declaratively(
        &pool,
        CURRENT_SCHEMA,
        config.allow_destructive_migrations,
    )
    .await?;
    info!(changed, "Migrations completed");

    let features = StoreFeatures::detect(&pool).await?;

    spawn_session_cleanup(
        pool.clone(),
        Duration::from_secs(config.session_cleanup_interval_secs),
    );

    let _ = init_rocket(pool, features).launch().await?;
    Ok(())
}

fn spawn_session_cleanup(pool: SqlitePool, every: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(every).await;
        }
    });
}
