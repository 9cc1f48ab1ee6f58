use anyhow::Context;
use mat_connect::config::load_environment;
use mat_connect::database::{CURRENT_SCHEMA, get_schema_changes};
use sqlx::SqlitePool;

/// Exits non-zero when migrating `DATABASE_URL` to the current schema would
/// lose data.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_environment()?;
    let database_url =
        dotenvy::var("DATABASE_URL").context("Failed to find database url")?;

    let pool = SqlitePool::connect(&database_url)
        .await
        .context("Failed to connect to SQLite database")?;

    let changes = get_schema_changes(&pool, CURRENT_SCHEMA).await?;
    let destructive = changes.destructive_changes();

    if destructive.is_empty() {
        if changes.has_any_changes() {
            println!("Pending schema changes are additive ✓");
        } else {
            println!("Schema is up to date ✓");
        }
        return Ok(());
    }

    println!("Destructive changes detected:");
    for change in &destructive {
        println!("    {}", change);
    }
    std::process::exit(1);
}
