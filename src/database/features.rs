use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;

/// Optional storage capabilities, detected once at startup. Older databases
/// migrated without `allow_destructive` may lack columns that newer code
/// reads; queries consult these flags instead of inspecting the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFeatures {
    pub message_read_tracking: bool,
}

impl Default for StoreFeatures {
    fn default() -> Self {
        Self {
            message_read_tracking: true,
        }
    }
}

impl StoreFeatures {
    #[instrument(skip(pool))]
    pub async fn detect(pool: &Pool<Sqlite>) -> Result<Self, AppError> {
        let message_read_tracking = has_column(pool, "messages", "read_at").await?;

        let features = Self {
            message_read_tracking,
        };
        info!(features = ?features, "Detected store features");
        Ok(features)
    }
}

async fn has_column(pool: &Pool<Sqlite>, table: &str, column: &str) -> Result<bool, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}
