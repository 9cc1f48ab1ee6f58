use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbWrestler, Wrestler};

const WRESTLER_COLUMNS: &str =
    "id, parent_user_id, athlete_user_id, first_name, last_name, city, state, created_at";

#[derive(Debug, Clone)]
pub struct NewWrestler {
    pub athlete_user_id: Option<i64>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[instrument(skip(pool, wrestler))]
pub async fn create_wrestler(
    pool: &Pool<Sqlite>,
    parent_user_id: i64,
    wrestler: &NewWrestler,
) -> Result<Wrestler, AppError> {
    info!("Creating wrestler");
    let row = sqlx::query_as::<_, DbWrestler>(&format!(
        "INSERT INTO wrestlers
            (parent_user_id, athlete_user_id, first_name, last_name, city, state, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING {}",
        WRESTLER_COLUMNS
    ))
    .bind(parent_user_id)
    .bind(wrestler.athlete_user_id)
    .bind(&wrestler.first_name)
    .bind(&wrestler.last_name)
    .bind(&wrestler.city)
    .bind(&wrestler.state)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(Wrestler::from(row))
}

#[instrument(skip(pool))]
pub async fn get_wrestler(pool: &Pool<Sqlite>, wrestler_id: i64) -> Result<Wrestler, AppError> {
    info!("Fetching wrestler");
    let row = sqlx::query_as::<_, DbWrestler>(&format!(
        "SELECT {} FROM wrestlers WHERE id = ?",
        WRESTLER_COLUMNS
    ))
    .bind(wrestler_id)
    .fetch_optional(pool)
    .await?;

    row.map(Wrestler::from)
        .ok_or_else(|| AppError::NotFound(format!("Wrestler {} not found", wrestler_id)))
}

/// Wrestlers a user may act or read for: as their parent, or as the
/// athlete themselves.
#[instrument(skip(pool))]
pub async fn list_wrestlers_for_user(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<Wrestler>, AppError> {
    info!("Listing wrestlers for user");
    let rows = sqlx::query_as::<_, DbWrestler>(&format!(
        "SELECT {} FROM wrestlers
         WHERE parent_user_id = ?1 OR athlete_user_id = ?1
         ORDER BY first_name, last_name, id",
        WRESTLER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Wrestler::from).collect())
}
