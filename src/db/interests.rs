use chrono::Utc;
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use super::begin_write;
use super::matches::{MatchOwner, clear_unconfirmed_matches};
use crate::error::AppError;
use crate::models::{DbInterest, Interest, InterestFields, Side};
use crate::normalize::normalize_age_group;

const INTEREST_COLUMNS: &str = "id, wrestler_id, event_name, event_date, weight_class, age_group, \
     age_group_normalized, notes, parent_ok, coach_ok, created_at, updated_at";

#[instrument(skip(pool, fields))]
pub async fn create_interest(
    pool: &Pool<Sqlite>,
    wrestler_id: i64,
    fields: &InterestFields,
) -> Result<Interest, AppError> {
    info!("Creating interest");
    let now = Utc::now().naive_utc();

    let row = sqlx::query_as::<_, DbInterest>(&format!(
        "INSERT INTO wrestler_interests
            (wrestler_id, event_name, event_date, weight_class, age_group,
             age_group_normalized, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {}",
        INTEREST_COLUMNS
    ))
    .bind(wrestler_id)
    .bind(&fields.event_name)
    .bind(fields.event_date)
    .bind(&fields.weight_class)
    .bind(&fields.age_group)
    .bind(normalize_age_group(&fields.age_group))
    .bind(&fields.notes)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(Interest::from(row))
}

#[instrument(skip(pool))]
pub async fn get_interest(pool: &Pool<Sqlite>, interest_id: i64) -> Result<Interest, AppError> {
    info!("Fetching interest");
    let row = sqlx::query_as::<_, DbInterest>(&format!(
        "SELECT {} FROM wrestler_interests WHERE id = ?",
        INTEREST_COLUMNS
    ))
    .bind(interest_id)
    .fetch_optional(pool)
    .await?;

    row.map(Interest::from)
        .ok_or_else(|| AppError::NotFound(format!("Interest {} not found", interest_id)))
}

#[instrument(skip(pool))]
pub async fn list_interests_for_wrestler(
    pool: &Pool<Sqlite>,
    wrestler_id: i64,
) -> Result<Vec<Interest>, AppError> {
    info!("Listing interests for wrestler");
    let rows = sqlx::query_as::<_, DbInterest>(&format!(
        "SELECT {} FROM wrestler_interests
         WHERE wrestler_id = ?
         ORDER BY created_at DESC, id DESC",
        INTEREST_COLUMNS
    ))
    .bind(wrestler_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Interest::from).collect())
}

#[instrument(skip(pool, fields))]
pub async fn update_interest(
    pool: &Pool<Sqlite>,
    interest_id: i64,
    fields: &InterestFields,
) -> Result<Interest, AppError> {
    info!("Updating interest");
    let row = sqlx::query_as::<_, DbInterest>(&format!(
        "UPDATE wrestler_interests
         SET event_name = ?, event_date = ?, weight_class = ?, age_group = ?,
             age_group_normalized = ?, notes = ?, updated_at = ?
         WHERE id = ?
         RETURNING {}",
        INTEREST_COLUMNS
    ))
    .bind(&fields.event_name)
    .bind(fields.event_date)
    .bind(&fields.weight_class)
    .bind(&fields.age_group)
    .bind(normalize_age_group(&fields.age_group))
    .bind(&fields.notes)
    .bind(Utc::now().naive_utc())
    .bind(interest_id)
    .fetch_optional(pool)
    .await?;

    row.map(Interest::from)
        .ok_or_else(|| AppError::NotFound(format!("Interest {} not found", interest_id)))
}

/// Deletes an interest along with its unconfirmed matches and their
/// messages. Refused while a confirmed match references it.
#[instrument(skip(pool))]
pub async fn delete_interest(pool: &Pool<Sqlite>, interest_id: i64) -> Result<(), AppError> {
    info!("Deleting interest");
    let mut tx = begin_write(pool).await?;

    clear_unconfirmed_matches(&mut tx, MatchOwner::Interest, interest_id).await?;

    let result = sqlx::query("DELETE FROM wrestler_interests WHERE id = ?")
        .bind(interest_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Interest {} not found",
            interest_id
        )));
    }

    tx.commit().await?;
    Ok(())
}

/// Raises the interest's display flag for `side`. The match row stays the
/// authority on agreement.
pub(crate) async fn mirror_confirmation(
    conn: &mut SqliteConnection,
    interest_id: i64,
    side: Side,
) -> Result<(), AppError> {
    let sql = match side {
        Side::Coach => "UPDATE wrestler_interests SET coach_ok = TRUE WHERE id = ?",
        Side::Parent => "UPDATE wrestler_interests SET parent_ok = TRUE WHERE id = ?",
    };
    sqlx::query(sql).bind(interest_id).execute(&mut *conn).await?;
    Ok(())
}
