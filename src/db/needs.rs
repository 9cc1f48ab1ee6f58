use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::begin_write;
use super::matches::{MatchOwner, clear_unconfirmed_matches};
use crate::error::AppError;
use crate::models::{DbNeed, Need, NeedFields};
use crate::normalize::normalize_age_group;

const NEED_COLUMNS: &str = "id, coach_user_id, event_name, event_date, weight_class, age_group, \
     age_group_normalized, city, state, notes, is_open, created_at, updated_at";

#[instrument(skip(pool, fields))]
pub async fn create_need(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    fields: &NeedFields,
) -> Result<Need, AppError> {
    info!("Creating need");
    let now = Utc::now().naive_utc();

    let row = sqlx::query_as::<_, DbNeed>(&format!(
        "INSERT INTO coach_needs
            (coach_user_id, event_name, event_date, weight_class, age_group,
             age_group_normalized, city, state, notes, is_open, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {}",
        NEED_COLUMNS
    ))
    .bind(coach_user_id)
    .bind(&fields.event_name)
    .bind(fields.event_date)
    .bind(&fields.weight_class)
    .bind(&fields.age_group)
    .bind(normalize_age_group(&fields.age_group))
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(&fields.notes)
    .bind(fields.is_open)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(Need::from(row))
}

#[instrument(skip(pool))]
pub async fn get_need(pool: &Pool<Sqlite>, need_id: i64) -> Result<Need, AppError> {
    info!("Fetching need");
    let row = sqlx::query_as::<_, DbNeed>(&format!(
        "SELECT {} FROM coach_needs WHERE id = ?",
        NEED_COLUMNS
    ))
    .bind(need_id)
    .fetch_optional(pool)
    .await?;

    row.map(Need::from)
        .ok_or_else(|| AppError::NotFound(format!("Need {} not found", need_id)))
}

#[instrument(skip(pool))]
pub async fn list_needs_for_coach(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
) -> Result<Vec<Need>, AppError> {
    info!("Listing needs for coach");
    let rows = sqlx::query_as::<_, DbNeed>(&format!(
        "SELECT {} FROM coach_needs WHERE coach_user_id = ? ORDER BY created_at DESC, id DESC",
        NEED_COLUMNS
    ))
    .bind(coach_user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Need::from).collect())
}

/// Rewrites every editable field; the age group is normalized again.
#[instrument(skip(pool, fields))]
pub async fn update_need(
    pool: &Pool<Sqlite>,
    need_id: i64,
    fields: &NeedFields,
) -> Result<Need, AppError> {
    info!("Updating need");
    let row = sqlx::query_as::<_, DbNeed>(&format!(
        "UPDATE coach_needs
         SET event_name = ?, event_date = ?, weight_class = ?, age_group = ?,
             age_group_normalized = ?, city = ?, state = ?, notes = ?, is_open = ?,
             updated_at = ?
         WHERE id = ?
         RETURNING {}",
        NEED_COLUMNS
    ))
    .bind(&fields.event_name)
    .bind(fields.event_date)
    .bind(&fields.weight_class)
    .bind(&fields.age_group)
    .bind(normalize_age_group(&fields.age_group))
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(&fields.notes)
    .bind(fields.is_open)
    .bind(Utc::now().naive_utc())
    .bind(need_id)
    .fetch_optional(pool)
    .await?;

    row.map(Need::from)
        .ok_or_else(|| AppError::NotFound(format!("Need {} not found", need_id)))
}

#[instrument(skip(pool))]
pub async fn close_need(pool: &Pool<Sqlite>, need_id: i64) -> Result<Need, AppError> {
    info!("Closing need");
    let row = sqlx::query_as::<_, DbNeed>(&format!(
        "UPDATE coach_needs SET is_open = FALSE, updated_at = ? WHERE id = ? RETURNING {}",
        NEED_COLUMNS
    ))
    .bind(Utc::now().naive_utc())
    .bind(need_id)
    .fetch_optional(pool)
    .await?;

    row.map(Need::from)
        .ok_or_else(|| AppError::NotFound(format!("Need {} not found", need_id)))
}

/// Deletes a need along with its unconfirmed matches and their messages.
/// Refused while a confirmed match references it.
#[instrument(skip(pool))]
pub async fn delete_need(pool: &Pool<Sqlite>, need_id: i64) -> Result<(), AppError> {
    info!("Deleting need");
    let mut tx = begin_write(pool).await?;

    clear_unconfirmed_matches(&mut tx, MatchOwner::Need, need_id).await?;

    let result = sqlx::query("DELETE FROM coach_needs WHERE id = ?")
        .bind(need_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Need {} not found", need_id)));
    }

    tx.commit().await?;
    Ok(())
}
