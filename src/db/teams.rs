use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbTeam, Team, TeamFields};

const TEAM_COLUMNS: &str =
    "id, coach_user_id, name, coach_name, contact_email, logo_path, city, state";

/// The team profile of `coach_user_id`, if one has been saved.
#[instrument(skip(pool))]
pub async fn get_team_for_coach(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
) -> Result<Option<Team>, AppError> {
    info!("Fetching team profile");
    let row = sqlx::query_as::<_, DbTeam>(&format!(
        "SELECT {} FROM teams WHERE coach_user_id = ?",
        TEAM_COLUMNS
    ))
    .bind(coach_user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Team::from))
}

/// Creates the coach's team profile or replaces every field of the
/// existing one. A coach has at most one team.
#[instrument(skip(pool, fields))]
pub async fn save_team(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    fields: &TeamFields,
) -> Result<Team, AppError> {
    info!("Saving team profile");
    let row = sqlx::query_as::<_, DbTeam>(&format!(
        "INSERT INTO teams
            (coach_user_id, name, coach_name, contact_email, logo_path, city, state, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (coach_user_id) DO UPDATE SET
            name = excluded.name,
            coach_name = excluded.coach_name,
            contact_email = excluded.contact_email,
            logo_path = excluded.logo_path,
            city = excluded.city,
            state = excluded.state,
            updated_at = excluded.updated_at
         RETURNING {}",
        TEAM_COLUMNS
    ))
    .bind(coach_user_id)
    .bind(&fields.name)
    .bind(&fields.coach_name)
    .bind(&fields.contact_email)
    .bind(&fields.logo_path)
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(Utc::now().naive_utc())
    .fetch_one(pool)
    .await?;

    Ok(Team::from(row))
}
