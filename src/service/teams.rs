use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{Permission, User};
use crate::db;
use crate::error::AppError;
use crate::models::{Team, TeamFields};

/// The caller's own team profile. A coach who has not saved one yet gets
/// `None`, not an error.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn my_team(pool: &Pool<Sqlite>, user: &User) -> Result<Option<Team>, AppError> {
    user.require_permission(Permission::ManageTeam)?;
    db::get_team_for_coach(pool, user.id).await
}

#[instrument(skip(pool, user, fields), fields(user_id = user.id))]
pub async fn save_my_team(
    pool: &Pool<Sqlite>,
    user: &User,
    fields: TeamFields,
) -> Result<Team, AppError> {
    user.require_permission(Permission::ManageTeam)?;
    if fields.name.trim().is_empty() {
        return Err(AppError::Validation("Team name is required".to_string()));
    }

    let team = db::save_team(pool, user.id, &fields).await?;
    info!(team_id = team.id, "Team profile saved");
    Ok(team)
}
