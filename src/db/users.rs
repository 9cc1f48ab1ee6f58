use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::auth::{DbUser, DbUserSession, User, UserSession};
use crate::error::AppError;

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, role, display_name FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => User::try_from(user),
        None => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip_all)]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<Option<UserSession>, AppError> {
    let row = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(UserSession::from))
}

/// Resolves a session token to its user. Unknown and expired tokens are
/// both authentication failures.
#[instrument(skip_all)]
pub async fn get_session_user(pool: &Pool<Sqlite>, token: &str) -> Result<User, AppError> {
    let session = get_session_by_token(pool, token)
        .await?
        .ok_or_else(|| AppError::Authentication("Unknown session".to_string()))?;

    if !session.is_valid() {
        warn!(user_id = session.user_id, "Rejected expired session");
        return Err(AppError::Authentication("Session expired".to_string()));
    }

    match get_user(pool, session.user_id).await {
        Err(AppError::NotFound(_)) => Err(AppError::Authentication(
            "Session refers to a missing user".to_string(),
        )),
        other => other,
    }
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");
    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= ?")
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
