use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::require_wrestler_reader;
use crate::auth::{Permission, User};
use crate::db::{self, Transition};
use crate::error::AppError;
use crate::models::{Match, MatchListing, MatchParties, Side, StatusFilter};
use crate::workflow::Closure;

/// The side a request acts for. An explicit value must be exactly "coach" or
/// "parent"; without one the principal's role decides, and roles that could
/// act for either side (or neither) must say which.
pub fn resolve_side(user: &User, requested: Option<&str>) -> Result<Side, AppError> {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse(),
        None => user.default_side().ok_or_else(|| {
            AppError::Validation(format!(
                "side is required for {} accounts (\"coach\" or \"parent\")",
                user.role
            ))
        }),
    }
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn propose_match(
    pool: &Pool<Sqlite>,
    user: &User,
    need_id: i64,
    interest_id: i64,
    side: Option<&str>,
) -> Result<(Match, bool), AppError> {
    let side = resolve_side(user, side)?;

    let need = db::get_need(pool, need_id).await?;
    let interest = db::get_interest(pool, interest_id).await?;
    let wrestler = db::get_wrestler(pool, interest.wrestler_id).await?;

    let parties = MatchParties {
        coach_user_id: need.coach_user_id,
        parent_user_id: wrestler.parent_user_id,
        athlete_user_id: wrestler.athlete_user_id,
    };
    user.require_acts_for(side, &parties)?;

    let (m, created) = db::create_or_touch_match(pool, need_id, interest_id, side).await?;
    info!(match_id = m.id, created, side = %side, "Match proposed");
    Ok((m, created))
}

async fn transition_as(
    pool: &Pool<Sqlite>,
    user: &User,
    match_id: i64,
    side: Side,
    transition: Transition,
) -> Result<Match, AppError> {
    let parties = db::get_match_parties(pool, match_id).await?;
    user.require_acts_for(side, &parties)?;
    db::transition_match(pool, match_id, transition).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn confirm_match(
    pool: &Pool<Sqlite>,
    user: &User,
    match_id: i64,
    side: Option<&str>,
) -> Result<Match, AppError> {
    let side = resolve_side(user, side)?;
    transition_as(pool, user, match_id, side, Transition::Confirm(side)).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn decline_match(
    pool: &Pool<Sqlite>,
    user: &User,
    match_id: i64,
    side: Option<&str>,
) -> Result<Match, AppError> {
    let side = resolve_side(user, side)?;
    transition_as(
        pool,
        user,
        match_id,
        side,
        Transition::Close(Closure::Decline, side),
    )
    .await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn cancel_match(
    pool: &Pool<Sqlite>,
    user: &User,
    match_id: i64,
    side: Option<&str>,
) -> Result<Match, AppError> {
    let side = resolve_side(user, side)?;
    transition_as(
        pool,
        user,
        match_id,
        side,
        Transition::Close(Closure::Cancel, side),
    )
    .await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn get_match(
    pool: &Pool<Sqlite>,
    user: &User,
    match_id: i64,
) -> Result<MatchListing, AppError> {
    let parties = db::get_match_parties(pool, match_id).await?;
    user.require_participant(&parties)?;
    db::get_match_listing(pool, match_id).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_coach_matches(
    pool: &Pool<Sqlite>,
    user: &User,
    filter: StatusFilter,
) -> Result<Vec<MatchListing>, AppError> {
    user.require_permission(Permission::ActAsCoach)?;
    db::list_matches_for_coach(pool, user.id, filter).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_wrestler_matches(
    pool: &Pool<Sqlite>,
    user: &User,
    wrestler_id: i64,
    filter: StatusFilter,
) -> Result<Vec<MatchListing>, AppError> {
    let wrestler = db::get_wrestler(pool, wrestler_id).await?;
    require_wrestler_reader(user, &wrestler)?;
    db::list_matches_for_wrestler(pool, wrestler_id, filter).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_need_matches(
    pool: &Pool<Sqlite>,
    user: &User,
    need_id: i64,
    filter: StatusFilter,
) -> Result<Vec<MatchListing>, AppError> {
    let need = db::get_need(pool, need_id).await?;
    user.require_owner(need.coach_user_id, "Need")?;
    db::list_matches_for_need(pool, need_id, filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn user(role: Role) -> User {
        User {
            id: 1,
            username: "u".to_string(),
            role,
            display_name: "U".to_string(),
        }
    }

    #[test]
    fn explicit_side_must_be_exact() {
        let parent = user(Role::Parent);
        assert_eq!(resolve_side(&parent, Some("coach")).unwrap(), Side::Coach);
        assert!(matches!(
            resolve_side(&parent, Some("guardian")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn missing_side_follows_role_and_never_defaults_silently() {
        assert_eq!(resolve_side(&user(Role::Coach), None).unwrap(), Side::Coach);
        assert_eq!(resolve_side(&user(Role::Parent), Some(" ")).unwrap(), Side::Parent);
        assert!(matches!(
            resolve_side(&user(Role::Admin), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            resolve_side(&user(Role::Athlete), None),
            Err(AppError::Validation(_))
        ));
    }
}
