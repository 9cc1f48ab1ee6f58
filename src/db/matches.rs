//! Match records: creation with duplicate protection, state transitions and
//! listing projections.
//!
//! Every write goes through [`apply_transition`], which runs the
//! [`MatchState`] machine and persists the result with a compare-and-set on
//! the flags that were read. A writer that loses the race re-reads and tries
//! again, so concurrent confirmations from both sides converge.

use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

use super::begin_write;
use super::interests::mirror_confirmation;
use crate::error::AppError;
use crate::models::{
    DbMatch, DbMatchListing, Match, MatchListing, MatchParties, Side, StatusFilter,
};
use crate::workflow::{Closure, MatchState, TransitionError};

const MATCH_COLUMNS: &str = "id, coach_need_id, wrestler_interest_id, coach_user_id, status, \
     coach_ok, parent_ok, confirmed_at, created_at, updated_at";

const MAX_ATTEMPTS: usize = 3;

macro_rules! listing_query {
    ($scope:literal) => {
        concat!(
            "SELECT m.id, m.status, m.coach_ok, m.parent_ok, m.confirmed_at, m.created_at,
                    n.id AS need_id, wi.id AS interest_id,
                    n.event_name, n.event_date, n.weight_class, n.age_group,
                    wi.notes AS interest_notes,
                    w.id AS wrestler_id, w.first_name AS wrestler_first_name,
                    w.last_name AS wrestler_last_name,
                    t.name AS team_name, u.display_name AS coach_name
             FROM matches m
             JOIN coach_needs n ON n.id = m.coach_need_id
             JOIN wrestler_interests wi ON wi.id = m.wrestler_interest_id
             JOIN wrestlers w ON w.id = wi.wrestler_id
             LEFT JOIN teams t ON t.coach_user_id = m.coach_user_id
             LEFT JOIN users u ON u.id = m.coach_user_id
             WHERE ",
            $scope,
            " AND (?2 IS NULL OR m.status = ?2)
             ORDER BY m.created_at DESC, m.id DESC"
        )
    };
}

/// A requested change to a match's agreement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirm(Side),
    Close(Closure, Side),
}

impl Transition {
    fn apply(self, state: MatchState, now: NaiveDateTime) -> Result<MatchState, TransitionError> {
        match self {
            Transition::Confirm(side) => state.confirm(side, now),
            Transition::Close(closure, side) => state.close(closure, side),
        }
    }
}

fn state_of(m: &Match) -> MatchState {
    MatchState {
        status: m.status,
        coach_ok: m.coach_ok,
        parent_ok: m.parent_ok,
        confirmed_at: m.confirmed_at.map(|dt| dt.naive_utc()),
    }
}

async fn fetch_match(conn: &mut SqliteConnection, match_id: i64) -> Result<Option<Match>, AppError> {
    let row = sqlx::query_as::<_, DbMatch>(&format!(
        "SELECT {} FROM matches WHERE id = ?",
        MATCH_COLUMNS
    ))
    .bind(match_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Match::from))
}

async fn find_active(
    conn: &mut SqliteConnection,
    need_id: i64,
    interest_id: i64,
) -> Result<Option<Match>, AppError> {
    let row = sqlx::query_as::<_, DbMatch>(&format!(
        "SELECT {} FROM matches
         WHERE coach_need_id = ? AND wrestler_interest_id = ?
           AND status IN ('pending', 'confirmed')",
        MATCH_COLUMNS
    ))
    .bind(need_id)
    .bind(interest_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Match::from))
}

/// Applies `transition` to `current` and writes the result. Returns the
/// match unchanged when the transition is a no-op, and `None` when the row
/// changed underneath us.
async fn apply_transition(
    conn: &mut SqliteConnection,
    current: &Match,
    transition: Transition,
) -> Result<Option<Match>, AppError> {
    let now = Utc::now().naive_utc();
    let before = state_of(current);
    let after = transition.apply(before, now)?;

    if after == before {
        return Ok(Some(current.clone()));
    }

    let row = sqlx::query_as::<_, DbMatch>(&format!(
        "UPDATE matches
         SET status = ?, coach_ok = ?, parent_ok = ?, confirmed_at = ?, updated_at = ?
         WHERE id = ? AND coach_ok = ? AND parent_ok = ?
           AND (status IN ('declined', 'cancelled')) = ?
         RETURNING {}",
        MATCH_COLUMNS
    ))
    .bind(after.status.as_str())
    .bind(after.coach_ok)
    .bind(after.parent_ok)
    .bind(after.confirmed_at)
    .bind(now)
    .bind(current.id)
    .bind(before.coach_ok)
    .bind(before.parent_ok)
    .bind(before.status.is_closed())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    if let Transition::Confirm(side) = transition {
        mirror_confirmation(conn, current.wrestler_interest_id, side).await?;
    }

    Ok(Some(Match::from(row)))
}

#[instrument(skip(pool))]
pub async fn get_match(pool: &Pool<Sqlite>, match_id: i64) -> Result<Match, AppError> {
    info!("Fetching match");
    let mut conn = pool.acquire().await?;
    fetch_match(&mut conn, match_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
}

/// The coach, parent and (if linked) athlete behind a match.
#[instrument(skip(pool))]
pub async fn get_match_parties(
    pool: &Pool<Sqlite>,
    match_id: i64,
) -> Result<MatchParties, AppError> {
    let row = sqlx::query_as::<_, MatchParties>(
        "SELECT m.coach_user_id, w.parent_user_id, w.athlete_user_id
         FROM matches m
         JOIN wrestler_interests wi ON wi.id = m.wrestler_interest_id
         JOIN wrestlers w ON w.id = wi.wrestler_id
         WHERE m.id = ?",
    )
    .bind(match_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
}

/// Confirms the pair's live match for `side`, or creates one proposed by
/// `side`. The flag reports whether a row was inserted.
#[instrument(skip(pool))]
pub async fn create_or_touch_match(
    pool: &Pool<Sqlite>,
    need_id: i64,
    interest_id: i64,
    side: Side,
) -> Result<(Match, bool), AppError> {
    info!("Creating or confirming match for pair");

    for attempt in 1..=MAX_ATTEMPTS {
        match try_create_or_touch(pool, need_id, interest_id, side).await {
            Ok(Some(outcome)) => return Ok(outcome),
            Ok(None) => warn!(attempt, "Match changed concurrently, retrying"),
            Err(e) if e.is_unique_violation() => {
                warn!(attempt, "Concurrent insert for pair, retrying as update")
            }
            Err(e) if e.is_busy() => warn!(attempt, "Store busy, retrying"),
            Err(e) => return Err(e),
        }
    }

    Err(AppError::Conflict(format!(
        "Could not settle the match for need {} and interest {}",
        need_id, interest_id
    )))
}

async fn try_create_or_touch(
    pool: &Pool<Sqlite>,
    need_id: i64,
    interest_id: i64,
    side: Side,
) -> Result<Option<(Match, bool)>, AppError> {
    let mut tx = begin_write(pool).await?;

    if let Some(current) = find_active(&mut tx, need_id, interest_id).await? {
        let Some(updated) = apply_transition(&mut tx, &current, Transition::Confirm(side)).await?
        else {
            return Ok(None);
        };
        tx.commit().await?;
        return Ok(Some((updated, false)));
    }

    let coach_user_id: i64 = sqlx::query_scalar("SELECT coach_user_id FROM coach_needs WHERE id = ?")
        .bind(need_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Need {} not found", need_id)))?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM wrestler_interests WHERE id = ?")
        .bind(interest_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interest {} not found", interest_id)))?;

    let state = MatchState::proposed_by(side);
    let now = Utc::now().naive_utc();

    let row = sqlx::query_as::<_, DbMatch>(&format!(
        "INSERT INTO matches
            (coach_need_id, wrestler_interest_id, coach_user_id, status,
             coach_ok, parent_ok, confirmed_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
         RETURNING {}",
        MATCH_COLUMNS
    ))
    .bind(need_id)
    .bind(interest_id)
    .bind(coach_user_id)
    .bind(state.status.as_str())
    .bind(state.coach_ok)
    .bind(state.parent_ok)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    mirror_confirmation(&mut tx, interest_id, side).await?;
    tx.commit().await?;

    info!(match_id = row.id, "Created match");
    Ok(Some((Match::from(row), true)))
}

/// Runs `transition` against the stored match, retrying if another writer
/// got there first.
#[instrument(skip(pool))]
pub async fn transition_match(
    pool: &Pool<Sqlite>,
    match_id: i64,
    transition: Transition,
) -> Result<Match, AppError> {
    info!("Applying match transition");

    for attempt in 1..=MAX_ATTEMPTS {
        let mut tx = begin_write(pool).await?;
        let current = fetch_match(&mut tx, match_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))?;

        if let Some(updated) = apply_transition(&mut tx, &current, transition).await? {
            tx.commit().await?;
            return Ok(updated);
        }
        warn!(attempt, "Match changed concurrently, retrying");
    }

    Err(AppError::Conflict(format!(
        "Match {} kept changing, try again",
        match_id
    )))
}

/// Which listing a set of matches hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOwner {
    Need,
    Interest,
}

impl MatchOwner {
    fn column(&self) -> &'static str {
        match self {
            MatchOwner::Need => "coach_need_id",
            MatchOwner::Interest => "wrestler_interest_id",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MatchOwner::Need => "Need",
            MatchOwner::Interest => "Interest",
        }
    }
}

/// Removes the unconfirmed matches (and their messages) hanging off a need
/// or interest that is about to be deleted.
pub(crate) async fn clear_unconfirmed_matches(
    conn: &mut SqliteConnection,
    owner: MatchOwner,
    owner_id: i64,
) -> Result<u64, AppError> {
    let column = owner.column();

    let confirmed: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM matches WHERE {} = ? AND status = 'confirmed'",
        column
    ))
    .bind(owner_id)
    .fetch_one(&mut *conn)
    .await?;

    if confirmed > 0 {
        return Err(AppError::Conflict(format!(
            "{} {} has a confirmed match and cannot be deleted",
            owner.label(),
            owner_id
        )));
    }

    sqlx::query(&format!(
        "DELETE FROM messages WHERE match_id IN (SELECT id FROM matches WHERE {} = ?)",
        column
    ))
    .bind(owner_id)
    .execute(&mut *conn)
    .await?;

    let removed = sqlx::query(&format!("DELETE FROM matches WHERE {} = ?", column))
        .bind(owner_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    info!(removed, "Removed unconfirmed matches");
    Ok(removed)
}

async fn list_matches(
    pool: &Pool<Sqlite>,
    sql: &str,
    scope_id: i64,
    filter: StatusFilter,
) -> Result<Vec<MatchListing>, AppError> {
    let rows = sqlx::query_as::<_, DbMatchListing>(sql)
        .bind(scope_id)
        .bind(filter.status().map(|s| s.as_str()))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(MatchListing::from).collect())
}

#[instrument(skip(pool))]
pub async fn list_matches_for_coach(
    pool: &Pool<Sqlite>,
    coach_user_id: i64,
    filter: StatusFilter,
) -> Result<Vec<MatchListing>, AppError> {
    info!("Listing matches for coach");
    list_matches(pool, listing_query!("m.coach_user_id = ?1"), coach_user_id, filter).await
}

#[instrument(skip(pool))]
pub async fn list_matches_for_wrestler(
    pool: &Pool<Sqlite>,
    wrestler_id: i64,
    filter: StatusFilter,
) -> Result<Vec<MatchListing>, AppError> {
    info!("Listing matches for wrestler");
    list_matches(pool, listing_query!("w.id = ?1"), wrestler_id, filter).await
}

#[instrument(skip(pool))]
pub async fn list_matches_for_need(
    pool: &Pool<Sqlite>,
    need_id: i64,
    filter: StatusFilter,
) -> Result<Vec<MatchListing>, AppError> {
    info!("Listing matches for need");
    list_matches(pool, listing_query!("n.id = ?1"), need_id, filter).await
}

/// One match with its need, interest, wrestler and team display fields.
#[instrument(skip(pool))]
pub async fn get_match_listing(
    pool: &Pool<Sqlite>,
    match_id: i64,
) -> Result<MatchListing, AppError> {
    info!("Fetching match detail");
    list_matches(pool, listing_query!("m.id = ?1"), match_id, StatusFilter::All)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Match {} not found", match_id)))
}
