use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbInterestCandidate, DbNeedCandidate, InterestCandidate, NeedCandidate};

// Shared by both lookup directions so a pair is compatible from either side
// or from neither. `n` is the need, `wi` the interest.
macro_rules! compatible_pair {
    () => {
        "n.is_open = 1
           AND n.weight_class = wi.weight_class
           AND n.age_group_normalized = wi.age_group_normalized
           AND (wi.event_date IS NULL OR n.event_date = wi.event_date)
           AND (wi.event_name IS NULL
                OR instr(lower(n.event_name), lower(wi.event_name)) > 0)"
    };
}

// Only live matches annotate a candidate; a declined or cancelled pairing
// shows as available again.
macro_rules! live_match_join {
    () => {
        "LEFT JOIN matches m
            ON m.coach_need_id = n.id
           AND m.wrestler_interest_id = wi.id
           AND m.status IN ('pending', 'confirmed')"
    };
}

const INTERESTS_FOR_NEED: &str = concat!(
    "SELECT wi.id AS interest_id, w.id AS wrestler_id,
            w.first_name AS wrestler_first_name, w.last_name AS wrestler_last_name,
            wi.event_name, wi.event_date, wi.weight_class, wi.age_group, wi.notes,
            wi.created_at,
            m.id AS match_id, m.status AS match_status,
            m.coach_ok AS match_coach_ok, m.parent_ok AS match_parent_ok
     FROM coach_needs n
     CROSS JOIN wrestler_interests wi
     JOIN wrestlers w ON w.id = wi.wrestler_id
     ",
    live_match_join!(),
    "
     WHERE n.id = ? AND ",
    compatible_pair!(),
    "
     ORDER BY wi.event_date IS NULL, wi.event_date, wi.created_at DESC, wi.id DESC"
);

const NEEDS_FOR_INTEREST: &str = concat!(
    "SELECT n.id AS need_id, n.coach_user_id, u.display_name AS coach_name,
            t.name AS team_name, n.event_name, n.event_date, n.weight_class, n.age_group,
            n.city, n.state, n.notes, n.created_at,
            m.id AS match_id, m.status AS match_status,
            m.coach_ok AS match_coach_ok, m.parent_ok AS match_parent_ok
     FROM wrestler_interests wi
     CROSS JOIN coach_needs n
     LEFT JOIN users u ON u.id = n.coach_user_id
     LEFT JOIN teams t ON t.coach_user_id = n.coach_user_id
     ",
    live_match_join!(),
    "
     WHERE wi.id = ? AND ",
    compatible_pair!(),
    "
     ORDER BY n.event_date IS NULL, n.event_date, n.created_at DESC, n.id DESC"
);

/// Interests compatible with an open need, soonest event first.
#[instrument(skip(pool))]
pub async fn find_interests_for_need(
    pool: &Pool<Sqlite>,
    need_id: i64,
) -> Result<Vec<InterestCandidate>, AppError> {
    info!("Finding candidate interests for need");
    let rows = sqlx::query_as::<_, DbInterestCandidate>(INTERESTS_FOR_NEED)
        .bind(need_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(InterestCandidate::from).collect())
}

/// Open needs compatible with an interest, soonest event first.
#[instrument(skip(pool))]
pub async fn find_needs_for_interest(
    pool: &Pool<Sqlite>,
    interest_id: i64,
) -> Result<Vec<NeedCandidate>, AppError> {
    info!("Finding candidate needs for interest");
    let rows = sqlx::query_as::<_, DbNeedCandidate>(NEEDS_FOR_INTEREST)
        .bind(interest_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(NeedCandidate::from).collect())
}
