use sqlx::{Pool, Sqlite};
use tracing::instrument;

use super::require_wrestler_reader;
use crate::auth::User;
use crate::db;
use crate::error::AppError;
use crate::models::{CandidateList, Interest, InterestCandidate, Need, NeedCandidate};

const LOOKUP_FAILED: &str = "Candidate lookup is temporarily unavailable";

/// Interests compatible with one of the caller's needs. A failed lookup
/// yields an empty list with `error` set; a missing or foreign need is
/// still an error.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn candidates_for_need(
    pool: &Pool<Sqlite>,
    user: &User,
    need_id: i64,
) -> Result<(Need, CandidateList<InterestCandidate>), AppError> {
    let need = db::get_need(pool, need_id).await?;
    user.require_owner(need.coach_user_id, "Need")?;

    let candidates = match db::find_interests_for_need(pool, need_id).await {
        Ok(found) => CandidateList::found(found),
        Err(e) => {
            e.log_and_record("Finding candidate interests");
            CandidateList::failed(LOOKUP_FAILED)
        }
    };

    Ok((need, candidates))
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn candidates_for_interest(
    pool: &Pool<Sqlite>,
    user: &User,
    interest_id: i64,
) -> Result<(Interest, CandidateList<NeedCandidate>), AppError> {
    let interest = db::get_interest(pool, interest_id).await?;
    let wrestler = db::get_wrestler(pool, interest.wrestler_id).await?;
    require_wrestler_reader(user, &wrestler)?;

    let candidates = match db::find_needs_for_interest(pool, interest_id).await {
        Ok(found) => CandidateList::found(found),
        Err(e) => {
            e.log_and_record("Finding candidate needs");
            CandidateList::failed(LOOKUP_FAILED)
        }
    };

    Ok((interest, candidates))
}
