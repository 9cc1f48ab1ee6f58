use sqlx::{Pool, Sqlite};
use tracing::instrument;

use super::require_wrestler_reader;
use crate::auth::{Permission, User};
use crate::database::StoreFeatures;
use crate::db::{self, SummaryScope};
use crate::error::AppError;
use crate::models::DashboardSummary;

const SUMMARY_FAILED: &str = "Counts are temporarily unavailable";

async fn summarize_or_degrade(
    pool: &Pool<Sqlite>,
    scope: SummaryScope,
    owner_user_id: i64,
    features: StoreFeatures,
) -> DashboardSummary {
    match db::summarize(pool, scope, owner_user_id, features).await {
        Ok(summary) => summary,
        Err(e) => {
            e.log_and_record("Summarizing dashboard counts");
            DashboardSummary::failed(SUMMARY_FAILED)
        }
    }
}

/// Counts for one wrestler. Unread means not yet read and not sent by the
/// wrestler's parent.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn wrestler_summary(
    pool: &Pool<Sqlite>,
    features: StoreFeatures,
    user: &User,
    wrestler_id: i64,
) -> Result<DashboardSummary, AppError> {
    let wrestler = db::get_wrestler(pool, wrestler_id).await?;
    require_wrestler_reader(user, &wrestler)?;

    Ok(summarize_or_degrade(
        pool,
        SummaryScope::Wrestler(wrestler_id),
        wrestler.parent_user_id,
        features,
    )
    .await)
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn coach_summary(
    pool: &Pool<Sqlite>,
    features: StoreFeatures,
    user: &User,
) -> Result<DashboardSummary, AppError> {
    user.require_permission(Permission::ActAsCoach)?;

    Ok(summarize_or_degrade(pool, SummaryScope::Coach(user.id), user.id, features).await)
}
