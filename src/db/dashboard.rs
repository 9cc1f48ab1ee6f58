use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::database::StoreFeatures;
use crate::error::AppError;
use crate::models::{DashboardSummary, MatchCounts, MessageCounts};

/// Restricts `matches m` (joined to `wrestler_interests wi`) to one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryScope {
    Wrestler(i64),
    Coach(i64),
}

impl SummaryScope {
    fn filter(&self) -> &'static str {
        match self {
            SummaryScope::Wrestler(_) => "wi.wrestler_id = ?",
            SummaryScope::Coach(_) => "m.coach_user_id = ?",
        }
    }

    fn id(&self) -> i64 {
        match self {
            SummaryScope::Wrestler(id) | SummaryScope::Coach(id) => *id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DbMessageCounts {
    total: i64,
    unread: Option<i64>,
}

/// Match and message counts for a wrestler or a coach. Unread counts only
/// include messages addressed to `owner_user_id` (the same rows
/// `mark_messages_read` stamps), and are `None` when the store lacks read
/// tracking.
#[instrument(skip(pool))]
pub async fn summarize(
    pool: &Pool<Sqlite>,
    scope: SummaryScope,
    owner_user_id: i64,
    features: StoreFeatures,
) -> Result<DashboardSummary, AppError> {
    info!("Summarizing matches and messages");

    let matches = sqlx::query_as::<_, MatchCounts>(&format!(
        "SELECT COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN m.status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN m.status = 'confirmed' THEN 1 ELSE 0 END), 0) AS confirmed
         FROM matches m
         JOIN wrestler_interests wi ON wi.id = m.wrestler_interest_id
         WHERE {}",
        scope.filter()
    ))
    .bind(scope.id())
    .fetch_one(pool)
    .await?;

    let unread_expr = if features.message_read_tracking {
        "COALESCE(SUM(CASE WHEN msg.read_at IS NULL AND msg.sender_id != ?
                  AND (msg.receiver_id = ? OR msg.receiver_id IS NULL)
             THEN 1 ELSE 0 END), 0)"
    } else {
        "NULL"
    };

    let sql = format!(
        "SELECT COUNT(msg.id) AS total, {} AS unread
         FROM messages msg
         JOIN matches m ON m.id = msg.match_id
         JOIN wrestler_interests wi ON wi.id = m.wrestler_interest_id
         WHERE {}",
        unread_expr,
        scope.filter()
    );
    let mut query = sqlx::query_as::<_, DbMessageCounts>(&sql);
    if features.message_read_tracking {
        query = query.bind(owner_user_id).bind(owner_user_id);
    }
    let messages = query.bind(scope.id()).fetch_one(pool).await?;

    Ok(DashboardSummary {
        matches,
        messages: MessageCounts {
            total: messages.total,
            unread: messages.unread,
        },
        error: None,
    })
}
