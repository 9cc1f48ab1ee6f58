use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::database::StoreFeatures;
use crate::error::AppError;
use crate::models::{DbMessage, DbMessageThread, Message, MessageThread};

fn message_columns(features: StoreFeatures) -> &'static str {
    if features.message_read_tracking {
        "id, match_id, sender_id, receiver_id, text, sent_at, read_at"
    } else {
        "id, match_id, sender_id, receiver_id, text, sent_at, NULL AS read_at"
    }
}

#[instrument(skip(pool))]
pub async fn list_messages(
    pool: &Pool<Sqlite>,
    match_id: i64,
    features: StoreFeatures,
) -> Result<Vec<Message>, AppError> {
    info!("Listing messages for match");
    let rows = sqlx::query_as::<_, DbMessage>(&format!(
        "SELECT {} FROM messages WHERE match_id = ? ORDER BY sent_at, id",
        message_columns(features)
    ))
    .bind(match_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Message::from).collect())
}

/// Appends a message, but only while the match is confirmed. The status
/// check and the insert are one statement, so a concurrent decline cannot
/// slip in between. `None` means the match was not confirmed.
#[instrument(skip(pool, text))]
pub async fn insert_message_if_confirmed(
    pool: &Pool<Sqlite>,
    match_id: i64,
    sender_id: i64,
    receiver_id: Option<i64>,
    text: &str,
    features: StoreFeatures,
) -> Result<Option<Message>, AppError> {
    info!("Posting message");
    let row = sqlx::query_as::<_, DbMessage>(&format!(
        "INSERT INTO messages (match_id, sender_id, receiver_id, text, sent_at)
         SELECT ?1, ?2, ?3, ?4, ?5
         WHERE EXISTS (SELECT 1 FROM matches WHERE id = ?1 AND status = 'confirmed')
         RETURNING {}",
        message_columns(features)
    ))
    .bind(match_id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(text)
    .bind(Utc::now().naive_utc())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Message::from))
}

/// Stamps `read_at` on the unread messages addressed to `reader_id`.
#[instrument(skip(pool))]
pub async fn mark_messages_read(
    pool: &Pool<Sqlite>,
    match_id: i64,
    reader_id: i64,
) -> Result<u64, AppError> {
    info!("Marking messages read");
    let result = sqlx::query(
        "UPDATE messages SET read_at = ?1
         WHERE match_id = ?2 AND read_at IS NULL AND sender_id != ?3
           AND (receiver_id = ?3 OR receiver_id IS NULL)",
    )
    .bind(Utc::now().naive_utc())
    .bind(match_id)
    .bind(reader_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Confirmed matches of a wrestler with their latest message, most recently
/// active first. Matches in any other status are left out, since their
/// channel is closed. Unread counts cover messages addressed to
/// `reader_id`.
#[instrument(skip(pool))]
pub async fn list_threads_for_wrestler(
    pool: &Pool<Sqlite>,
    wrestler_id: i64,
    reader_id: i64,
    features: StoreFeatures,
    limit: i64,
    offset: i64,
) -> Result<Vec<MessageThread>, AppError> {
    info!("Listing message threads for wrestler");
    let unread = if features.message_read_tracking {
        "(SELECT COUNT(*) FROM messages x
           WHERE x.match_id = m.id AND x.read_at IS NULL AND x.sender_id != ?2
             AND (x.receiver_id = ?2 OR x.receiver_id IS NULL))"
    } else {
        "NULL"
    };

    let rows = sqlx::query_as::<_, DbMessageThread>(&format!(
        "SELECT m.id AS match_id, m.status AS match_status,
                n.event_name, n.event_date, n.weight_class, n.age_group,
                t.name AS team_name,
                (SELECT x.text FROM messages x WHERE x.match_id = m.id
                  ORDER BY x.sent_at DESC, x.id DESC LIMIT 1) AS last_text,
                (SELECT x.sent_at FROM messages x WHERE x.match_id = m.id
                  ORDER BY x.sent_at DESC, x.id DESC LIMIT 1) AS last_sent_at,
                {} AS unread
         FROM matches m
         JOIN coach_needs n ON n.id = m.coach_need_id
         JOIN wrestler_interests wi ON wi.id = m.wrestler_interest_id
         LEFT JOIN teams t ON t.coach_user_id = m.coach_user_id
         WHERE wi.wrestler_id = ?1 AND m.status = 'confirmed'
         ORDER BY last_sent_at DESC, m.id DESC
         LIMIT ?3 OFFSET ?4",
        unread
    ))
    .bind(wrestler_id)
    .bind(reader_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MessageThread::from).collect())
}
