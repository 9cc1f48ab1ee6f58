use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{Permission, User};
use crate::database::StoreFeatures;
use crate::db;
use crate::error::AppError;
use super::require_wrestler_reader;
use crate::models::{MatchParties, Message, MessageThread, MessagingAccess};

/// Whether messages on `match_id` may be read or written right now. Only
/// the current status counts: closing a confirmed match shuts the channel,
/// though its history stays stored.
#[instrument(skip(pool))]
pub async fn can_access(pool: &Pool<Sqlite>, match_id: i64) -> Result<MessagingAccess, AppError> {
    let m = db::get_match(pool, match_id).await?;
    Ok(MessagingAccess::for_status(m.status))
}

fn require_open(access: MessagingAccess) -> Result<(), AppError> {
    if access.allowed {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "Messaging opens once both sides confirm; this match is {}",
            access.match_status
        )))
    }
}

/// The gate as seen by one participant.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn access_for(
    pool: &Pool<Sqlite>,
    user: &User,
    match_id: i64,
) -> Result<MessagingAccess, AppError> {
    let parties = db::get_match_parties(pool, match_id).await?;
    user.require_participant(&parties)?;
    can_access(pool, match_id).await
}

/// Participant check followed by the gate, for both the read and the write
/// path.
async fn open_channel(
    pool: &Pool<Sqlite>,
    user: &User,
    match_id: i64,
) -> Result<MatchParties, AppError> {
    let parties = db::get_match_parties(pool, match_id).await?;
    user.require_participant(&parties)?;
    require_open(can_access(pool, match_id).await?)?;
    Ok(parties)
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_messages(
    pool: &Pool<Sqlite>,
    features: StoreFeatures,
    user: &User,
    match_id: i64,
) -> Result<Vec<Message>, AppError> {
    open_channel(pool, user, match_id).await?;
    db::list_messages(pool, match_id, features).await
}

#[instrument(skip(pool, user, text), fields(user_id = user.id))]
pub async fn post_message(
    pool: &Pool<Sqlite>,
    features: StoreFeatures,
    user: &User,
    match_id: i64,
    text: &str,
) -> Result<Message, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Message text is required".to_string()));
    }

    let parties = open_channel(pool, user, match_id).await?;
    let receiver_id = parties.counterpart_of(user.id);

    match db::insert_message_if_confirmed(pool, match_id, user.id, receiver_id, text, features)
        .await?
    {
        Some(message) => {
            info!(message_id = message.id, "Message posted");
            Ok(message)
        }
        // closed between the gate and the insert
        None => {
            require_open(can_access(pool, match_id).await?)?;
            Err(AppError::Conflict("Match changed while posting".to_string()))
        }
    }
}

/// Marks messages addressed to the caller as read. Returns how many were
/// updated; always zero when the store lacks read tracking.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn mark_read(
    pool: &Pool<Sqlite>,
    features: StoreFeatures,
    user: &User,
    match_id: i64,
) -> Result<u64, AppError> {
    open_channel(pool, user, match_id).await?;
    if !features.message_read_tracking {
        return Ok(0);
    }
    db::mark_messages_read(pool, match_id, user.id).await
}

pub const INBOX_DEFAULT_LIMIT: i64 = 20;
pub const INBOX_MAX_LIMIT: i64 = 100;

/// A page of a wrestler's inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxPage {
    pub limit: i64,
    pub offset: i64,
}

impl InboxPage {
    /// Clamps the limit to 1..=100 and the offset to zero or more.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(INBOX_DEFAULT_LIMIT)
                .clamp(1, INBOX_MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for InboxPage {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Conversations across all of a wrestler's matches. The gate applies to
/// each match, so only confirmed matches appear.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn wrestler_inbox(
    pool: &Pool<Sqlite>,
    features: StoreFeatures,
    user: &User,
    wrestler_id: i64,
    page: InboxPage,
) -> Result<Vec<MessageThread>, AppError> {
    user.require_permission(Permission::UseMessaging)?;
    let wrestler = db::get_wrestler(pool, wrestler_id).await?;
    require_wrestler_reader(user, &wrestler)?;

    db::list_threads_for_wrestler(
        pool,
        wrestler_id,
        wrestler.parent_user_id,
        features,
        page.limit,
        page.offset,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_page_is_clamped() {
        assert_eq!(InboxPage::default(), InboxPage { limit: 20, offset: 0 });
        assert_eq!(InboxPage::new(Some(0), Some(-5)), InboxPage { limit: 1, offset: 0 });
        assert_eq!(InboxPage::new(Some(500), Some(40)), InboxPage { limit: 100, offset: 40 });
    }
}
