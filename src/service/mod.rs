//! Core operations with the acting principal made explicit. Routes parse
//! and validate input, then call in here; nothing below reads ambient
//! request state.

pub mod candidates;
pub mod dashboard;
pub mod listings;
pub mod matches;
pub mod messaging;
pub mod teams;

use crate::auth::User;
use crate::error::AppError;
use crate::models::Wrestler;

/// Parents and the athlete themselves may read a wrestler's data.
pub(crate) fn require_wrestler_reader(user: &User, wrestler: &Wrestler) -> Result<(), AppError> {
    if wrestler.athlete_user_id == Some(user.id) {
        return Ok(());
    }
    user.require_owner(wrestler.parent_user_id, "Wrestler")
}
