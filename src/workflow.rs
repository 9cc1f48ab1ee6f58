//! Two-party confirmation state machine for matches.
//!
//! The `coach_ok` / `parent_ok` flags are the source of truth. `status` is
//! derived from them unless the match was explicitly declined or cancelled,
//! which are terminal. Confirmation only ever raises a flag, so applying
//! confirmations in any order, any number of times, converges on one state.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{MatchStatus, Side};

/// Status implied by the flags, keeping an explicit closure if one was stored.
pub fn derive_status(stored: Option<MatchStatus>, coach_ok: bool, parent_ok: bool) -> MatchStatus {
    match stored {
        Some(status) if status.is_closed() => status,
        _ if coach_ok && parent_ok => MatchStatus::Confirmed,
        _ => MatchStatus::Pending,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    Decline,
    Cancel,
}

impl Closure {
    pub fn status(&self) -> MatchStatus {
        match self {
            Closure::Decline => MatchStatus::Declined,
            Closure::Cancel => MatchStatus::Cancelled,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("match is {0} and can no longer be confirmed")]
    Closed(MatchStatus),
    #[error("match is already {current}, it cannot become {requested}")]
    AlreadyClosed {
        current: MatchStatus,
        requested: MatchStatus,
    },
}

impl From<TransitionError> for AppError {
    fn from(error: TransitionError) -> Self {
        AppError::Conflict(error.to_string())
    }
}

/// The mutable part of a match row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchState {
    pub status: MatchStatus,
    pub coach_ok: bool,
    pub parent_ok: bool,
    pub confirmed_at: Option<NaiveDateTime>,
}

impl MatchState {
    /// A fresh match: the proposing side has agreed, the other has not.
    pub fn proposed_by(side: Side) -> Self {
        Self {
            status: MatchStatus::Pending,
            coach_ok: side == Side::Coach,
            parent_ok: side == Side::Parent,
            confirmed_at: None,
        }
    }

    pub fn flag(&self, side: Side) -> bool {
        match side {
            Side::Coach => self.coach_ok,
            Side::Parent => self.parent_ok,
        }
    }

    fn set_flag(&mut self, side: Side, value: bool) {
        match side {
            Side::Coach => self.coach_ok = value,
            Side::Parent => self.parent_ok = value,
        }
    }

    /// Records `side`'s agreement. Re-confirming is a no-op; `confirmed_at`
    /// is stamped the first time both flags are up and never changes after.
    pub fn confirm(self, side: Side, now: NaiveDateTime) -> Result<Self, TransitionError> {
        if self.status.is_closed() {
            return Err(TransitionError::Closed(self.status));
        }

        let mut next = self;
        next.set_flag(side, true);
        next.status = derive_status(None, next.coach_ok, next.parent_ok);

        if next.status == MatchStatus::Confirmed && next.confirmed_at.is_none() {
            next.confirmed_at = Some(now);
        }

        Ok(next)
    }

    /// Declines or cancels on behalf of `side`, withdrawing its flag so a
    /// closed match never looks agreed by both parties.
    pub fn close(self, closure: Closure, side: Side) -> Result<Self, TransitionError> {
        let target = closure.status();
        if self.status == target {
            return Ok(self);
        }
        if self.status.is_closed() {
            return Err(TransitionError::AlreadyClosed {
                current: self.status,
                requested: target,
            });
        }

        let mut next = self;
        next.set_flag(side, false);
        next.status = target;
        Ok(next)
    }

    pub fn is_consistent(&self) -> bool {
        self.status.is_closed()
            || (self.status == MatchStatus::Confirmed) == (self.coach_ok && self.parent_ok)
    }
}
