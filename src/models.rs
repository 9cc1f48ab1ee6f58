use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::workflow::derive_status;

/// Which of the two parties a confirmation (or withdrawal) is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Coach,
    Parent,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Coach => "coach",
            Side::Parent => "parent",
        }
    }
}

impl FromStr for Side {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coach" => Ok(Side::Coach),
            "parent" => Ok(Side::Parent),
            other => Err(AppError::Validation(format!(
                "side must be \"coach\" or \"parent\", got \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::Declined => "declined",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    /// Declined and cancelled rows no longer count as the pair's match.
    pub fn is_closed(&self) -> bool {
        matches!(self, MatchStatus::Declined | MatchStatus::Cancelled)
    }
}

impl FromStr for MatchStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "confirmed" => Ok(MatchStatus::Confirmed),
            "declined" => Ok(MatchStatus::Declined),
            "cancelled" => Ok(MatchStatus::Cancelled),
            other => Err(AppError::Validation(format!("Unknown match status: {}", other))),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter for match listings. `all` removes the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Pending,
    Confirmed,
    Declined,
    Cancelled,
    All,
}

impl StatusFilter {
    pub fn status(&self) -> Option<MatchStatus> {
        match self {
            StatusFilter::Pending => Some(MatchStatus::Pending),
            StatusFilter::Confirmed => Some(MatchStatus::Confirmed),
            StatusFilter::Declined => Some(MatchStatus::Declined),
            StatusFilter::Cancelled => Some(MatchStatus::Cancelled),
            StatusFilter::All => None,
        }
    }

    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(StatusFilter::default()),
            Some("all") => Ok(StatusFilter::All),
            Some(other) => Ok(match other.parse::<MatchStatus>()? {
                MatchStatus::Pending => StatusFilter::Pending,
                MatchStatus::Confirmed => StatusFilter::Confirmed,
                MatchStatus::Declined => StatusFilter::Declined,
                MatchStatus::Cancelled => StatusFilter::Cancelled,
            }),
        }
    }
}

pub(crate) fn to_utc(dt: NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)
}

fn to_utc_or_now(dt: Option<NaiveDateTime>) -> DateTime<Utc> {
    dt.map(to_utc).unwrap_or_else(Utc::now)
}

#[derive(Debug, Serialize, Clone)]
pub struct Need {
    pub id: i64,
    pub coach_user_id: i64,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub age_group_normalized: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub notes: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbNeed {
    pub id: Option<i64>,
    pub coach_user_id: Option<i64>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub age_group_normalized: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub notes: Option<String>,
    pub is_open: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbNeed> for Need {
    fn from(db: DbNeed) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            coach_user_id: db.coach_user_id.unwrap_or_default(),
            event_name: db.event_name.unwrap_or_default(),
            event_date: db.event_date,
            weight_class: db.weight_class.unwrap_or_default(),
            age_group: db.age_group.unwrap_or_default(),
            age_group_normalized: db.age_group_normalized.unwrap_or_default(),
            city: db.city,
            state: db.state,
            notes: db.notes,
            is_open: db.is_open.unwrap_or_default(),
            created_at: to_utc_or_now(db.created_at),
            updated_at: to_utc_or_now(db.updated_at),
        }
    }
}

/// Validated field values for inserting or rewriting a need.
#[derive(Debug, Clone)]
pub struct NeedFields {
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub notes: Option<String>,
    pub is_open: bool,
}

impl From<Need> for NeedFields {
    fn from(need: Need) -> Self {
        Self {
            event_name: need.event_name,
            event_date: need.event_date,
            weight_class: need.weight_class,
            age_group: need.age_group,
            city: need.city,
            state: need.state,
            notes: need.notes,
            is_open: need.is_open,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Team {
    pub id: i64,
    pub coach_user_id: i64,
    pub name: String,
    pub coach_name: Option<String>,
    pub contact_email: Option<String>,
    pub logo_path: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbTeam {
    pub id: Option<i64>,
    pub coach_user_id: Option<i64>,
    pub name: Option<String>,
    pub coach_name: Option<String>,
    pub contact_email: Option<String>,
    pub logo_path: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl From<DbTeam> for Team {
    fn from(db: DbTeam) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            coach_user_id: db.coach_user_id.unwrap_or_default(),
            name: db.name.unwrap_or_default(),
            coach_name: db.coach_name,
            contact_email: db.contact_email,
            logo_path: db.logo_path,
            city: db.city,
            state: db.state,
        }
    }
}

/// A coach's team profile as written by the coach. `name` is required.
#[derive(Debug, Clone, Default)]
pub struct TeamFields {
    pub name: String,
    pub coach_name: Option<String>,
    pub contact_email: Option<String>,
    pub logo_path: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Wrestler {
    pub id: i64,
    pub parent_user_id: i64,
    pub athlete_user_id: Option<i64>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbWrestler {
    pub id: Option<i64>,
    pub parent_user_id: Option<i64>,
    pub athlete_user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbWrestler> for Wrestler {
    fn from(db: DbWrestler) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            parent_user_id: db.parent_user_id.unwrap_or_default(),
            athlete_user_id: db.athlete_user_id,
            first_name: db.first_name.unwrap_or_default(),
            last_name: db.last_name,
            city: db.city,
            state: db.state,
            created_at: to_utc_or_now(db.created_at),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Interest {
    pub id: i64,
    pub wrestler_id: i64,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub age_group_normalized: String,
    pub notes: Option<String>,
    /// Display-only mirror of match confirmations, never consulted for state.
    pub parent_ok: bool,
    pub coach_ok: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbInterest {
    pub id: Option<i64>,
    pub wrestler_id: Option<i64>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub age_group_normalized: Option<String>,
    pub notes: Option<String>,
    pub parent_ok: Option<bool>,
    pub coach_ok: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbInterest> for Interest {
    fn from(db: DbInterest) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            wrestler_id: db.wrestler_id.unwrap_or_default(),
            event_name: db.event_name,
            event_date: db.event_date,
            weight_class: db.weight_class.unwrap_or_default(),
            age_group: db.age_group.unwrap_or_default(),
            age_group_normalized: db.age_group_normalized.unwrap_or_default(),
            notes: db.notes,
            parent_ok: db.parent_ok.unwrap_or_default(),
            coach_ok: db.coach_ok.unwrap_or_default(),
            created_at: to_utc_or_now(db.created_at),
            updated_at: to_utc_or_now(db.updated_at),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterestFields {
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub notes: Option<String>,
}

impl From<Interest> for InterestFields {
    fn from(interest: Interest) -> Self {
        Self {
            event_name: interest.event_name,
            event_date: interest.event_date,
            weight_class: interest.weight_class,
            age_group: interest.age_group,
            notes: interest.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Match {
    pub id: i64,
    pub coach_need_id: i64,
    pub wrestler_interest_id: i64,
    pub coach_user_id: i64,
    pub status: MatchStatus,
    pub coach_ok: bool,
    pub parent_ok: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbMatch {
    pub id: Option<i64>,
    pub coach_need_id: Option<i64>,
    pub wrestler_interest_id: Option<i64>,
    pub coach_user_id: Option<i64>,
    pub status: Option<String>,
    pub coach_ok: Option<bool>,
    pub parent_ok: Option<bool>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<DbMatch> for Match {
    fn from(db: DbMatch) -> Self {
        let coach_ok = db.coach_ok.unwrap_or_default();
        let parent_ok = db.parent_ok.unwrap_or_default();
        let stored = db.status.as_deref().and_then(|s| s.parse().ok());

        Self {
            id: db.id.unwrap_or_default(),
            coach_need_id: db.coach_need_id.unwrap_or_default(),
            wrestler_interest_id: db.wrestler_interest_id.unwrap_or_default(),
            coach_user_id: db.coach_user_id.unwrap_or_default(),
            status: derive_status(stored, coach_ok, parent_ok),
            coach_ok,
            parent_ok,
            confirmed_at: db.confirmed_at.map(to_utc),
            created_at: to_utc_or_now(db.created_at),
            updated_at: to_utc_or_now(db.updated_at),
        }
    }
}

/// The users allowed to act on, or read from, one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct MatchParties {
    pub coach_user_id: i64,
    pub parent_user_id: i64,
    pub athlete_user_id: Option<i64>,
}

impl MatchParties {
    pub fn user_for(&self, side: Side) -> i64 {
        match side {
            Side::Coach => self.coach_user_id,
            Side::Parent => self.parent_user_id,
        }
    }

    pub fn includes(&self, user_id: i64) -> bool {
        self.coach_user_id == user_id
            || self.parent_user_id == user_id
            || self.athlete_user_id == Some(user_id)
    }

    /// The party a message from `sender_id` is addressed to.
    pub fn counterpart_of(&self, sender_id: i64) -> Option<i64> {
        if sender_id == self.coach_user_id {
            Some(self.parent_user_id)
        } else if sender_id == self.parent_user_id || self.athlete_user_id == Some(sender_id) {
            Some(self.coach_user_id)
        } else {
            None
        }
    }
}

/// A match row joined with the display fields of its need, interest,
/// wrestler and team.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchListing {
    pub id: i64,
    pub status: MatchStatus,
    pub coach_ok: bool,
    pub parent_ok: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub need_id: i64,
    pub interest_id: i64,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub interest_notes: Option<String>,
    pub wrestler_id: i64,
    pub wrestler_first_name: String,
    pub wrestler_last_name: Option<String>,
    pub team_name: Option<String>,
    pub coach_name: Option<String>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbMatchListing {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub coach_ok: Option<bool>,
    pub parent_ok: Option<bool>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub need_id: Option<i64>,
    pub interest_id: Option<i64>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub interest_notes: Option<String>,
    pub wrestler_id: Option<i64>,
    pub wrestler_first_name: Option<String>,
    pub wrestler_last_name: Option<String>,
    pub team_name: Option<String>,
    pub coach_name: Option<String>,
}

impl From<DbMatchListing> for MatchListing {
    fn from(db: DbMatchListing) -> Self {
        let coach_ok = db.coach_ok.unwrap_or_default();
        let parent_ok = db.parent_ok.unwrap_or_default();
        let stored = db.status.as_deref().and_then(|s| s.parse().ok());

        Self {
            id: db.id.unwrap_or_default(),
            status: derive_status(stored, coach_ok, parent_ok),
            coach_ok,
            parent_ok,
            confirmed_at: db.confirmed_at.map(to_utc),
            created_at: to_utc_or_now(db.created_at),
            need_id: db.need_id.unwrap_or_default(),
            interest_id: db.interest_id.unwrap_or_default(),
            event_name: db.event_name.unwrap_or_default(),
            event_date: db.event_date,
            weight_class: db.weight_class.unwrap_or_default(),
            age_group: db.age_group.unwrap_or_default(),
            interest_notes: db.interest_notes,
            wrestler_id: db.wrestler_id.unwrap_or_default(),
            wrestler_first_name: db.wrestler_first_name.unwrap_or_default(),
            wrestler_last_name: db.wrestler_last_name,
            team_name: db.team_name,
            coach_name: db.coach_name,
        }
    }
}

/// The existing active match, if any, for a candidate pair.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchAnnotation {
    pub match_id: i64,
    pub status: MatchStatus,
    pub coach_ok: bool,
    pub parent_ok: bool,
}

fn annotation(
    match_id: Option<i64>,
    status: Option<String>,
    coach_ok: Option<bool>,
    parent_ok: Option<bool>,
) -> Option<MatchAnnotation> {
    let match_id = match_id?;
    let coach_ok = coach_ok.unwrap_or_default();
    let parent_ok = parent_ok.unwrap_or_default();
    let stored = status.as_deref().and_then(|s| s.parse().ok());
    Some(MatchAnnotation {
        match_id,
        status: derive_status(stored, coach_ok, parent_ok),
        coach_ok,
        parent_ok,
    })
}

/// An interest surfaced for a need.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InterestCandidate {
    pub interest_id: i64,
    pub wrestler_id: i64,
    pub wrestler_first_name: String,
    pub wrestler_last_name: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub existing_match: Option<MatchAnnotation>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbInterestCandidate {
    pub interest_id: Option<i64>,
    pub wrestler_id: Option<i64>,
    pub wrestler_first_name: Option<String>,
    pub wrestler_last_name: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub match_id: Option<i64>,
    pub match_status: Option<String>,
    pub match_coach_ok: Option<bool>,
    pub match_parent_ok: Option<bool>,
}

impl From<DbInterestCandidate> for InterestCandidate {
    fn from(db: DbInterestCandidate) -> Self {
        Self {
            interest_id: db.interest_id.unwrap_or_default(),
            wrestler_id: db.wrestler_id.unwrap_or_default(),
            wrestler_first_name: db.wrestler_first_name.unwrap_or_default(),
            wrestler_last_name: db.wrestler_last_name,
            event_name: db.event_name,
            event_date: db.event_date,
            weight_class: db.weight_class.unwrap_or_default(),
            age_group: db.age_group.unwrap_or_default(),
            notes: db.notes,
            created_at: to_utc_or_now(db.created_at),
            existing_match: annotation(
                db.match_id,
                db.match_status,
                db.match_coach_ok,
                db.match_parent_ok,
            ),
        }
    }
}

/// An open need surfaced for an interest.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NeedCandidate {
    pub need_id: i64,
    pub coach_user_id: i64,
    pub coach_name: Option<String>,
    pub team_name: Option<String>,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub existing_match: Option<MatchAnnotation>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbNeedCandidate {
    pub need_id: Option<i64>,
    pub coach_user_id: Option<i64>,
    pub coach_name: Option<String>,
    pub team_name: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub match_id: Option<i64>,
    pub match_status: Option<String>,
    pub match_coach_ok: Option<bool>,
    pub match_parent_ok: Option<bool>,
}

impl From<DbNeedCandidate> for NeedCandidate {
    fn from(db: DbNeedCandidate) -> Self {
        Self {
            need_id: db.need_id.unwrap_or_default(),
            coach_user_id: db.coach_user_id.unwrap_or_default(),
            coach_name: db.coach_name,
            team_name: db.team_name,
            event_name: db.event_name.unwrap_or_default(),
            event_date: db.event_date,
            weight_class: db.weight_class.unwrap_or_default(),
            age_group: db.age_group.unwrap_or_default(),
            city: db.city,
            state: db.state,
            notes: db.notes,
            created_at: to_utc_or_now(db.created_at),
            existing_match: annotation(
                db.match_id,
                db.match_status,
                db.match_coach_ok,
                db.match_parent_ok,
            ),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: i64,
    pub match_id: i64,
    pub sender_id: i64,
    pub receiver_id: Option<i64>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbMessage {
    pub id: Option<i64>,
    pub match_id: Option<i64>,
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub text: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub read_at: Option<NaiveDateTime>,
}

impl From<DbMessage> for Message {
    fn from(db: DbMessage) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            match_id: db.match_id.unwrap_or_default(),
            sender_id: db.sender_id.unwrap_or_default(),
            receiver_id: db.receiver_id,
            text: db.text.unwrap_or_default(),
            sent_at: to_utc_or_now(db.sent_at),
            read_at: db.read_at.map(to_utc),
        }
    }
}

/// One confirmed match in a wrestler's inbox, with its latest message.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageThread {
    pub match_id: i64,
    pub match_status: MatchStatus,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub weight_class: String,
    pub age_group: String,
    pub team_name: Option<String>,
    pub last_text: Option<String>,
    pub last_sent_at: Option<DateTime<Utc>>,
    /// `None` when the store does not track read receipts.
    pub unread: Option<i64>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbMessageThread {
    pub match_id: Option<i64>,
    pub match_status: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub team_name: Option<String>,
    pub last_text: Option<String>,
    pub last_sent_at: Option<NaiveDateTime>,
    pub unread: Option<i64>,
}

impl From<DbMessageThread> for MessageThread {
    fn from(db: DbMessageThread) -> Self {
        Self {
            match_id: db.match_id.unwrap_or_default(),
            match_status: db
                .match_status
                .and_then(|s| s.parse().ok())
                .unwrap_or(MatchStatus::Confirmed),
            event_name: db.event_name.unwrap_or_default(),
            event_date: db.event_date,
            weight_class: db.weight_class.unwrap_or_default(),
            age_group: db.age_group.unwrap_or_default(),
            team_name: db.team_name,
            last_text: db.last_text,
            last_sent_at: db.last_sent_at.map(to_utc),
            unread: db.unread,
        }
    }
}

/// Result of consulting the messaging gate for one match.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessagingAccess {
    pub allowed: bool,
    pub match_status: MatchStatus,
}

impl MessagingAccess {
    pub fn for_status(match_status: MatchStatus) -> Self {
        Self {
            allowed: match_status == MatchStatus::Confirmed,
            match_status,
        }
    }
}

/// Candidates found for a need or an interest. `error` is set, and the list
/// left empty, when the lookup itself failed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CandidateList<T> {
    pub candidates: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CandidateList<T> {
    pub fn found(candidates: Vec<T>) -> Self {
        Self {
            candidates,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            candidates: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct MatchCounts {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageCounts {
    pub total: i64,
    /// `None` when the store does not track read receipts.
    pub unread: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub matches: MatchCounts,
    pub messages: MessageCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DashboardSummary {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
