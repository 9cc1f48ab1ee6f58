use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use super::{Permission, Role};
use crate::error::AppError;
use crate::models::{MatchParties, Side};

/// The authenticated principal supplied by the identity provider.
#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub display_name: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub display_name: Option<String>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(user: DbUser) -> Result<Self, Self::Error> {
        let role = Role::from_str(&user.role.unwrap_or_default())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let username = user.username.unwrap_or_default();

        Ok(Self {
            id: user.id.unwrap_or_default(),
            display_name: user.display_name.unwrap_or_else(|| username.clone()),
            username,
            role,
        })
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn is_admin(&self) -> bool {
        self.has_permission(Permission::ActForAnyParty)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(format!(
                "{} may not {:?}",
                self.role, permission
            )))
        }
    }

    /// Owner check for records keyed by a user id; admins pass.
    pub fn require_owner(&self, owner_id: i64, what: &str) -> Result<(), AppError> {
        if self.id == owner_id || self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                owner_id = owner_id,
                what = what,
                "Ownership check failed"
            );
            Err(AppError::Authorization(format!("{} belongs to another user", what)))
        }
    }

    /// A coach confirms for the coach side of their own need, a parent for
    /// the parent side of their own wrestler.
    pub fn require_acts_for(&self, side: Side, parties: &MatchParties) -> Result<(), AppError> {
        if self.is_admin() {
            return Ok(());
        }

        let permission = match side {
            Side::Coach => Permission::ActAsCoach,
            Side::Parent => Permission::ActAsParent,
        };
        self.require_permission(permission)?;

        if parties.user_for(side) == self.id {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                side = %side,
                "Attempt to act for another user's side of a match"
            );
            Err(AppError::Authorization(format!(
                "Only the match's {} may act for that side",
                side
            )))
        }
    }

    pub fn require_participant(&self, parties: &MatchParties) -> Result<(), AppError> {
        if self.is_admin() || parties.includes(self.id) {
            Ok(())
        } else {
            tracing::warn!(username = %self.username, "Non-participant access to match");
            Err(AppError::Authorization(
                "Not a participant in this match".to_string(),
            ))
        }
    }

    /// The side this user confirms for when a request leaves it out.
    pub fn default_side(&self) -> Option<Side> {
        match self.role {
            Role::Coach => Some(Side::Coach),
            Role::Parent => Some(Side::Parent),
            Role::Athlete | Role::Admin => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUserSession {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub token: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
}

impl From<DbUserSession> for UserSession {
    fn from(session: DbUserSession) -> Self {
        Self {
            id: session.id.unwrap_or_default(),
            user_id: session.user_id.unwrap_or_default(),
            token: session.token.unwrap_or_default(),
            created_at: session
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
            // a session with no expiry recorded is treated as already expired
            expires_at: session
                .expires_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl UserSession {
    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }
}
