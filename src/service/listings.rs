//! Ownership-checked CRUD for the records the match engine works over.

use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use super::require_wrestler_reader;
use crate::auth::{Permission, User};
use crate::db::{self, NewWrestler};
use crate::error::AppError;
use crate::models::{Interest, InterestFields, Need, NeedFields, Wrestler};

/// Partial update of a need. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct NeedPatch {
    pub event_name: Option<String>,
    pub event_date: Option<Option<NaiveDate>>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub is_open: Option<bool>,
}

impl NeedPatch {
    pub fn apply(self, mut fields: NeedFields) -> NeedFields {
        if let Some(v) = self.event_name {
            fields.event_name = v;
        }
        if let Some(v) = self.event_date {
            fields.event_date = v;
        }
        if let Some(v) = self.weight_class {
            fields.weight_class = v;
        }
        if let Some(v) = self.age_group {
            fields.age_group = v;
        }
        if let Some(v) = self.city {
            fields.city = v;
        }
        if let Some(v) = self.state {
            fields.state = v;
        }
        if let Some(v) = self.notes {
            fields.notes = v;
        }
        if let Some(v) = self.is_open {
            fields.is_open = v;
        }
        fields
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterestPatch {
    pub event_name: Option<Option<String>>,
    pub event_date: Option<Option<NaiveDate>>,
    pub weight_class: Option<String>,
    pub age_group: Option<String>,
    pub notes: Option<Option<String>>,
}

impl InterestPatch {
    pub fn apply(self, mut fields: InterestFields) -> InterestFields {
        if let Some(v) = self.event_name {
            fields.event_name = v;
        }
        if let Some(v) = self.event_date {
            fields.event_date = v;
        }
        if let Some(v) = self.weight_class {
            fields.weight_class = v;
        }
        if let Some(v) = self.age_group {
            fields.age_group = v;
        }
        if let Some(v) = self.notes {
            fields.notes = v;
        }
        fields
    }
}

fn require_filled(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

fn check_need(fields: &NeedFields) -> Result<(), AppError> {
    require_filled("event_name", &fields.event_name)?;
    require_filled("weight_class", &fields.weight_class)?;
    require_filled("age_group", &fields.age_group)
}

fn check_interest(fields: &InterestFields) -> Result<(), AppError> {
    require_filled("weight_class", &fields.weight_class)?;
    require_filled("age_group", &fields.age_group)
}

async fn owned_need(pool: &Pool<Sqlite>, user: &User, need_id: i64) -> Result<Need, AppError> {
    user.require_permission(Permission::ManageNeeds)?;
    let need = db::get_need(pool, need_id).await?;
    user.require_owner(need.coach_user_id, "Need")?;
    Ok(need)
}

async fn owned_wrestler(
    pool: &Pool<Sqlite>,
    user: &User,
    wrestler_id: i64,
) -> Result<Wrestler, AppError> {
    user.require_permission(Permission::ManageInterests)?;
    let wrestler = db::get_wrestler(pool, wrestler_id).await?;
    user.require_owner(wrestler.parent_user_id, "Wrestler")?;
    Ok(wrestler)
}

async fn owned_interest(
    pool: &Pool<Sqlite>,
    user: &User,
    interest_id: i64,
) -> Result<Interest, AppError> {
    let interest = db::get_interest(pool, interest_id).await?;
    owned_wrestler(pool, user, interest.wrestler_id).await?;
    Ok(interest)
}

#[instrument(skip(pool, user, fields), fields(user_id = user.id))]
pub async fn create_need(
    pool: &Pool<Sqlite>,
    user: &User,
    fields: NeedFields,
) -> Result<Need, AppError> {
    user.require_permission(Permission::ManageNeeds)?;
    check_need(&fields)?;
    db::create_need(pool, user.id, &fields).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_my_needs(pool: &Pool<Sqlite>, user: &User) -> Result<Vec<Need>, AppError> {
    user.require_permission(Permission::ManageNeeds)?;
    db::list_needs_for_coach(pool, user.id).await
}

#[instrument(skip(pool, user, patch), fields(user_id = user.id))]
pub async fn update_need(
    pool: &Pool<Sqlite>,
    user: &User,
    need_id: i64,
    patch: NeedPatch,
) -> Result<Need, AppError> {
    let need = owned_need(pool, user, need_id).await?;
    let fields = patch.apply(NeedFields::from(need));
    check_need(&fields)?;
    db::update_need(pool, need_id, &fields).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn close_need(pool: &Pool<Sqlite>, user: &User, need_id: i64) -> Result<Need, AppError> {
    owned_need(pool, user, need_id).await?;
    db::close_need(pool, need_id).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn delete_need(pool: &Pool<Sqlite>, user: &User, need_id: i64) -> Result<(), AppError> {
    owned_need(pool, user, need_id).await?;
    db::delete_need(pool, need_id).await
}

#[instrument(skip(pool, user, wrestler), fields(user_id = user.id))]
pub async fn create_wrestler(
    pool: &Pool<Sqlite>,
    user: &User,
    wrestler: NewWrestler,
) -> Result<Wrestler, AppError> {
    user.require_permission(Permission::ManageWrestlers)?;
    require_filled("first_name", &wrestler.first_name)?;
    db::create_wrestler(pool, user.id, &wrestler).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_my_wrestlers(pool: &Pool<Sqlite>, user: &User) -> Result<Vec<Wrestler>, AppError> {
    db::list_wrestlers_for_user(pool, user.id).await
}

#[instrument(skip(pool, user, fields), fields(user_id = user.id))]
pub async fn create_interest(
    pool: &Pool<Sqlite>,
    user: &User,
    wrestler_id: i64,
    fields: InterestFields,
) -> Result<Interest, AppError> {
    owned_wrestler(pool, user, wrestler_id).await?;
    check_interest(&fields)?;
    db::create_interest(pool, wrestler_id, &fields).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn list_interests(
    pool: &Pool<Sqlite>,
    user: &User,
    wrestler_id: i64,
) -> Result<Vec<Interest>, AppError> {
    let wrestler = db::get_wrestler(pool, wrestler_id).await?;
    require_wrestler_reader(user, &wrestler)?;
    db::list_interests_for_wrestler(pool, wrestler_id).await
}

#[instrument(skip(pool, user, patch), fields(user_id = user.id))]
pub async fn update_interest(
    pool: &Pool<Sqlite>,
    user: &User,
    interest_id: i64,
    patch: InterestPatch,
) -> Result<Interest, AppError> {
    let interest = owned_interest(pool, user, interest_id).await?;
    let fields = patch.apply(InterestFields::from(interest));
    check_interest(&fields)?;
    db::update_interest(pool, interest_id, &fields).await
}

#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn delete_interest(
    pool: &Pool<Sqlite>,
    user: &User,
    interest_id: i64,
) -> Result<(), AppError> {
    owned_interest(pool, user, interest_id).await?;
    db::delete_interest(pool, interest_id).await
}
