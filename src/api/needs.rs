use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::{DeletedResponse, MatchListingsResponse, event_date};
use crate::auth::User;
use crate::error::AppError;
use crate::models::{CandidateList, InterestCandidate, Need, NeedFields, StatusFilter};
use crate::normalize::{non_blank, parse_event_date};
use crate::service::{candidates, listings, matches};
use crate::service::listings::NeedPatch;
use crate::validation::{JsonValidateExt, double_option};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNeedRequest {
    #[validate(length(min = 1, max = 200, message = "Event name is required"))]
    pub event_name: String,
    pub event_date: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Weight class is required"))]
    pub weight_class: String,
    #[validate(length(min = 1, max = 50, message = "Age group is required"))]
    pub age_group: String,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl CreateNeedRequest {
    fn into_fields(self) -> Result<NeedFields, AppError> {
        Ok(NeedFields {
            event_date: event_date(self.event_date.as_deref())?,
            event_name: self.event_name.trim().to_string(),
            weight_class: self.weight_class.trim().to_string(),
            age_group: self.age_group,
            city: non_blank(self.city.as_deref()),
            state: non_blank(self.state.as_deref()),
            notes: non_blank(self.notes.as_deref()),
            is_open: true,
        })
    }
}

/// Absent fields are left alone; `null` clears the optional ones.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNeedRequest {
    #[validate(length(min = 1, max = 200, message = "Event name cannot be empty"))]
    pub event_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_date: Option<Option<String>>,
    #[validate(length(min = 1, max = 20, message = "Weight class cannot be empty"))]
    pub weight_class: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Age group cannot be empty"))]
    pub age_group: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub is_open: Option<bool>,
}

impl UpdateNeedRequest {
    fn into_patch(self) -> Result<NeedPatch, AppError> {
        let event_date = match self.event_date {
            Some(Some(raw)) => Some(parse_event_date(&raw)?),
            Some(None) => Some(None),
            None => None,
        };

        Ok(NeedPatch {
            event_name: self.event_name.map(|s| s.trim().to_string()),
            event_date,
            weight_class: self.weight_class.map(|s| s.trim().to_string()),
            age_group: self.age_group,
            city: self.city.map(|v| non_blank(v.as_deref())),
            state: self.state.map(|v| non_blank(v.as_deref())),
            notes: self.notes.map(|v| non_blank(v.as_deref())),
            is_open: self.is_open,
        })
    }
}

#[derive(Serialize)]
pub struct NeedResponse {
    pub ok: bool,
    pub need: Need,
}

#[derive(Serialize)]
pub struct NeedsResponse {
    pub ok: bool,
    pub needs: Vec<Need>,
}

#[derive(Serialize)]
pub struct NeedCandidatesResponse {
    pub ok: bool,
    pub need: Need,
    #[serde(flatten)]
    pub candidates: CandidateList<InterestCandidate>,
}

#[post("/needs", data = "<body>")]
pub async fn api_create_need(
    user: User,
    db: &State<Pool<Sqlite>>,
    body: Json<CreateNeedRequest>,
) -> Result<Custom<Json<NeedResponse>>, AppError> {
    let fields = body.validated()?.into_fields()?;
    let need = listings::create_need(db, &user, fields).await?;
    Ok(Custom(Status::Created, Json(NeedResponse { ok: true, need })))
}

#[get("/needs")]
pub async fn api_list_needs(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<NeedsResponse>, AppError> {
    let needs = listings::list_my_needs(db, &user).await?;
    Ok(Json(NeedsResponse { ok: true, needs }))
}

#[patch("/needs/<id>", data = "<body>")]
pub async fn api_update_need(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    body: Json<UpdateNeedRequest>,
) -> Result<Json<NeedResponse>, AppError> {
    let patch = body.validated()?.into_patch()?;
    let need = listings::update_need(db, &user, id, patch).await?;
    Ok(Json(NeedResponse { ok: true, need }))
}

#[post("/needs/<id>/close")]
pub async fn api_close_need(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<NeedResponse>, AppError> {
    let need = listings::close_need(db, &user, id).await?;
    Ok(Json(NeedResponse { ok: true, need }))
}

#[delete("/needs/<id>")]
pub async fn api_delete_need(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DeletedResponse>, AppError> {
    listings::delete_need(db, &user, id).await?;
    Ok(Json(DeletedResponse {
        ok: true,
        deleted: id,
    }))
}

#[get("/needs/<id>/candidates")]
pub async fn api_need_candidates(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<NeedCandidatesResponse>, AppError> {
    let (need, candidates) = candidates::candidates_for_need(db, &user, id).await?;
    Ok(Json(NeedCandidatesResponse {
        ok: true,
        need,
        candidates,
    }))
}

#[get("/needs/<id>/matches?<status>")]
pub async fn api_need_matches(
    id: i64,
    status: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MatchListingsResponse>, AppError> {
    let filter = StatusFilter::parse(status)?;
    let matches = matches::list_need_matches(db, &user, id, filter).await?;
    Ok(Json(MatchListingsResponse { ok: true, matches }))
}
