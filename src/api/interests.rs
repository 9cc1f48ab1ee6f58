use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::DeletedResponse;
use crate::auth::User;
use crate::error::AppError;
use crate::models::{CandidateList, Interest, NeedCandidate};
use crate::normalize::{non_blank, parse_event_date};
use crate::service::listings::{self, InterestPatch};
use crate::service::candidates;
use crate::validation::{JsonValidateExt, double_option};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInterestRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub event_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_date: Option<Option<String>>,
    #[validate(length(min = 1, max = 20, message = "Weight class cannot be empty"))]
    pub weight_class: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Age group cannot be empty"))]
    pub age_group: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl UpdateInterestRequest {
    fn into_patch(self) -> Result<InterestPatch, AppError> {
        let event_date = match self.event_date {
            Some(Some(raw)) => Some(parse_event_date(&raw)?),
            Some(None) => Some(None),
            None => None,
        };

        Ok(InterestPatch {
            event_name: self.event_name.map(|v| non_blank(v.as_deref())),
            event_date,
            weight_class: self.weight_class.map(|s| s.trim().to_string()),
            age_group: self.age_group,
            notes: self.notes.map(|v| non_blank(v.as_deref())),
        })
    }
}

#[derive(Serialize)]
pub struct InterestResponse {
    pub ok: bool,
    pub interest: Interest,
}

#[derive(Serialize)]
pub struct InterestCandidatesResponse {
    pub ok: bool,
    pub interest: Interest,
    #[serde(flatten)]
    pub candidates: CandidateList<NeedCandidate>,
}

#[patch("/interests/<id>", data = "<body>")]
pub async fn api_update_interest(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    body: Json<UpdateInterestRequest>,
) -> Result<Json<InterestResponse>, AppError> {
    let patch = body.validated()?.into_patch()?;
    let interest = listings::update_interest(db, &user, id, patch).await?;
    Ok(Json(InterestResponse { ok: true, interest }))
}

#[delete("/interests/<id>")]
pub async fn api_delete_interest(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DeletedResponse>, AppError> {
    listings::delete_interest(db, &user, id).await?;
    Ok(Json(DeletedResponse {
        ok: true,
        deleted: id,
    }))
}

#[get("/interests/<id>/candidates")]
pub async fn api_interest_candidates(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<InterestCandidatesResponse>, AppError> {
    let (interest, candidates) = candidates::candidates_for_interest(db, &user, id).await?;
    Ok(Json(InterestCandidatesResponse {
        ok: true,
        interest,
        candidates,
    }))
}
