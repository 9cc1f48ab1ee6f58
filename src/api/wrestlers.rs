use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::{MatchListingsResponse, event_date};
use crate::auth::User;
use crate::database::StoreFeatures;
use crate::db::NewWrestler;
use crate::error::AppError;
use crate::models::{Interest, InterestFields, MessageThread, StatusFilter, Wrestler};
use crate::normalize::non_blank;
use crate::service::messaging::{self, InboxPage};
use crate::service::{listings, matches};
use crate::validation::JsonValidateExt;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWrestlerRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub athlete_user_id: Option<i64>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInterestRequest {
    #[validate(length(max = 200))]
    pub event_name: Option<String>,
    pub event_date: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Weight class is required"))]
    pub weight_class: String,
    #[validate(length(min = 1, max = 50, message = "Age group is required"))]
    pub age_group: String,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl CreateInterestRequest {
    fn into_fields(self) -> Result<InterestFields, AppError> {
        Ok(InterestFields {
            event_date: event_date(self.event_date.as_deref())?,
            event_name: non_blank(self.event_name.as_deref()),
            weight_class: self.weight_class.trim().to_string(),
            age_group: self.age_group,
            notes: non_blank(self.notes.as_deref()),
        })
    }
}

#[derive(Serialize)]
pub struct WrestlerResponse {
    pub ok: bool,
    pub wrestler: Wrestler,
}

#[derive(Serialize)]
pub struct WrestlersResponse {
    pub ok: bool,
    pub wrestlers: Vec<Wrestler>,
}

#[derive(Serialize)]
pub struct InterestResponse {
    pub ok: bool,
    pub interest: Interest,
}

#[derive(Serialize)]
pub struct PageInfo {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Serialize)]
pub struct InboxResponse {
    pub ok: bool,
    pub threads: Vec<MessageThread>,
    pub page: PageInfo,
}

#[derive(Serialize)]
pub struct InterestsResponse {
    pub ok: bool,
    pub interests: Vec<Interest>,
}

#[post("/wrestlers", data = "<body>")]
pub async fn api_create_wrestler(
    user: User,
    db: &State<Pool<Sqlite>>,
    body: Json<CreateWrestlerRequest>,
) -> Result<Custom<Json<WrestlerResponse>>, AppError> {
    let body = body.validated()?;
    let new = NewWrestler {
        athlete_user_id: body.athlete_user_id,
        first_name: body.first_name.trim().to_string(),
        last_name: non_blank(body.last_name.as_deref()),
        city: non_blank(body.city.as_deref()),
        state: non_blank(body.state.as_deref()),
    };

    let wrestler = listings::create_wrestler(db, &user, new).await?;
    Ok(Custom(
        Status::Created,
        Json(WrestlerResponse { ok: true, wrestler }),
    ))
}

#[get("/wrestlers")]
pub async fn api_list_wrestlers(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<WrestlersResponse>, AppError> {
    let wrestlers = listings::list_my_wrestlers(db, &user).await?;
    Ok(Json(WrestlersResponse {
        ok: true,
        wrestlers,
    }))
}

#[get("/wrestlers/<id>/interests")]
pub async fn api_list_interests(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<InterestsResponse>, AppError> {
    let interests = listings::list_interests(db, &user, id).await?;
    Ok(Json(InterestsResponse {
        ok: true,
        interests,
    }))
}

#[post("/wrestlers/<id>/interests", data = "<body>")]
pub async fn api_create_interest(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    body: Json<CreateInterestRequest>,
) -> Result<Custom<Json<InterestResponse>>, AppError> {
    let fields = body.validated()?.into_fields()?;
    let interest = listings::create_interest(db, &user, id, fields).await?;
    Ok(Custom(
        Status::Created,
        Json(InterestResponse { ok: true, interest }),
    ))
}

#[get("/wrestlers/<id>/matches?<status>")]
pub async fn api_wrestler_matches(
    id: i64,
    status: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MatchListingsResponse>, AppError> {
    let filter = StatusFilter::parse(status)?;
    let matches = matches::list_wrestler_matches(db, &user, id, filter).await?;
    Ok(Json(MatchListingsResponse { ok: true, matches }))
}

#[get("/wrestlers/<id>/messages?<limit>&<offset>")]
pub async fn api_wrestler_inbox(
    id: i64,
    limit: Option<i64>,
    offset: Option<i64>,
    user: User,
    db: &State<Pool<Sqlite>>,
    features: &State<StoreFeatures>,
) -> Result<Json<InboxResponse>, AppError> {
    let page = InboxPage::new(limit, offset);
    let threads = messaging::wrestler_inbox(db, **features, &user, id, page).await?;
    Ok(Json(InboxResponse {
        ok: true,
        threads,
        page: PageInfo {
            limit: page.limit,
            offset: page.offset,
        },
    }))
}
