use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::{self, Json};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use super::MatchListingsResponse;
use crate::auth::User;
use crate::error::AppError;
use crate::models::{Match, MatchListing, MessagingAccess, StatusFilter};
use crate::service::{matches, messaging};
use crate::validation::JsonValidateExt;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMatchRequest {
    #[serde(alias = "needId")]
    #[validate(range(min = 1, message = "need_id must be positive"))]
    pub need_id: i64,
    #[serde(alias = "interestId")]
    #[validate(range(min = 1, message = "interest_id must be positive"))]
    pub interest_id: i64,
    pub side: Option<String>,
}

/// Body of confirm, decline and cancel. It may be omitted entirely, in which
/// case the caller's role picks the side.
#[derive(Debug, Default, Deserialize)]
pub struct SideRequest {
    pub side: Option<String>,
}

type SideBody<'r> = Result<Json<SideRequest>, json::Error<'r>>;

/// Only an empty body means "no side given". A body that is present but
/// unreadable is rejected rather than falling back to the caller's role.
fn requested_side(body: SideBody<'_>) -> Result<Option<String>, AppError> {
    match body {
        Ok(Json(request)) => Ok(request.side),
        Err(json::Error::Parse(raw, _)) if raw.trim().is_empty() => Ok(None),
        Err(e) => Err(AppError::Validation(format!("Invalid request body: {}", e))),
    }
}

#[derive(Serialize)]
pub struct MatchResponse {
    pub ok: bool,
    #[serde(rename = "match")]
    pub record: Match,
    #[serde(rename = "alreadyExists", skip_serializing_if = "std::ops::Not::not")]
    pub already_exists: bool,
}

impl MatchResponse {
    fn new(record: Match) -> Self {
        Self {
            ok: true,
            record,
            already_exists: false,
        }
    }
}

#[derive(Serialize)]
pub struct MatchDetailResponse {
    pub ok: bool,
    #[serde(rename = "match")]
    pub listing: MatchListing,
}

#[derive(Serialize)]
pub struct MessagingAccessResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub access: MessagingAccess,
}

#[get("/matches?<status>")]
pub async fn api_list_matches(
    status: Option<&str>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MatchListingsResponse>, AppError> {
    let filter = StatusFilter::parse(status)?;
    let matches = matches::list_coach_matches(db, &user, filter).await?;
    Ok(Json(MatchListingsResponse { ok: true, matches }))
}

/// 201 when a new match row was written, 200 with `alreadyExists` when the
/// pair already had an active match (the caller's side is still confirmed).
#[post("/matches", data = "<body>")]
pub async fn api_create_match(
    user: User,
    db: &State<Pool<Sqlite>>,
    body: Json<CreateMatchRequest>,
) -> Result<Custom<Json<MatchResponse>>, AppError> {
    let body = body.validated()?;
    let (record, created) = matches::propose_match(
        db,
        &user,
        body.need_id,
        body.interest_id,
        body.side.as_deref(),
    )
    .await?;

    let status = if created { Status::Created } else { Status::Ok };
    Ok(Custom(
        status,
        Json(MatchResponse {
            already_exists: !created,
            ..MatchResponse::new(record)
        }),
    ))
}

#[get("/matches/<id>")]
pub async fn api_get_match(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MatchDetailResponse>, AppError> {
    let listing = matches::get_match(db, &user, id).await?;
    Ok(Json(MatchDetailResponse { ok: true, listing }))
}

#[get("/matches/<id>/messaging")]
pub async fn api_messaging_access(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessagingAccessResponse>, AppError> {
    let access = messaging::access_for(db, &user, id).await?;
    Ok(Json(MessagingAccessResponse { ok: true, access }))
}

#[post("/matches/<id>/confirm", data = "<body>")]
pub async fn api_confirm_match<'r>(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    body: SideBody<'r>,
) -> Result<Json<MatchResponse>, AppError> {
    let side = requested_side(body)?;
    let record = matches::confirm_match(db, &user, id, side.as_deref()).await?;
    Ok(Json(MatchResponse::new(record)))
}

#[post("/matches/<id>/decline", data = "<body>")]
pub async fn api_decline_match<'r>(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    body: SideBody<'r>,
) -> Result<Json<MatchResponse>, AppError> {
    let side = requested_side(body)?;
    let record = matches::decline_match(db, &user, id, side.as_deref()).await?;
    Ok(Json(MatchResponse::new(record)))
}

#[post("/matches/<id>/cancel", data = "<body>")]
pub async fn api_cancel_match<'r>(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    body: SideBody<'r>,
) -> Result<Json<MatchResponse>, AppError> {
    let side = requested_side(body)?;
    let record = matches::cancel_match(db, &user, id, side.as_deref()).await?;
    Ok(Json(MatchResponse::new(record)))
}
