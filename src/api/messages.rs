use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::User;
use crate::database::StoreFeatures;
use crate::error::AppError;
use crate::models::Message;
use crate::service::messaging;
use crate::validation::JsonValidateExt;

#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message text is required"))]
    pub text: String,
}

#[derive(Serialize)]
pub struct MessagesResponse {
    pub ok: bool,
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub message: Message,
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub ok: bool,
    pub updated: u64,
}

#[get("/messages/<match_id>")]
pub async fn api_list_messages(
    match_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    features: &State<StoreFeatures>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = messaging::list_messages(db, **features, &user, match_id).await?;
    Ok(Json(MessagesResponse { ok: true, messages }))
}

#[post("/messages/<match_id>", data = "<body>")]
pub async fn api_post_message(
    match_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    features: &State<StoreFeatures>,
    body: Json<PostMessageRequest>,
) -> Result<Custom<Json<MessageResponse>>, AppError> {
    let body = body.validated()?;
    let message = messaging::post_message(db, **features, &user, match_id, &body.text).await?;
    Ok(Custom(
        Status::Created,
        Json(MessageResponse { ok: true, message }),
    ))
}

#[post("/messages/<match_id>/read")]
pub async fn api_mark_read(
    match_id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    features: &State<StoreFeatures>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let updated = messaging::mark_read(db, **features, &user, match_id).await?;
    Ok(Json(MarkReadResponse { ok: true, updated }))
}
