//! JSON routes mounted under `/api`. Handlers parse and validate the request
//! body, then hand the principal and the parsed values to `crate::service`.

mod dashboard;
mod health;
mod interests;
mod matches;
mod messages;
mod needs;
mod teams;
mod wrestlers;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Catcher, Request, Route};
use serde::Serialize;

use crate::error::{AppError, ErrorResponse};
use crate::models::MatchListing;
use crate::normalize::parse_event_date;

pub use dashboard::SUMMARY_CACHE_CONTROL;

pub fn routes() -> Vec<Route> {
    routes![
        health::health,
        health::api_me,
        needs::api_create_need,
        needs::api_list_needs,
        needs::api_update_need,
        needs::api_close_need,
        needs::api_delete_need,
        needs::api_need_candidates,
        needs::api_need_matches,
        wrestlers::api_create_wrestler,
        wrestlers::api_list_wrestlers,
        wrestlers::api_list_interests,
        wrestlers::api_create_interest,
        wrestlers::api_wrestler_matches,
        wrestlers::api_wrestler_inbox,
        interests::api_update_interest,
        interests::api_delete_interest,
        interests::api_interest_candidates,
        matches::api_list_matches,
        matches::api_create_match,
        matches::api_get_match,
        matches::api_messaging_access,
        matches::api_confirm_match,
        matches::api_decline_match,
        matches::api_cancel_match,
        messages::api_list_messages,
        messages::api_post_message,
        messages::api_mark_read,
        dashboard::api_wrestler_summary,
        dashboard::api_coach_summary,
        teams::api_get_team,
        teams::api_save_team,
    ]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        unprocessable,
        default_catcher
    ]
}

fn error_body(status: Status, error: &str, message: &str) -> Json<ErrorResponse> {
    tracing::debug!(status = status.code, error, "Serving JSON catcher");
    Json(ErrorResponse {
        ok: false,
        error: error.to_string(),
        message: message.to_string(),
        fields: None,
    })
}

#[catch(400)]
fn bad_request(_req: &Request) -> Json<ErrorResponse> {
    error_body(Status::BadRequest, "invalid_argument", "Malformed request")
}

#[catch(401)]
fn unauthorized(_req: &Request) -> Json<ErrorResponse> {
    error_body(
        Status::Unauthorized,
        "authentication_error",
        "Authentication required",
    )
}

#[catch(403)]
fn forbidden(_req: &Request) -> Json<ErrorResponse> {
    error_body(Status::Forbidden, "forbidden", "Access denied")
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ErrorResponse> {
    error_body(
        Status::NotFound,
        "not_found",
        &format!("No route for {} {}", req.method(), req.uri().path()),
    )
}

// Rocket answers 422 when a JSON body does not deserialize.
#[catch(422)]
fn unprocessable(_req: &Request) -> Json<ErrorResponse> {
    error_body(
        Status::UnprocessableEntity,
        "invalid_argument",
        "Request body could not be parsed",
    )
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> Json<ErrorResponse> {
    error_body(status, "error", status.reason_lossy())
}

#[derive(Serialize)]
pub struct MatchListingsResponse {
    pub ok: bool,
    pub matches: Vec<MatchListing>,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
    pub deleted: i64,
}

/// Optional event date field of a request body.
pub(crate) fn event_date(raw: Option<&str>) -> Result<Option<chrono::NaiveDate>, AppError> {
    match raw {
        Some(raw) => parse_event_date(raw),
        None => Ok(None),
    }
}
