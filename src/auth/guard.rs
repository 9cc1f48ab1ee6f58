use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use sqlx::SqlitePool;
use tracing::Instrument;

use super::User;
use crate::db::get_session_user;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session_token";

/// A private `session_token` cookie wins over an `Authorization: Bearer`
/// header.
fn session_token(request: &Request<'_>) -> Option<String> {
    if let Some(cookie) = request.cookies().get_private(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = AppError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        authenticate(request)
            .instrument(tracing::info_span!("user_auth_guard"))
            .await
    }
}

async fn authenticate(request: &Request<'_>) -> Outcome<User, AppError> {
    let Some(token) = session_token(request) else {
        return Outcome::Error((
            Status::Unauthorized,
            AppError::Authentication("Authentication required".to_string()),
        ));
    };

    let Some(db) = request.rocket().state::<SqlitePool>() else {
        tracing::error!("Database pool not found in managed state");
        return Outcome::Error((
            Status::InternalServerError,
            AppError::Internal("Database pool missing".to_string()),
        ));
    };

    match get_session_user(db, &token).await {
        Ok(user) => {
            tracing::info!(username = %user.username, role = %user.role.as_str(), "User authenticated via session token");
            Outcome::Success(user)
        }
        Err(err) => {
            let status = err.status_code();
            tracing::warn!(error = %err, "Rejected session token");
            Outcome::Error((status, err))
        }
    }
}
