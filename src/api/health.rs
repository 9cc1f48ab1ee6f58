use rocket::State;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::auth::{Role, User};
use crate::error::AppError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub database: bool,
}

#[get("/health")]
pub async fn health(db: &State<Pool<Sqlite>>) -> Json<HealthResponse> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(db.inner())
        .await
    {
        Ok(_) => true,
        Err(e) => {
            AppError::from(e).log_and_record("Health check");
            false
        }
    };

    Json(HealthResponse { ok: true, database })
}

#[derive(Serialize)]
pub struct MeResponse {
    pub ok: bool,
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

#[get("/me")]
pub fn api_me(user: User) -> Json<MeResponse> {
    Json(MeResponse {
        ok: true,
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        role: user.role,
    })
}
