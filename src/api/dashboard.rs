use rocket::{Responder, State};
use rocket::http::Header;
use rocket::serde::json::Json;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::auth::User;
use crate::database::StoreFeatures;
use crate::error::AppError;
use crate::models::DashboardSummary;
use crate::service::dashboard;

/// Counts are non-critical, so clients may show a slightly stale copy.
pub const SUMMARY_CACHE_CONTROL: &str = "private, max-age=15, stale-while-revalidate=60";

#[derive(Serialize)]
pub struct SummaryBody {
    pub ok: bool,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}

#[derive(Responder)]
pub struct SummaryResponse {
    inner: Json<SummaryBody>,
    cache_control: Header<'static>,
}

impl From<DashboardSummary> for SummaryResponse {
    fn from(summary: DashboardSummary) -> Self {
        Self {
            inner: Json(SummaryBody { ok: true, summary }),
            cache_control: Header::new("Cache-Control", SUMMARY_CACHE_CONTROL),
        }
    }
}

#[get("/wrestlers/<id>/summary")]
pub async fn api_wrestler_summary(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
    features: &State<StoreFeatures>,
) -> Result<SummaryResponse, AppError> {
    let summary = dashboard::wrestler_summary(db, **features, &user, id).await?;
    Ok(summary.into())
}

#[get("/coach/summary")]
pub async fn api_coach_summary(
    user: User,
    db: &State<Pool<Sqlite>>,
    features: &State<StoreFeatures>,
) -> Result<SummaryResponse, AppError> {
    let summary = dashboard::coach_summary(db, **features, &user).await?;
    Ok(summary.into())
}
