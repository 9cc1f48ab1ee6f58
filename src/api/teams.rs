use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::User;
use crate::error::AppError;
use crate::models::{Team, TeamFields};
use crate::normalize::non_blank;
use crate::service::teams;
use crate::validation::JsonValidateExt;

#[derive(Debug, Deserialize, Validate)]
pub struct SaveTeamRequest {
    #[serde(alias = "teamName")]
    #[validate(length(min = 1, max = 200, message = "Team name is required"))]
    pub name: String,
    #[serde(alias = "coachName")]
    #[validate(length(max = 200))]
    pub coach_name: Option<String>,
    #[serde(alias = "contactEmail")]
    #[validate(email(message = "Contact email is not a valid address"))]
    pub contact_email: Option<String>,
    #[serde(alias = "logoPath")]
    #[validate(length(max = 500))]
    pub logo_path: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl SaveTeamRequest {
    fn into_fields(self) -> TeamFields {
        TeamFields {
            name: self.name.trim().to_string(),
            coach_name: non_blank(self.coach_name.as_deref()),
            contact_email: non_blank(self.contact_email.as_deref()),
            logo_path: non_blank(self.logo_path.as_deref()),
            city: non_blank(self.city.as_deref()),
            state: non_blank(self.state.as_deref()),
        }
    }
}

#[derive(Serialize)]
pub struct TeamResponse {
    pub ok: bool,
    pub team: Option<Team>,
}

#[get("/coach/team")]
pub async fn api_get_team(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = teams::my_team(db, &user).await?;
    Ok(Json(TeamResponse { ok: true, team }))
}

#[put("/coach/team", data = "<body>")]
pub async fn api_save_team(
    user: User,
    db: &State<Pool<Sqlite>>,
    body: Json<SaveTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let fields = body.validated()?.into_fields();
    let team = teams::save_my_team(db, &user, fields).await?;
    Ok(Json(TeamResponse {
        ok: true,
        team: Some(team),
    }))
}
