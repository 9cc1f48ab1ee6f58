#[cfg(test)]
mod tests {
    use crate::db::{create_interest, create_need, create_or_touch_match};
    use crate::error::AppError;
    use crate::models::{Side, StatusFilter, TeamFields};
    use crate::service::matches::list_wrestler_matches;
    use crate::service::teams::{my_team, save_my_team};
    use crate::test::test_utils::{
        TestDbBuilder, create_standard_test_db, interest_fields, need_fields,
    };

    fn fields(name: &str) -> TeamFields {
        TeamFields {
            name: name.to_string(),
            coach_name: Some("Coach Rivera".to_string()),
            contact_email: Some("rivera@example.com".to_string()),
            ..Default::default()
        }
    }

    #[rocket::async_test]
    async fn test_team_profile_is_created_then_replaced() {
        let test_db = TestDbBuilder::new()
            .coach("new_coach", Some("New Coach"))
            .build()
            .await
            .expect("Failed to build test database");
        let coach = test_db.user("new_coach").await;

        assert!(my_team(&test_db.pool, &coach).await.unwrap().is_none());

        let created = save_my_team(&test_db.pool, &coach, fields("Wolfpack"))
            .await
            .unwrap();
        assert_eq!(created.coach_user_id, coach.id);
        assert_eq!(created.name, "Wolfpack");

        let replaced = save_my_team(
            &test_db.pool,
            &coach,
            TeamFields {
                name: "Wolfpack WC".to_string(),
                city: Some("Reno".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.name, "Wolfpack WC");
        assert_eq!(replaced.coach_name, None);
        assert_eq!(replaced.city.as_deref(), Some("Reno"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(&test_db.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let result = save_my_team(&test_db.pool, &coach, fields("   ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[rocket::async_test]
    async fn test_only_coaches_keep_a_team() {
        let test_db = create_standard_test_db().await;
        let parent = test_db.user("parent_user").await;
        let athlete = test_db.user("athlete_user").await;

        let result = my_team(&test_db.pool, &parent).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));

        let result = save_my_team(&test_db.pool, &athlete, fields("Kids")).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[rocket::async_test]
    async fn test_saved_team_name_shows_on_listings() {
        let test_db = create_standard_test_db().await;
        let other_coach = test_db.user("other_coach").await;
        let parent = test_db.user("parent_user").await;
        let sam = test_db.wrestler_id("Sam").unwrap();

        save_my_team(&test_db.pool, &other_coach, fields("Hawks"))
            .await
            .unwrap();

        let need = create_need(&test_db.pool, other_coach.id, &need_fields("64", "12U"))
            .await
            .unwrap();
        let interest = create_interest(&test_db.pool, sam, &interest_fields("64", "12U"))
            .await
            .unwrap();
        create_or_touch_match(&test_db.pool, need.id, interest.id, Side::Coach)
            .await
            .unwrap();

        let listings = list_wrestler_matches(&test_db.pool, &parent, sam, StatusFilter::All)
            .await
            .unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].team_name.as_deref(), Some("Hawks"));
    }
}
