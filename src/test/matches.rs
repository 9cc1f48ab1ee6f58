#[cfg(test)]
mod tests {
    use crate::db::{
        Transition, create_interest, create_need, create_or_touch_match, get_interest, get_match,
        transition_match,
    };
    use crate::error::AppError;
    use crate::models::{Match, MatchStatus, Side, StatusFilter};
    use crate::service::listings::{delete_interest, delete_need};
    use crate::service::matches::{
        cancel_match, confirm_match, decline_match, get_match as get_match_detail,
        list_coach_matches, list_wrestler_matches, propose_match,
    };
    use crate::test::test_utils::{
        TestDb, create_standard_test_db, file_pool, interest_fields, need_fields,
        standard_builder,
    };
    use crate::workflow::Closure;

    /// A need of `coach_user` and an interest of Sam, both 64 / 12U.
    async fn pair(test_db: &TestDb) -> (i64, i64) {
        let coach_id = test_db.user_id("coach_user").unwrap();
        let need = create_need(&test_db.pool, coach_id, &need_fields("64", "12U"))
            .await
            .expect("Failed to create need");
        let interest = create_interest(
            &test_db.pool,
            test_db.wrestler_id("Sam").unwrap(),
            &interest_fields("64", "12 and under"),
        )
        .await
        .expect("Failed to create interest");
        (need.id, interest.id)
    }

    async fn match_count(test_db: &TestDb) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM matches")
            .fetch_one(&test_db.pool)
            .await
            .unwrap()
    }

    fn agreement(m: &Match) -> (MatchStatus, bool, bool) {
        (m.status, m.coach_ok, m.parent_ok)
    }

    #[rocket::async_test]
    async fn test_coach_proposal_then_parent_confirmation() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;
        let coach = test_db.user("coach_user").await;
        let parent = test_db.user("parent_user").await;

        let (m, created) = propose_match(&test_db.pool, &coach, need_id, interest_id, None)
            .await
            .expect("Coach should be able to propose");
        assert!(created);
        assert_eq!(agreement(&m), (MatchStatus::Pending, true, false));
        assert!(m.confirmed_at.is_none());

        let confirmed = confirm_match(&test_db.pool, &parent, m.id, None)
            .await
            .expect("Parent should be able to confirm");
        assert_eq!(agreement(&confirmed), (MatchStatus::Confirmed, true, true));
        assert!(confirmed.confirmed_at.is_some());

        // the interest's display flag follows the parent's confirmation
        let interest = get_interest(&test_db.pool, interest_id).await.unwrap();
        assert!(interest.parent_ok);
        assert!(interest.coach_ok);
    }

    #[rocket::async_test]
    async fn test_confirm_is_idempotent_and_confirmed_at_is_stable() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;

        let (m, _) = create_or_touch_match(&test_db.pool, need_id, interest_id, Side::Coach)
            .await
            .unwrap();
        let first = transition_match(&test_db.pool, m.id, Transition::Confirm(Side::Parent))
            .await
            .unwrap();
        let stamped = first.confirmed_at.expect("confirmed_at should be set");

        for side in [Side::Parent, Side::Coach, Side::Parent] {
            let again = transition_match(&test_db.pool, m.id, Transition::Confirm(side))
                .await
                .unwrap();
            assert_eq!(again, first);
            assert_eq!(again.confirmed_at, Some(stamped));
        }
    }

    #[rocket::async_test]
    async fn test_confirmation_order_does_not_matter() {
        let test_db = create_standard_test_db().await;
        let (need_a, interest_a) = pair(&test_db).await;
        let (need_b, interest_b) = pair(&test_db).await;

        // same creating side for both, confirmations in opposite orders
        let (a, _) = create_or_touch_match(&test_db.pool, need_a, interest_a, Side::Coach)
            .await
            .unwrap();
        let (b, _) = create_or_touch_match(&test_db.pool, need_b, interest_b, Side::Coach)
            .await
            .unwrap();

        transition_match(&test_db.pool, a.id, Transition::Confirm(Side::Coach))
            .await
            .unwrap();
        let a = transition_match(&test_db.pool, a.id, Transition::Confirm(Side::Parent))
            .await
            .unwrap();

        transition_match(&test_db.pool, b.id, Transition::Confirm(Side::Parent))
            .await
            .unwrap();
        let b = transition_match(&test_db.pool, b.id, Transition::Confirm(Side::Coach))
            .await
            .unwrap();

        assert_eq!(agreement(&a), agreement(&b));
        assert_eq!(agreement(&a), (MatchStatus::Confirmed, true, true));
    }

    #[rocket::async_test]
    async fn test_second_create_touches_existing_row() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;

        let (first, created) =
            create_or_touch_match(&test_db.pool, need_id, interest_id, Side::Parent)
                .await
                .unwrap();
        assert!(created);
        assert_eq!(agreement(&first), (MatchStatus::Pending, false, true));

        let (second, created) =
            create_or_touch_match(&test_db.pool, need_id, interest_id, Side::Coach)
                .await
                .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, MatchStatus::Confirmed);

        let (third, created) =
            create_or_touch_match(&test_db.pool, need_id, interest_id, Side::Coach)
                .await
                .unwrap();
        assert!(!created);
        assert_eq!(third, second);

        assert_eq!(match_count(&test_db).await, 1);
    }

    #[rocket::async_test]
    async fn test_concurrent_creates_converge_on_one_row() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;

        let (a, b) = rocket::tokio::join!(
            create_or_touch_match(&test_db.pool, need_id, interest_id, Side::Coach),
            create_or_touch_match(&test_db.pool, need_id, interest_id, Side::Parent),
        );
        let (a, a_created) = a.unwrap();
        let (b, b_created) = b.unwrap();

        assert_eq!(a.id, b.id);
        assert!(a_created != b_created);
        assert_eq!(match_count(&test_db).await, 1);

        let stored = get_match(&test_db.pool, a.id).await.unwrap();
        assert_eq!(agreement(&stored), (MatchStatus::Confirmed, true, true));
    }

    #[rocket::async_test]
    async fn test_concurrent_creates_converge_across_connections() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pool = file_pool(&dir).await;
        let test_db = standard_builder()
            .build_on(pool)
            .await
            .expect("Failed to build file database");

        let mut pairs = Vec::new();
        for _ in 0..20 {
            pairs.push(pair(&test_db).await);
        }

        let mut handles = Vec::new();
        for &(need_id, interest_id) in &pairs {
            for side in [Side::Coach, Side::Parent] {
                let pool = test_db.pool.clone();
                handles.push(rocket::tokio::spawn(async move {
                    create_or_touch_match(&pool, need_id, interest_id, side).await
                }));
            }
        }

        let mut created = 0;
        for handle in handles {
            let (_, inserted) = handle
                .await
                .expect("Task panicked")
                .expect("Concurrent create should settle, not fail");
            if inserted {
                created += 1;
            }
        }
        assert_eq!(created, pairs.len());

        for (need_id, interest_id) in pairs {
            let rows: Vec<(String, bool, bool)> = sqlx::query_as(
                "SELECT status, coach_ok, parent_ok FROM matches
                 WHERE coach_need_id = ? AND wrestler_interest_id = ?",
            )
            .bind(need_id)
            .bind(interest_id)
            .fetch_all(&test_db.pool)
            .await
            .unwrap();
            assert_eq!(rows, vec![("confirmed".to_string(), true, true)]);
        }
    }

    #[rocket::async_test]
    async fn test_decline_then_recreate() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;
        let coach = test_db.user("coach_user").await;
        let parent = test_db.user("parent_user").await;

        let (m, _) = propose_match(&test_db.pool, &coach, need_id, interest_id, None)
            .await
            .unwrap();
        let declined = decline_match(&test_db.pool, &parent, m.id, None)
            .await
            .unwrap();
        assert_eq!(agreement(&declined), (MatchStatus::Declined, true, false));

        // declining again changes nothing
        let again = decline_match(&test_db.pool, &parent, m.id, None)
            .await
            .unwrap();
        assert_eq!(again, declined);

        let (fresh, created) = propose_match(&test_db.pool, &coach, need_id, interest_id, None)
            .await
            .unwrap();
        assert!(created);
        assert_ne!(fresh.id, m.id);
        assert_eq!(agreement(&fresh), (MatchStatus::Pending, true, false));
        assert_eq!(match_count(&test_db).await, 2);
    }

    #[rocket::async_test]
    async fn test_closed_matches_reject_other_transitions() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;

        let (m, _) = create_or_touch_match(&test_db.pool, need_id, interest_id, Side::Coach)
            .await
            .unwrap();
        let cancelled = transition_match(
            &test_db.pool,
            m.id,
            Transition::Close(Closure::Cancel, Side::Coach),
        )
        .await
        .unwrap();
        assert_eq!(agreement(&cancelled), (MatchStatus::Cancelled, false, false));

        let confirm = transition_match(&test_db.pool, m.id, Transition::Confirm(Side::Parent)).await;
        assert!(matches!(confirm, Err(AppError::Conflict(_))));

        let decline = transition_match(
            &test_db.pool,
            m.id,
            Transition::Close(Closure::Decline, Side::Parent),
        )
        .await;
        assert!(matches!(decline, Err(AppError::Conflict(_))));
    }

    #[rocket::async_test]
    async fn test_confirmed_match_can_be_cancelled() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;
        let coach = test_db.user("coach_user").await;
        let parent = test_db.user("parent_user").await;

        let (m, _) = propose_match(&test_db.pool, &coach, need_id, interest_id, None)
            .await
            .unwrap();
        let confirmed = confirm_match(&test_db.pool, &parent, m.id, None)
            .await
            .unwrap();

        let cancelled = cancel_match(&test_db.pool, &parent, m.id, None)
            .await
            .unwrap();
        assert_eq!(agreement(&cancelled), (MatchStatus::Cancelled, true, false));
        assert_eq!(cancelled.confirmed_at, confirmed.confirmed_at);
    }

    #[rocket::async_test]
    async fn test_only_the_owning_party_may_act() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;
        let coach = test_db.user("coach_user").await;
        let other_coach = test_db.user("other_coach").await;
        let parent = test_db.user("parent_user").await;
        let other_parent = test_db.user("other_parent").await;
        let admin = test_db.user("admin_user").await;

        let result = propose_match(&test_db.pool, &other_coach, need_id, interest_id, None).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));

        let (m, _) = propose_match(&test_db.pool, &coach, need_id, interest_id, None)
            .await
            .unwrap();

        let result = confirm_match(&test_db.pool, &other_parent, m.id, None).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));

        // a parent cannot confirm the coach's side
        let result = confirm_match(&test_db.pool, &parent, m.id, Some("coach")).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));

        // admins must say which side they act for
        let result = confirm_match(&test_db.pool, &admin, m.id, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let confirmed = confirm_match(&test_db.pool, &admin, m.id, Some("parent"))
            .await
            .unwrap();
        assert_eq!(confirmed.status, MatchStatus::Confirmed);
    }

    #[rocket::async_test]
    async fn test_missing_match_and_bad_side() {
        let test_db = create_standard_test_db().await;
        let parent = test_db.user("parent_user").await;

        let result = confirm_match(&test_db.pool, &parent, 9999, None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = confirm_match(&test_db.pool, &parent, 9999, Some("guardian")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[rocket::async_test]
    async fn test_listings_filter_by_status() {
        let test_db = create_standard_test_db().await;
        let (need_a, interest_a) = pair(&test_db).await;
        let (need_b, interest_b) = pair(&test_db).await;
        let coach = test_db.user("coach_user").await;
        let parent = test_db.user("parent_user").await;
        let athlete = test_db.user("athlete_user").await;
        let other_parent = test_db.user("other_parent").await;

        let (a, _) = propose_match(&test_db.pool, &coach, need_a, interest_a, None)
            .await
            .unwrap();
        let (b, _) = propose_match(&test_db.pool, &coach, need_b, interest_b, None)
            .await
            .unwrap();
        confirm_match(&test_db.pool, &parent, b.id, None)
            .await
            .unwrap();

        let pending = list_coach_matches(&test_db.pool, &coach, StatusFilter::default())
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);
        assert_eq!(pending[0].team_name.as_deref(), Some("Eagles"));
        assert_eq!(pending[0].wrestler_first_name, "Sam");

        let all = list_coach_matches(&test_db.pool, &coach, StatusFilter::All)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let sam = test_db.wrestler_id("Sam").unwrap();
        let confirmed = list_wrestler_matches(&test_db.pool, &athlete, sam, StatusFilter::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, b.id);

        let result = list_wrestler_matches(&test_db.pool, &other_parent, sam, StatusFilter::All).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));

        let result = list_coach_matches(&test_db.pool, &parent, StatusFilter::All).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));

        let detail = get_match_detail(&test_db.pool, &parent, b.id).await.unwrap();
        assert_eq!(detail.status, MatchStatus::Confirmed);
        let result = get_match_detail(&test_db.pool, &other_parent, b.id).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[rocket::async_test]
    async fn test_confirmed_matches_block_deletion() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;
        let coach = test_db.user("coach_user").await;
        let parent = test_db.user("parent_user").await;

        let (m, _) = propose_match(&test_db.pool, &coach, need_id, interest_id, None)
            .await
            .unwrap();
        confirm_match(&test_db.pool, &parent, m.id, None)
            .await
            .unwrap();

        let result = delete_need(&test_db.pool, &coach, need_id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        let result = delete_interest(&test_db.pool, &parent, interest_id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(match_count(&test_db).await, 1);
    }

    #[rocket::async_test]
    async fn test_deleting_need_clears_unconfirmed_matches() {
        let test_db = create_standard_test_db().await;
        let (need_id, interest_id) = pair(&test_db).await;
        let coach = test_db.user("coach_user").await;

        propose_match(&test_db.pool, &coach, need_id, interest_id, None)
            .await
            .unwrap();
        delete_need(&test_db.pool, &coach, need_id)
            .await
            .expect("Pending matches should not block deletion");

        assert_eq!(match_count(&test_db).await, 0);
        assert!(get_interest(&test_db.pool, interest_id).await.is_ok());
    }
}
