#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::{Client, LocalResponse};
    use serde_json::{Value, json};

    use crate::api::SUMMARY_CACHE_CONTROL;
    use crate::test::test_utils::{bearer, create_standard_test_db, setup_test_client};

    async fn body_json(response: LocalResponse<'_>) -> Value {
        let body = response.into_string().await.expect("Response had no body");
        serde_json::from_str(&body).expect("Response was not JSON")
    }

    async fn post_json(client: &Client, user: &str, uri: &str, body: Value) -> (Status, Value) {
        let response = client
            .post(uri.to_string())
            .header(ContentType::JSON)
            .header(bearer(user))
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn put_json(client: &Client, user: &str, uri: &str, body: Value) -> (Status, Value) {
        let response = client
            .put(uri.to_string())
            .header(ContentType::JSON)
            .header(bearer(user))
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn get(client: &Client, user: &str, uri: &str) -> (Status, Value) {
        let response = client
            .get(uri.to_string())
            .header(bearer(user))
            .dispatch()
            .await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// A need from `coach_user` and an interest for Sam that match on
    /// weight and (differently spelled) age group.
    async fn listed_pair(client: &Client, sam: i64) -> (i64, i64) {
        let (status, need) = post_json(
            client,
            "coach_user",
            "/api/needs",
            json!({
                "event_name": "Spring Open",
                "event_date": "3/15/2025",
                "weight_class": "64",
                "age_group": "12 and under"
            }),
        )
        .await;
        assert_eq!(status, Status::Created);

        let (status, interest) = post_json(
            client,
            "parent_user",
            &format!("/api/wrestlers/{}/interests", sam),
            json!({ "weight_class": "64", "age_group": "12U", "event_name": "" }),
        )
        .await;
        assert_eq!(status, Status::Created);
        assert!(interest["interest"]["event_name"].is_null());

        (
            need["need"]["id"].as_i64().unwrap(),
            interest["interest"]["id"].as_i64().unwrap(),
        )
    }

    #[rocket::async_test]
    async fn test_health_and_authentication() {
        let test_db = create_standard_test_db().await;
        let (client, _test_db) = setup_test_client(test_db).await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = body_json(response).await;
        assert_eq!(body["database"], json!(true));

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(response.content_type(), Some(ContentType::JSON));
        let body = body_json(response).await;
        assert_eq!(body["ok"], json!(false));

        let (status, me) = get(&client, "parent_user", "/api/me").await;
        assert_eq!(status, Status::Ok);
        assert_eq!(me["username"], json!("parent_user"));
        assert_eq!(me["role"], json!("parent"));

        let response = client
            .get("/api/me")
            .header(rocket::http::Header::new("Authorization", "Bearer bogus"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_confirmation_unlocks_messaging() {
        let test_db = create_standard_test_db().await;
        let sam = test_db.wrestler_id("Sam").unwrap();
        let (client, _test_db) = setup_test_client(test_db).await;

        let (need_id, interest_id) = listed_pair(&client, sam).await;

        let (status, candidates) = get(
            &client,
            "coach_user",
            &format!("/api/needs/{}/candidates", need_id),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(candidates["need"]["id"], json!(need_id));
        assert_eq!(candidates["candidates"][0]["interest_id"], json!(interest_id));
        assert!(candidates.get("error").is_none());

        let (status, created) = post_json(
            &client,
            "coach_user",
            "/api/matches",
            json!({ "needId": need_id, "interestId": interest_id }),
        )
        .await;
        assert_eq!(status, Status::Created);
        assert_eq!(created["match"]["status"], json!("pending"));
        assert_eq!(created["match"]["coach_ok"], json!(true));
        assert_eq!(created["match"]["parent_ok"], json!(false));
        assert!(created.get("alreadyExists").is_none());
        let match_id = created["match"]["id"].as_i64().unwrap();

        let uri = format!("/api/messages/{}", match_id);
        let (status, body) =
            post_json(&client, "parent_user", &uri, json!({ "text": "Hi coach" })).await;
        assert_eq!(status, Status::Forbidden);
        assert_eq!(body["error"], json!("forbidden"));

        let response = client
            .post(format!("/api/matches/{}/confirm", match_id))
            .header(bearer("parent_user"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let confirmed = body_json(response).await;
        assert_eq!(confirmed["match"]["status"], json!("confirmed"));
        assert!(!confirmed["match"]["confirmed_at"].is_null());

        let (status, posted) =
            post_json(&client, "parent_user", &uri, json!({ "text": "Hi coach" })).await;
        assert_eq!(status, Status::Created);
        assert_eq!(posted["message"]["text"], json!("Hi coach"));

        let (status, listed) = get(&client, "coach_user", &uri).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(listed["messages"].as_array().unwrap().len(), 1);

        let (status, access) = get(
            &client,
            "athlete_user",
            &format!("/api/matches/{}/messaging", match_id),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(access["allowed"], json!(true));
        assert_eq!(access["matchStatus"], json!("confirmed"));

        // proposing the same pair again touches the existing match
        let (status, again) = post_json(
            &client,
            "coach_user",
            "/api/matches",
            json!({ "need_id": need_id, "interest_id": interest_id, "side": "coach" }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(again["alreadyExists"], json!(true));
        assert_eq!(again["match"]["id"], json!(match_id));
    }

    #[rocket::async_test]
    async fn test_confirm_errors_map_to_statuses() {
        let test_db = create_standard_test_db().await;
        let sam = test_db.wrestler_id("Sam").unwrap();
        let (client, _test_db) = setup_test_client(test_db).await;
        let (need_id, interest_id) = listed_pair(&client, sam).await;

        let (status, body) = post_json(
            &client,
            "parent_user",
            "/api/matches/4242/confirm",
            json!({ "side": "parent" }),
        )
        .await;
        assert_eq!(status, Status::NotFound);
        assert_eq!(body["error"], json!("not_found"));

        let (_, created) = post_json(
            &client,
            "parent_user",
            "/api/matches",
            json!({ "needId": need_id, "interestId": interest_id }),
        )
        .await;
        let match_id = created["match"]["id"].as_i64().unwrap();

        let (status, body) = post_json(
            &client,
            "coach_user",
            &format!("/api/matches/{}/confirm", match_id),
            json!({ "side": "referee" }),
        )
        .await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["error"], json!("invalid_argument"));

        // a body that is present but unreadable never falls back to the role
        for raw in [r#"{"side": 5}"#, r#"{"side": "#, "parent"] {
            let response = client
                .post(format!("/api/matches/{}/confirm", match_id))
                .header(ContentType::JSON)
                .header(bearer("coach_user"))
                .body(raw)
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest, "body {:?}", raw);
            let body = body_json(response).await;
            assert_eq!(body["error"], json!("invalid_argument"));
        }
        let (_, unchanged) = get(&client, "coach_user", &format!("/api/matches/{}", match_id)).await;
        assert_eq!(unchanged["match"]["status"], json!("pending"));

        let (status, _) = post_json(
            &client,
            "other_parent",
            &format!("/api/matches/{}/decline", match_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Forbidden);

        let (status, declined) = post_json(
            &client,
            "coach_user",
            &format!("/api/matches/{}/decline", match_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(declined["match"]["status"], json!("declined"));

        let (status, body) = post_json(
            &client,
            "parent_user",
            &format!("/api/matches/{}/cancel", match_id),
            json!({}),
        )
        .await;
        assert_eq!(status, Status::Conflict);
        assert_eq!(body["error"], json!("conflict"));

        let (status, body) = post_json(
            &client,
            "coach_user",
            "/api/matches",
            json!({ "needId": "first", "interestId": interest_id }),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert_eq!(body["ok"], json!(false));
    }

    #[rocket::async_test]
    async fn test_request_validation_and_listings() {
        let test_db = create_standard_test_db().await;
        let sam = test_db.wrestler_id("Sam").unwrap();
        let (client, _test_db) = setup_test_client(test_db).await;

        let (status, body) = post_json(
            &client,
            "coach_user",
            "/api/needs",
            json!({ "event_name": "", "weight_class": "64", "age_group": "12U" }),
        )
        .await;
        assert_eq!(status, Status::BadRequest);
        assert!(body["fields"]["event_name"].is_array());

        let (status, body) = post_json(
            &client,
            "coach_user",
            "/api/needs",
            json!({
                "event_name": "Open",
                "event_date": "next tuesday",
                "weight_class": "64",
                "age_group": "12U"
            }),
        )
        .await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["error"], json!("invalid_argument"));

        let (need_id, _) = listed_pair(&client, sam).await;

        let response = client
            .patch(format!("/api/needs/{}", need_id))
            .header(ContentType::JSON)
            .header(bearer("coach_user"))
            .body(json!({ "age_group": "12 Under", "notes": "Bring headgear" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let patched = body_json(response).await;
        assert_eq!(patched["need"]["age_group_normalized"], json!("12U"));
        assert_eq!(patched["need"]["event_date"], json!("2025-03-15"));
        assert_eq!(patched["need"]["notes"], json!("Bring headgear"));

        let (status, needs) = get(&client, "coach_user", "/api/needs").await;
        assert_eq!(status, Status::Ok);
        assert_eq!(needs["needs"].as_array().unwrap().len(), 1);

        let (status, matches) = get(&client, "coach_user", "/api/matches?status=all").await;
        assert_eq!(status, Status::Ok);
        assert!(matches["matches"].as_array().unwrap().is_empty());

        let (status, _) = get(&client, "coach_user", "/api/matches?status=finished").await;
        assert_eq!(status, Status::BadRequest);

        let response = client
            .delete(format!("/api/needs/{}", need_id))
            .header(bearer("other_coach"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .delete(format!("/api/needs/{}", need_id))
            .header(bearer("coach_user"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let (status, body) = get(&client, "coach_user", "/api/no-such-route").await;
        assert_eq!(status, Status::NotFound);
        assert_eq!(body["error"], json!("not_found"));
    }

    #[rocket::async_test]
    async fn test_summaries_are_short_lived() {
        let test_db = create_standard_test_db().await;
        let sam = test_db.wrestler_id("Sam").unwrap();
        let (client, _test_db) = setup_test_client(test_db).await;

        let response = client
            .get(format!("/api/wrestlers/{}/summary", sam))
            .header(bearer("parent_user"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Cache-Control"),
            Some(SUMMARY_CACHE_CONTROL)
        );
        let summary = body_json(response).await;
        assert_eq!(summary["matches"]["total"], json!(0));
        assert_eq!(summary["messages"]["unread"], json!(0));

        let response = client
            .get("/api/coach/summary")
            .header(bearer("coach_user"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert!(response.headers().get_one("Cache-Control").is_some());

        let response = client
            .get("/api/coach/summary")
            .header(bearer("parent_user"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }
    #[rocket::async_test]
    async fn test_coach_team_profile() {
        let test_db = create_standard_test_db().await;
        let (client, _test_db) = setup_test_client(test_db).await;

        let (status, body) = get(&client, "other_coach", "/api/coach/team").await;
        assert_eq!(status, Status::Ok);
        assert!(body["team"].is_null());

        let (status, saved) = put_json(
            &client,
            "other_coach",
            "/api/coach/team",
            json!({ "teamName": "Hawks", "contactEmail": "hawks@example.com", "city": " " }),
        )
        .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(saved["team"]["name"], json!("Hawks"));
        assert!(saved["team"]["city"].is_null());

        let (status, body) = get(&client, "other_coach", "/api/coach/team").await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["team"]["id"], saved["team"]["id"]);
        assert_eq!(body["team"]["contact_email"], json!("hawks@example.com"));

        let (status, body) = put_json(
            &client,
            "other_coach",
            "/api/coach/team",
            json!({ "name": "", "contactEmail": "nope" }),
        )
        .await;
        assert_eq!(status, Status::BadRequest);
        assert!(body["fields"].get("name").is_some());
        assert!(body["fields"].get("contact_email").is_some());

        let (status, _) = put_json(
            &client,
            "parent_user",
            "/api/coach/team",
            json!({ "name": "Parents" }),
        )
        .await;
        assert_eq!(status, Status::Forbidden);
        let (status, _) = get(&client, "parent_user", "/api/coach/team").await;
        assert_eq!(status, Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_wrestler_inbox_over_http() {
        let test_db = create_standard_test_db().await;
        let sam = test_db.wrestler_id("Sam").unwrap();
        let (client, _test_db) = setup_test_client(test_db).await;
        let inbox = format!("/api/wrestlers/{}/messages", sam);

        let (need_id, interest_id) = listed_pair(&client, sam).await;
        let (status, created) = post_json(
            &client,
            "coach_user",
            "/api/matches",
            json!({ "needId": need_id, "interestId": interest_id }),
        )
        .await;
        assert_eq!(status, Status::Created);
        let match_id = created["match"]["id"].as_i64().unwrap();

        let (status, body) = get(&client, "parent_user", &inbox).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["threads"], json!([]));
        assert_eq!(body["page"], json!({ "limit": 20, "offset": 0 }));

        let response = client
            .post(format!("/api/matches/{}/confirm", match_id))
            .header(bearer("parent_user"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let (status, _) = post_json(
            &client,
            "coach_user",
            &format!("/api/messages/{}", match_id),
            json!({ "text": "See you Saturday" }),
        )
        .await;
        assert_eq!(status, Status::Created);

        let (status, body) =
            get(&client, "athlete_user", &format!("{}?limit=500", inbox)).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["page"]["limit"], json!(100));
        assert_eq!(body["threads"][0]["match_id"], json!(match_id));
        assert_eq!(body["threads"][0]["last_text"], json!("See you Saturday"));

        let (status, _) = get(&client, "other_parent", &inbox).await;
        assert_eq!(status, Status::Forbidden);
    }
}
