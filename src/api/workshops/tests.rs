use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
async fn registration_respects_capacity() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let pool = ctx.state.db();
    let trainer = test_support::insert_user(pool, "trainer@example.com", UserRole::Trainer).await;
    let first = test_support::insert_user(pool, "first@example.com", UserRole::Learner).await;
    let second = test_support::insert_user(pool, "second@example.com", UserRole::Learner).await;
    let trainer_token = test_support::bearer_token(&trainer.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/trainer/workshops",
            Some(&trainer_token),
            Some(json!({ "title": "Tiny Room", "max_participants": 1 })),
        ))
        .await
        .expect("create workshop");
    assert_eq!(response.status(), StatusCode::CREATED);
    let workshop = test_support::read_json(response).await;
    let register_uri = format!("/api/workshops/{}/register", workshop["id"].as_str().expect("id"));

    let mut statuses = Vec::new();
    for user in [&first, &first, &second] {
        let token = test_support::bearer_token(&user.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::POST, &register_uri, Some(&token), None))
            .await
            .expect("register");
        statuses.push(response.status());
    }
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::OK, StatusCode::CONFLICT]);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/workshops/{}", workshop["id"].as_str().expect("id")),
            None,
            None,
        ))
        .await
        .expect("detail");
    let detail = test_support::read_json(response).await;
    assert_eq!(detail["registered_count"], 1);
    assert_eq!(detail["seats_left"], 0);
}
