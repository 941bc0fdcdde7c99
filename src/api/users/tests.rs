use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
async fn signup_login_and_profile_update() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": "Ada@Example.com",
                "password": "analytical",
                "firstName": "Ada",
                "lastName": "Lovelace"
            })),
        ))
        .await
        .expect("signup");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["token_type"], "bearer");
    assert_eq!(created["user"]["email"], "ada@example.com");
    assert_eq!(created["user"]["role"], "learner");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "email": "ada@example.com",
                "password": "analytical",
                "first_name": "Ada",
                "last_name": "Again"
            })),
        ))
        .await
        .expect("duplicate signup");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        ))
        .await
        .expect("bad login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "analytical" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let login = test_support::read_json(response).await;
    let token = login["token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            "/api/users/profile",
            Some(&token),
            Some(json!({ "bio": "First programmer", "skills": [" math ", "", "poetry"] })),
        ))
        .await
        .expect("update profile");
    assert_eq!(response.status(), StatusCode::OK);
    let profile = test_support::read_json(response).await;
    assert_eq!(profile["bio"], "First programmer");
    assert_eq!(profile["skills"], json!(["math", "poetry"]));
    assert_eq!(profile["full_name"], "Ada Lovelace");
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let user =
        test_support::insert_user(ctx.state.db(), "grace@example.com", UserRole::Learner).await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({ "current_password": "not-it", "new_password": "new-password" })),
        ))
        .await
        .expect("wrong current");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({
                "current_password": test_support::TEST_PASSWORD,
                "new_password": "new-password"
            })),
        ))
        .await
        .expect("change");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "grace@example.com", "password": "new-password" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_manages_roles_and_reads_stats() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let pool = ctx.state.db();
    let admin = test_support::insert_user(pool, "admin@example.com", UserRole::Admin).await;
    let learner = test_support::insert_user(pool, "learner@example.com", UserRole::Learner).await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let learner_token = test_support::bearer_token(&learner.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/admin/stats", Some(&learner_token), None))
        .await
        .expect("learner stats");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/admin/users/{}/role", learner.id),
            Some(&admin_token),
            Some(json!({ "role": "trainer" })),
        ))
        .await
        .expect("promote");
    assert_eq!(response.status(), StatusCode::OK);
    let promoted = test_support::read_json(response).await;
    assert_eq!(promoted["role"], "trainer");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/admin/users?role=trainer",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("list trainers");
    let listing = test_support::read_json(response).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["email"], "learner@example.com");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/admin/stats", Some(&admin_token), None))
        .await
        .expect("stats");
    let stats = test_support::read_json(response).await;
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["total_trainers"], 1);
    assert_eq!(stats["total_learners"], 0);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/admin/analytics",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("analytics");
    let analytics = test_support::read_json(response).await;
    assert_eq!(analytics["users_by_role"], json!({ "admin": 1, "learner": 0, "trainer": 1 }));
}
