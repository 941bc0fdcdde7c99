use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::models::User;
use crate::db::types::UserRole;
use crate::test_support::{self, TestContext};

async fn call(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, token, body))
        .await
        .expect("response");
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, test_support::read_json(response).await)
}

struct Classroom {
    trainer: String,
    learner: String,
    learner_user: User,
    course_id: String,
}

async fn classroom(ctx: &TestContext, modules: usize, questions: usize) -> Classroom {
    let pool = ctx.state.db();
    let trainer = test_support::insert_user(pool, "trainer@example.com", UserRole::Trainer).await;
    let learner = test_support::insert_user(pool, "learner@example.com", UserRole::Learner).await;
    let course = test_support::insert_course(pool, &trainer.id, "capstone", modules, questions).await;
    test_support::enroll(pool, &learner, &course.id).await;

    Classroom {
        trainer: test_support::bearer_token(&trainer.id, ctx.state.settings()),
        learner: test_support::bearer_token(&learner.id, ctx.state.settings()),
        learner_user: learner,
        course_id: course.id,
    }
}

async fn create_assignment(ctx: &TestContext, room: &Classroom, body: Value) -> String {
    let (status, body) =
        call(ctx, Method::POST, "/api/assignments", Some(&room.trainer), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create: {body}");
    body["id"].as_str().expect("assignment id").to_string()
}

#[tokio::test]
async fn graded_required_assignment_completes_the_course() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let room = classroom(&ctx, 1, 0).await;
    let assignment_id = create_assignment(
        &ctx,
        &room,
        json!({ "course_id": room.course_id, "module_id": "m1", "title": "Build a CLI", "max_score": 50 }),
    )
    .await;

    let (status, list) = call(
        &ctx,
        Method::GET,
        &format!("/api/courses/{}/assignments", room.course_id),
        Some(&room.learner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["is_required"], true);
    assert!(list[0].get("submission").is_none());

    // Modules alone no longer finish the course.
    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/module/complete",
        Some(&room.learner),
        Some(json!({ "course_id": room.course_id, "module_id": "m1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["overall_progress"], 100.0);
    assert_eq!(body["certificate_issued"], false);

    let (status, submission) = call(
        &ctx,
        Method::POST,
        &format!("/api/assignments/{assignment_id}/submit"),
        Some(&room.learner),
        Some(json!({ "submission_url": "https://github.com/learner/cli", "notes": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{submission}");
    assert_eq!(submission["resubmitted"], false);
    assert_eq!(submission["grade"], Value::Null);
    let submission_id = submission["id"].as_str().expect("submission id").to_string();

    let (status, rows) = call(
        &ctx,
        Method::GET,
        &format!("/api/assignments/{assignment_id}/submissions"),
        Some(&room.trainer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows[0]["user_email"], "learner@example.com");

    let grade_uri = format!("/api/submissions/{submission_id}/grade");
    let (status, body) =
        call(&ctx, Method::PUT, &grade_uri, Some(&room.trainer), Some(json!({ "grade": 51 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "grade_out_of_range");

    let (status, graded) = call(
        &ctx,
        Method::PUT,
        &grade_uri,
        Some(&room.trainer),
        Some(json!({ "grade": 45, "feedback": "Solid work" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{graded}");
    assert_eq!(graded["grade"], 45.0);
    assert_eq!(graded["certificate_issued"], true);
    assert!(graded["certificate"]["certificate_number"].is_string());

    let (_, progress) = call(
        &ctx,
        Method::GET,
        &format!("/api/progress/{}", room.course_id),
        Some(&room.learner),
        None,
    )
    .await;
    assert_eq!(progress["assignment_progress"], json!({ "required": 1, "graded": 1 }));

    let (_, certificates) =
        call(&ctx, Method::GET, "/api/certificates", Some(&room.learner), None).await;
    assert_eq!(certificates.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn optional_assignments_do_not_hold_back_the_certificate() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let room = classroom(&ctx, 1, 0).await;
    create_assignment(
        &ctx,
        &room,
        json!({ "course_id": room.course_id, "title": "Stretch goal", "is_required": false }),
    )
    .await;

    let (_, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/module/complete",
        Some(&room.learner),
        Some(json!({ "course_id": room.course_id, "module_id": "m1" })),
    )
    .await;
    assert_eq!(body["certificate_issued"], true);
}

#[tokio::test]
async fn resubmitting_clears_the_grade() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let room = classroom(&ctx, 2, 0).await;
    let assignment_id =
        create_assignment(&ctx, &room, json!({ "course_id": room.course_id, "title": "Essay" })).await;
    let submit_uri = format!("/api/assignments/{assignment_id}/submit");

    let (_, first) = call(
        &ctx,
        Method::POST,
        &submit_uri,
        Some(&room.learner),
        Some(json!({ "notes": "first draft" })),
    )
    .await;
    let submission_id = first["id"].as_str().expect("submission id").to_string();
    let (status, _) = call(
        &ctx,
        Method::PUT,
        &format!("/api/submissions/{submission_id}/grade"),
        Some(&room.trainer),
        Some(json!({ "grade": 70 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = call(
        &ctx,
        Method::POST,
        &submit_uri,
        Some(&room.learner),
        Some(json!({ "notes": "second draft" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{second}");
    assert_eq!(second["id"], submission_id.as_str());
    assert_eq!(second["resubmitted"], true);
    assert_eq!(second["grade"], Value::Null);
    assert_eq!(second["notes"], "second draft");
}

#[tokio::test]
async fn assignment_access_is_checked() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let room = classroom(&ctx, 1, 0).await;
    let pool = ctx.state.db();

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/assignments",
        Some(&room.trainer),
        Some(json!({ "course_id": room.course_id, "module_id": "m9", "title": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/assignments",
        Some(&room.learner),
        Some(json!({ "course_id": room.course_id, "title": "Self-assigned" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let assignment_id =
        create_assignment(&ctx, &room, json!({ "course_id": room.course_id, "title": "Report" })).await;
    let submit_uri = format!("/api/assignments/{assignment_id}/submit");

    let (status, _) = call(
        &ctx,
        Method::POST,
        &submit_uri,
        Some(&room.learner),
        Some(json!({ "notes": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let outsider = test_support::insert_user(pool, "outsider@example.com", UserRole::Learner).await;
    let outsider_token = test_support::bearer_token(&outsider.id, ctx.state.settings());
    let (status, body) = call(
        &ctx,
        Method::POST,
        &submit_uri,
        Some(&outsider_token),
        Some(json!({ "notes": "let me in" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "not_enrolled");

    let (_, submission) = call(
        &ctx,
        Method::POST,
        &submit_uri,
        Some(&room.learner),
        Some(json!({ "notes": "my report" })),
    )
    .await;
    let grade_uri = format!("/api/submissions/{}/grade", submission["id"].as_str().expect("id"));

    let rival = test_support::insert_user(pool, "rival@example.com", UserRole::Trainer).await;
    let rival_token = test_support::bearer_token(&rival.id, ctx.state.settings());
    let (status, _) =
        call(&ctx, Method::PUT, &grade_uri, Some(&rival_token), Some(json!({ "grade": 100 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(
        &ctx,
        Method::GET,
        &format!("/api/assignments/{assignment_id}/submissions"),
        Some(&rival_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = test_support::insert_user(pool, "admin@example.com", UserRole::Admin).await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let (status, graded) =
        call(&ctx, Method::PUT, &grade_uri, Some(&admin_token), Some(json!({ "grade": 100 }))).await;
    assert_eq!(status, StatusCode::OK, "{graded}");
    assert_eq!(graded["user_id"], room.learner_user.id.as_str());

    let (status, _) = call(
        &ctx,
        Method::DELETE,
        &format!("/api/assignments/{assignment_id}"),
        Some(&room.trainer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(
        &ctx,
        Method::GET,
        &format!("/api/assignments/{assignment_id}/submissions"),
        Some(&room.trainer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
