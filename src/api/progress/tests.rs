use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::core::redis::RedisHealth;
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
    (status, test_support::read_json(response).await)
}

async fn learner_on_course(ctx: &TestContext, modules: usize, questions: usize) -> (String, String) {
    let pool = ctx.state.db();
    let trainer = test_support::insert_user(pool, "trainer@example.com", UserRole::Trainer).await;
    let learner = test_support::insert_user(pool, "learner@example.com", UserRole::Learner).await;
    let course = test_support::insert_course(pool, &trainer.id, "rust-basics", modules, questions).await;
    let token = test_support::bearer_token(&learner.id, ctx.state.settings());

    let (status, body) = call(
        ctx,
        Method::POST,
        "/api/courses/enroll",
        Some(&token),
        Some(json!({ "course_id": course.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "enroll: {body}");

    (token, course.id)
}

fn all_correct(questions: usize) -> Value {
    let answers: serde_json::Map<String, Value> =
        (1..=questions).map(|n| (format!("q{n}"), json!(0))).collect();
    Value::Object(answers)
}

#[tokio::test]
async fn full_course_flow_issues_a_verifiable_certificate() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 3, 2).await;

    let mut last = Value::Null;
    for (module, expected) in [("m1", 33.3), ("m2", 66.7), ("m3", 100.0)] {
        let (status, body) = call(
            &ctx,
            Method::POST,
            "/api/progress/module/complete",
            Some(&token),
            Some(json!({ "course_id": course_id, "module_id": module, "time_spent_minutes": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "complete {module}: {body}");
        assert_eq!(body["overall_progress"], expected);
        assert_eq!(body["newly_completed"], true);
        last = body;
    }
    // A quiz still stands between full progress and the certificate.
    assert_eq!(last["certificate_issued"], false);

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({ "course_id": course_id, "answers": all_correct(2) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit: {body}");
    assert_eq!(body["score"], 100.0);
    assert_eq!(body["passed"], true);
    assert_eq!(body["attempt_number"], 1);
    assert_eq!(body["attempts_remaining"], 1);
    assert_eq!(body["certificate_issued"], true);
    let number = body["certificate"]["certificate_number"].as_str().expect("number").to_string();
    assert!(number.starts_with("PS-"), "unexpected number {number}");

    let (status, body) =
        call(&ctx, Method::GET, &format!("/api/certificates/verify/{number}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["course_title"], "Course rust-basics");
    assert_eq!(body["quiz_score"], 100.0);

    let (status, body) =
        call(&ctx, Method::GET, &format!("/api/progress/{course_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_progress"], 100.0);
    assert_eq!(body["quiz_progress"]["passed"], true);
    assert_eq!(body["certificate"]["certificate_number"], number.as_str());
}

#[tokio::test]
async fn repeated_module_completion_is_harmless() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 2, 1).await;
    let payload = json!({ "course_id": course_id, "module_id": "m1", "time_spent_minutes": 5 });

    let (_, first) =
        call(&ctx, Method::POST, "/api/progress/module/complete", Some(&token), Some(payload.clone()))
            .await;
    let (status, second) =
        call(&ctx, Method::POST, "/api/progress/module/complete", Some(&token), Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["newly_completed"], true);
    assert_eq!(second["newly_completed"], false);
    assert_eq!(second["overall_progress"], 50.0);
}

#[tokio::test]
async fn unknown_module_and_missing_enrollment_are_rejected() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 1, 1).await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/module/complete",
        Some(&token),
        Some(json!({ "course_id": course_id, "module_id": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "module_not_found");

    let outsider =
        test_support::insert_user(ctx.state.db(), "outsider@example.com", UserRole::Learner).await;
    let outsider_token = test_support::bearer_token(&outsider.id, ctx.state.settings());
    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/module/complete",
        Some(&outsider_token),
        Some(json!({ "course_id": course_id, "module_id": "m1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "not_enrolled");

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({ "course_id": "missing-course", "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "course_not_found");
}

#[tokio::test]
async fn third_attempt_is_refused() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 1, 2).await;
    let wrong = json!({ "course_id": course_id, "answers": { "q1": 1, "q2": 1 } });

    for expected_remaining in [1, 0] {
        let (status, body) =
            call(&ctx, Method::POST, "/api/progress/quiz/submit", Some(&token), Some(wrong.clone()))
                .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["passed"], false);
        assert_eq!(body["attempts_remaining"], expected_remaining);
        assert_eq!(body["certificate_issued"], false);
    }

    let (status, body) =
        call(&ctx, Method::POST, "/api/progress/quiz/submit", Some(&token), Some(wrong)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "no_attempts_remaining");

    let (_, progress) =
        call(&ctx, Method::GET, &format!("/api/progress/{course_id}"), Some(&token), None).await;
    assert_eq!(progress["quiz_progress"]["attempts"].as_array().map(Vec::len), Some(2));
    assert_eq!(progress["certificate"], Value::Null);
}

#[tokio::test]
async fn eighty_percent_passes_exactly() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 0, 5).await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({
            "course_id": course_id,
            "answers": { "q1": 0, "q2": 0, "q3": 0, "q4": 0, "q5": 2 }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["score"], 80.0);
    assert_eq!(body["correct_answers"], 4);
    assert_eq!(body["passed"], true);
    assert_eq!(body["certificate_issued"], true);
}

#[tokio::test]
async fn a_second_pass_keeps_the_first_certificate() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 0, 1).await;
    let payload = json!({ "course_id": course_id, "answers": { "q1": 0 } });

    let (_, first) =
        call(&ctx, Method::POST, "/api/progress/quiz/submit", Some(&token), Some(payload.clone()))
            .await;
    let (status, second) =
        call(&ctx, Method::POST, "/api/progress/quiz/submit", Some(&token), Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["certificate_issued"], true);
    assert_eq!(second["certificate_issued"], false);
    assert_eq!(
        first["certificate"]["certificate_number"],
        second["certificate"]["certificate_number"]
    );

    let (_, list) = call(&ctx, Method::GET, "/api/certificates", Some(&token), None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn incomplete_submission_lists_missing_questions() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 0, 3).await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({ "course_id": course_id, "answers": { "q2": 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "incomplete_submission");
    assert_eq!(body["missing_question_ids"], json!(["q1", "q3"]));

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({ "course_id": course_id, "answers": { "q1": 0, "q2": 0, "q3": 0, "q9": 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "unknown_question");

    // Rejected submissions never consume an attempt.
    let (_, progress) =
        call(&ctx, Method::GET, &format!("/api/progress/{course_id}"), Some(&token), None).await;
    assert_eq!(progress["quiz_progress"]["attempts_remaining"], 2);
}

#[tokio::test]
async fn course_without_quiz_certifies_on_last_module() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 2, 0).await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({ "course_id": course_id, "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "quiz_not_available");

    let mut last = Value::Null;
    for module in ["m1", "m2"] {
        let (_, body) = call(
            &ctx,
            Method::POST,
            "/api/progress/module/complete",
            Some(&token),
            Some(json!({ "course_id": course_id, "module_id": module })),
        )
        .await;
        last = body;
    }

    assert_eq!(last["certificate_issued"], true);
    assert_eq!(last["certificate"]["quiz_score"], 0.0);

    let (_, progress) =
        call(&ctx, Method::GET, &format!("/api/progress/{course_id}"), Some(&token), None).await;
    assert_eq!(progress["quiz_progress"], Value::Null);
}

#[tokio::test]
async fn unknown_certificate_number_is_not_an_error() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };

    let (status, body) =
        call(&ctx, Method::GET, "/api/certificates/verify/BOGUS-000", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": false }));
}

#[tokio::test]
async fn passing_the_quiz_before_the_modules_certifies_on_the_last_module() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 3, 2).await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({ "course_id": course_id, "answers": all_correct(2) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit: {body}");
    assert_eq!(body["passed"], true);
    assert_eq!(body["certificate_issued"], false);
    assert_eq!(body["certificate"], Value::Null);

    let (_, progress) =
        call(&ctx, Method::GET, &format!("/api/progress/{course_id}"), Some(&token), None).await;
    assert_eq!(progress["overall_progress"], 0.0);
    assert_eq!(progress["certificate"], Value::Null);

    for (module, issued) in [("m1", false), ("m2", false), ("m3", true)] {
        let (status, body) = call(
            &ctx,
            Method::POST,
            "/api/progress/module/complete",
            Some(&token),
            Some(json!({ "course_id": course_id, "module_id": module })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "complete {module}: {body}");
        assert_eq!(body["certificate_issued"], issued, "after {module}: {body}");
    }

    let (_, list) = call(&ctx, Method::GET, "/api/certificates", Some(&token), None).await;
    let list = list.as_array().cloned().unwrap_or_default();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["quiz_score"], 100.0);
}

#[tokio::test]
async fn spent_attempts_are_reported_before_grading() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 1, 2).await;
    let wrong = json!({ "course_id": course_id, "answers": { "q1": 1, "q2": 1 } });

    for _ in 0..2 {
        let (status, _) =
            call(&ctx, Method::POST, "/api/progress/quiz/submit", Some(&token), Some(wrong.clone()))
                .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/progress/quiz/submit",
        Some(&token),
        Some(json!({ "course_id": course_id, "answers": { "q1": 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "no_attempts_remaining");
}

async fn call_in_parallel(
    ctx: &TestContext,
    requests: Vec<(&str, &str, Value)>,
) -> Vec<(StatusCode, Value)> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|(uri, token, body)| {
            let app = ctx.app.clone();
            let request = test_support::json_request(Method::POST, uri, Some(token), Some(body));
            tokio::spawn(async move {
                let response = app.oneshot(request).await.expect("response");
                let status = response.status();
                (status, test_support::read_json(response).await)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("join"));
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_never_exceed_the_attempt_cap() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 1, 2).await;
    let wrong = json!({ "course_id": course_id, "answers": { "q1": 1, "q2": 1 } });

    let results = call_in_parallel(
        &ctx,
        (0..8).map(|_| ("/api/progress/quiz/submit", token.as_str(), wrong.clone())).collect(),
    )
    .await;

    let accepted = results.iter().filter(|(status, _)| *status == StatusCode::OK).count();
    let refused = results
        .iter()
        .filter(|(status, body)| {
            *status == StatusCode::CONFLICT && body["kind"] == "no_attempts_remaining"
        })
        .count();
    assert_eq!(accepted, 2, "{results:?}");
    assert_eq!(refused, 6, "{results:?}");

    let (_, progress) =
        call(&ctx, Method::GET, &format!("/api/progress/{course_id}"), Some(&token), None).await;
    assert_eq!(progress["quiz_progress"]["attempts"].as_array().map(Vec::len), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_record_a_module_once() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 2, 1).await;
    let payload = json!({ "course_id": course_id, "module_id": "m1", "time_spent_minutes": 5 });

    let results = call_in_parallel(
        &ctx,
        (0..8).map(|_| ("/api/progress/module/complete", token.as_str(), payload.clone())).collect(),
    )
    .await;

    assert!(results.iter().all(|(status, _)| *status == StatusCode::OK), "{results:?}");
    let newly = results.iter().filter(|(_, body)| body["newly_completed"] == true).count();
    assert_eq!(newly, 1);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM module_progress WHERE course_id = $1 AND module_id = 'm1'",
    )
    .bind(&course_id)
    .fetch_one(ctx.state.db())
    .await
    .expect("count rows");
    assert_eq!(rows, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_last_module_and_quiz_pass_issue_one_certificate() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let (token, course_id) = learner_on_course(&ctx, 2, 1).await;
    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/progress/module/complete",
        Some(&token),
        Some(json!({ "course_id": course_id, "module_id": "m1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let last_module = json!({ "course_id": course_id, "module_id": "m2" });
    let pass = json!({ "course_id": course_id, "answers": all_correct(1) });
    let mut requests = Vec::new();
    for _ in 0..3 {
        requests.push(("/api/progress/module/complete", token.as_str(), last_module.clone()));
    }
    for _ in 0..2 {
        requests.push(("/api/progress/quiz/submit", token.as_str(), pass.clone()));
    }

    let results = call_in_parallel(&ctx, requests).await;
    assert!(results.iter().all(|(status, _)| *status == StatusCode::OK), "{results:?}");
    let issued = results.iter().filter(|(_, body)| body["certificate_issued"] == true).count();
    assert_eq!(issued, 1, "{results:?}");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM certificates WHERE course_id = $1")
        .bind(&course_id)
        .fetch_one(ctx.state.db())
        .await
        .expect("count certificates");
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn verification_is_rate_limited_per_client() {
    let Some(ctx) =
        test_support::setup_test_context_with(&[("RATE_LIMIT_VERIFY_PER_MINUTE", "1")]).await
    else {
        return;
    };
    if !matches!(ctx.state.redis().health().await, RedisHealth::Healthy) {
        eprintln!("skipping: redis unavailable");
        return;
    }

    let (status, body) =
        call(&ctx, Method::GET, "/api/certificates/verify/BOGUS-001", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": false }));

    let (status, _) =
        call(&ctx, Method::GET, "/api/certificates/verify/BOGUS-002", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
