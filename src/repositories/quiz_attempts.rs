use sqlx::types::Json;

use crate::db::models::{QuizAnswer, QuizAttempt};

const COLUMNS: &str = "\
    id, user_id, course_id, attempt_number, answers, correct_answers, total_questions, \
    score, passed, submitted_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) answers: &'a [QuizAnswer],
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) score: f64,
    pub(crate) passed: bool,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

pub(crate) async fn count_for(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND course_id = $2")
        .bind(user_id)
        .bind(course_id)
        .fetch_one(executor)
        .await
}

/// Highest score among passing attempts, if any attempt passed.
pub(crate) async fn best_passing_score(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT MAX(score) FROM quiz_attempts WHERE user_id = $1 AND course_id = $2 AND passed",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts (
            id, user_id, course_id, attempt_number, answers, correct_answers,
            total_questions, score, passed, submitted_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.attempt_number)
    .bind(Json(params.answers))
    .bind(params.correct_answers)
    .bind(params.total_questions)
    .bind(params.score)
    .bind(params.passed)
    .bind(params.submitted_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_for(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE user_id = $1 AND course_id = $2 \
         ORDER BY attempt_number"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_all(executor)
    .await
}
