use sqlx::types::Json;

use crate::db::models::{CourseModule, QuizQuestion};

const MODULE_COLUMNS: &str =
    "id, course_id, title, content, video_url, duration_minutes, order_index";
const QUESTION_COLUMNS: &str = "id, course_id, question, options, correct_answer, order_index";

pub(crate) struct NewModule {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) video_url: Option<String>,
    pub(crate) duration_minutes: i32,
}

pub(crate) struct NewQuestion {
    pub(crate) id: String,
    pub(crate) question: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: i32,
}

pub(crate) async fn list_modules(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Vec<CourseModule>, sqlx::Error> {
    sqlx::query_as::<_, CourseModule>(&format!(
        "SELECT {MODULE_COLUMNS} FROM course_modules WHERE course_id = $1 ORDER BY order_index, id"
    ))
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn module_exists(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    module_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM course_modules WHERE course_id = $1 AND id = $2)",
    )
    .bind(course_id)
    .bind(module_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn count_modules(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM course_modules WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn list_questions(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Vec<QuizQuestion>, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE course_id = $1 ORDER BY order_index, id"
    ))
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_questions(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_questions WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(executor)
        .await
}

/// Replaces the module list; `order_index` follows slice order.
pub(crate) async fn replace_modules(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    course_id: &str,
    modules: &[NewModule],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM course_modules WHERE course_id = $1")
        .bind(course_id)
        .execute(&mut **tx)
        .await?;

    for (index, module) in modules.iter().enumerate() {
        sqlx::query(
            "INSERT INTO course_modules (
                id, course_id, title, content, video_url, duration_minutes, order_index
             ) VALUES ($1,$2,$3,$4,$5,$6,$7)",
        )
        .bind(&module.id)
        .bind(course_id)
        .bind(&module.title)
        .bind(&module.content)
        .bind(&module.video_url)
        .bind(module.duration_minutes)
        .bind(index as i32)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub(crate) async fn replace_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    course_id: &str,
    questions: &[NewQuestion],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM quiz_questions WHERE course_id = $1")
        .bind(course_id)
        .execute(&mut **tx)
        .await?;

    for (index, question) in questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO quiz_questions (
                id, course_id, question, options, correct_answer, order_index
             ) VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(&question.id)
        .bind(course_id)
        .bind(&question.question)
        .bind(Json(&question.options))
        .bind(question.correct_answer)
        .bind(index as i32)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
