use sqlx::PgPool;

use crate::db::models::Enrollment;

const COLUMNS: &str = "id, user_id, course_id, enrolled_at, last_accessed";

pub(crate) struct CreateEnrollment<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) enrolled_at: time::PrimitiveDateTime,
}

/// Returns `true` only for the call that created the row.
pub(crate) async fn create_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateEnrollment<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO enrollments (id, user_id, course_id, enrolled_at, last_accessed)
         VALUES ($1,$2,$3,$4,$4)
         ON CONFLICT (user_id, course_id) DO NOTHING",
    )
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.enrolled_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn exists(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn touch(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
    accessed_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE enrollments SET last_accessed = $1 WHERE user_id = $2 AND course_id = $3")
        .bind(accessed_at)
        .bind(user_id)
        .bind(course_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Serializes progress, attempt and issuance bookkeeping for one learner and course
/// until the transaction ends.
pub(crate) async fn acquire_progress_lock(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("progress:{user_id}:{course_id}"))
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 ORDER BY last_accessed DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_for_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(executor)
        .await
}
