use crate::db::models::ModuleProgress;

const COLUMNS: &str = "user_id, course_id, module_id, time_spent_minutes, completed_at";

pub(crate) struct CompleteModule<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) module_id: &'a str,
    pub(crate) time_spent_minutes: i32,
    pub(crate) completed_at: time::PrimitiveDateTime,
}

/// Returns `true` for the first completion only; repeats leave the row untouched.
pub(crate) async fn complete_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    params: CompleteModule<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO module_progress (
            user_id, course_id, module_id, time_spent_minutes, completed_at
         ) VALUES ($1,$2,$3,$4,$5)
         ON CONFLICT (user_id, course_id, module_id) DO NOTHING",
    )
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.module_id)
    .bind(params.time_spent_minutes)
    .bind(params.completed_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_for_enrollment(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<Vec<ModuleProgress>, sqlx::Error> {
    sqlx::query_as::<_, ModuleProgress>(&format!(
        "SELECT {COLUMNS} FROM module_progress WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// Completed modules that are still part of the course.
pub(crate) async fn count_completed(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM module_progress mp
         JOIN course_modules cm ON cm.course_id = mp.course_id AND cm.id = mp.module_id
         WHERE mp.user_id = $1 AND mp.course_id = $2",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}
