use sqlx::{FromRow, PgPool};

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PlatformTotals {
    pub(crate) total_users: i64,
    pub(crate) total_learners: i64,
    pub(crate) total_trainers: i64,
    pub(crate) total_courses: i64,
    pub(crate) published_courses: i64,
    pub(crate) total_workshops: i64,
    pub(crate) active_workshops: i64,
    pub(crate) total_labs: i64,
    pub(crate) published_labs: i64,
    pub(crate) total_enrollments: i64,
    pub(crate) total_lab_completions: i64,
    pub(crate) total_certificates: i64,
    pub(crate) total_learning_paths: i64,
}

pub(crate) async fn platform_totals(pool: &PgPool) -> Result<PlatformTotals, sqlx::Error> {
    sqlx::query_as::<_, PlatformTotals>(
        "SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE role = 'learner') AS total_learners,
            (SELECT COUNT(*) FROM users WHERE role = 'trainer') AS total_trainers,
            (SELECT COUNT(*) FROM courses) AS total_courses,
            (SELECT COUNT(*) FROM courses WHERE is_published) AS published_courses,
            (SELECT COUNT(*) FROM workshops) AS total_workshops,
            (SELECT COUNT(*) FROM workshops WHERE is_active) AS active_workshops,
            (SELECT COUNT(*) FROM labs) AS total_labs,
            (SELECT COUNT(*) FROM labs WHERE is_published) AS published_labs,
            (SELECT COUNT(*) FROM enrollments) AS total_enrollments,
            (SELECT COUNT(*) FROM lab_progress WHERE completed_at IS NOT NULL)
                AS total_lab_completions,
            (SELECT COUNT(*) FROM certificates) AS total_certificates,
            (SELECT COUNT(*) FROM learning_paths) AS total_learning_paths",
    )
    .fetch_one(pool)
    .await
}

/// Rewrites cached course counters from the ledger tables. Returns the number of drifted rows.
pub(crate) async fn reconcile_course_counters(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE courses c SET
            enrolled_count = actual.enrolled,
            completions_count = actual.completed
         FROM (
            SELECT co.id,
                   (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = co.id)::int AS enrolled,
                   (SELECT COUNT(*) FROM certificates ce WHERE ce.course_id = co.id)::int AS completed
            FROM courses co
         ) AS actual
         WHERE c.id = actual.id
           AND (c.enrolled_count <> actual.enrolled OR c.completions_count <> actual.completed)",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn reconcile_lab_counters(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE labs l SET completions_count = actual.completed
         FROM (
            SELECT la.id,
                   (SELECT COUNT(*) FROM lab_progress p
                     WHERE p.lab_id = la.id AND p.completed_at IS NOT NULL)::int AS completed
            FROM labs la
         ) AS actual
         WHERE l.id = actual.id AND l.completions_count <> actual.completed",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn reconcile_workshop_counters(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE workshops w SET registered_count = actual.registered
         FROM (
            SELECT ws.id,
                   (SELECT COUNT(*) FROM workshop_registrations r
                     WHERE r.workshop_id = ws.id)::int AS registered
            FROM workshops ws
         ) AS actual
         WHERE w.id = actual.id AND w.registered_count <> actual.registered",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
