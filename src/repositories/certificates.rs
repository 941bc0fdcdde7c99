use sqlx::PgPool;

use crate::db::models::Certificate;

const COLUMNS: &str = "\
    id, certificate_number, user_id, course_id, user_name, course_title, quiz_score, issued_at";

pub(crate) struct NewCertificate<'a> {
    pub(crate) id: &'a str,
    pub(crate) certificate_number: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) user_name: &'a str,
    pub(crate) course_title: &'a str,
    pub(crate) quiz_score: f64,
    pub(crate) issued_at: time::PrimitiveDateTime,
}

/// `None` when the row clashes with an existing certificate, either for the same
/// (user, course) pair or on the number itself. Callers tell the two apart with [`find_for`].
pub(crate) async fn insert_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    params: NewCertificate<'_>,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "INSERT INTO certificates (
            id, certificate_number, user_id, course_id, user_name, course_title,
            quiz_score, issued_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         ON CONFLICT DO NOTHING
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.certificate_number)
    .bind(params.user_id)
    .bind(params.course_id)
    .bind(params.user_name)
    .bind(params.course_title)
    .bind(params.quiz_score)
    .bind(params.issued_at)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_for(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_number(
    pool: &PgPool,
    certificate_number: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE certificate_number = $1"
    ))
    .bind(certificate_number)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_user_by_id(
    pool: &PgPool,
    user_id: &str,
    id: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE user_id = $1 AND id = $2"
    ))
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<Certificate>, sqlx::Error> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE user_id = $1 ORDER BY issued_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}
