use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Lab, LabProgress, LabStep};

const LAB_COLUMNS: &str = "\
    id, slug, title, topic, difficulty, duration, description, steps, video_url, \
    is_published, created_by, completions_count, created_at, updated_at";

const PROGRESS_COLUMNS: &str =
    "user_id, lab_id, completed_steps, started_at, updated_at, completed_at";

pub(crate) struct CreateLab<'a> {
    pub(crate) id: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) title: &'a str,
    pub(crate) topic: &'a str,
    pub(crate) difficulty: &'a str,
    pub(crate) duration: &'a str,
    pub(crate) description: &'a str,
    pub(crate) steps: &'a [LabStep],
    pub(crate) video_url: Option<&'a str>,
    pub(crate) is_published: bool,
    pub(crate) created_by: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateLab {
    pub(crate) slug: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) topic: Option<String>,
    pub(crate) difficulty: Option<String>,
    pub(crate) duration: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) steps: Option<Vec<LabStep>>,
    pub(crate) video_url: Option<String>,
    pub(crate) is_published: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct LabFilter<'a> {
    pub(crate) published_only: bool,
    pub(crate) owner: Option<&'a str>,
    pub(crate) search: Option<&'a str>,
    pub(crate) difficulty: Option<&'a str>,
}

pub(crate) async fn create(pool: &PgPool, params: CreateLab<'_>) -> Result<Lab, sqlx::Error> {
    sqlx::query_as::<_, Lab>(&format!(
        "INSERT INTO labs (
            id, slug, title, topic, difficulty, duration, description, steps, video_url,
            is_published, created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$12)
         RETURNING {LAB_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.slug)
    .bind(params.title)
    .bind(params.topic)
    .bind(params.difficulty)
    .bind(params.duration)
    .bind(params.description)
    .bind(Json(params.steps))
    .bind(params.video_url)
    .bind(params.is_published)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, lab_id: &str) -> Result<Option<Lab>, sqlx::Error> {
    sqlx::query_as::<_, Lab>(&format!("SELECT {LAB_COLUMNS} FROM labs WHERE id = $1"))
        .bind(lab_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_slug_or_id(
    pool: &PgPool,
    key: &str,
) -> Result<Option<Lab>, sqlx::Error> {
    sqlx::query_as::<_, Lab>(&format!(
        "SELECT {LAB_COLUMNS} FROM labs WHERE slug = $1 OR id = $1 \
         ORDER BY (slug = $1) DESC LIMIT 1"
    ))
    .bind(key)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    lab_id: &str,
    params: UpdateLab,
) -> Result<Lab, sqlx::Error> {
    sqlx::query_as::<_, Lab>(&format!(
        "UPDATE labs SET
            slug = COALESCE($1, slug),
            title = COALESCE($2, title),
            topic = COALESCE($3, topic),
            difficulty = COALESCE($4, difficulty),
            duration = COALESCE($5, duration),
            description = COALESCE($6, description),
            steps = COALESCE($7, steps),
            video_url = COALESCE($8, video_url),
            is_published = COALESCE($9, is_published),
            updated_at = $10
         WHERE id = $11
         RETURNING {LAB_COLUMNS}",
    ))
    .bind(params.slug)
    .bind(params.title)
    .bind(params.topic)
    .bind(params.difficulty)
    .bind(params.duration)
    .bind(params.description)
    .bind(params.steps.map(Json))
    .bind(params.video_url)
    .bind(params.is_published)
    .bind(params.updated_at)
    .bind(lab_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, lab_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM labs WHERE id = $1").bind(lab_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &LabFilter<'_>) {
    builder.push(" WHERE 1=1");
    if filter.published_only {
        builder.push(" AND is_published = TRUE");
    }
    if let Some(owner) = filter.owner {
        builder.push(" AND created_by = ");
        builder.push_bind(owner.to_string());
    }
    if let Some(search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        builder.push(" AND (lower(title) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(topic) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(difficulty) = filter.difficulty {
        builder.push(" AND difficulty = ");
        builder.push_bind(difficulty.to_string());
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &LabFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Lab>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {LAB_COLUMNS} FROM labs"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Lab>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &LabFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM labs");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn top_by_completions(pool: &PgPool, limit: i64) -> Result<Vec<Lab>, sqlx::Error> {
    sqlx::query_as::<_, Lab>(&format!(
        "SELECT {LAB_COLUMNS} FROM labs ORDER BY completions_count DESC, title LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Starting twice keeps the original progress row.
pub(crate) async fn start_progress(
    pool: &PgPool,
    user_id: &str,
    lab_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<LabProgress, sqlx::Error> {
    sqlx::query(
        "INSERT INTO lab_progress (user_id, lab_id, completed_steps, started_at, updated_at)
         VALUES ($1, $2, '[]'::jsonb, $3, $3)
         ON CONFLICT (user_id, lab_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(lab_id)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, LabProgress>(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM lab_progress WHERE user_id = $1 AND lab_id = $2"
    ))
    .bind(user_id)
    .bind(lab_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_progress(
    pool: &PgPool,
    user_id: &str,
    lab_id: &str,
) -> Result<Option<LabProgress>, sqlx::Error> {
    sqlx::query_as::<_, LabProgress>(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM lab_progress WHERE user_id = $1 AND lab_id = $2"
    ))
    .bind(user_id)
    .bind(lab_id)
    .fetch_optional(pool)
    .await
}

/// Adds a step id to the progress set once; `None` when the lab was never started.
pub(crate) async fn record_step(
    pool: &PgPool,
    user_id: &str,
    lab_id: &str,
    step_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<LabProgress>, sqlx::Error> {
    sqlx::query_as::<_, LabProgress>(&format!(
        "UPDATE lab_progress SET
            completed_steps = CASE
                WHEN completed_steps ? $3 THEN completed_steps
                ELSE completed_steps || to_jsonb($3::text)
            END,
            updated_at = $4
         WHERE user_id = $1 AND lab_id = $2
         RETURNING {PROGRESS_COLUMNS}",
    ))
    .bind(user_id)
    .bind(lab_id)
    .bind(step_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Marks completion, creating the progress row if needed. `true` only for the first completion.
pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    lab_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO lab_progress (user_id, lab_id, completed_steps, started_at, updated_at, completed_at)
         VALUES ($1, $2, '[]'::jsonb, $3, $3, $3)
         ON CONFLICT (user_id, lab_id) DO UPDATE
            SET completed_at = EXCLUDED.completed_at, updated_at = EXCLUDED.updated_at
            WHERE lab_progress.completed_at IS NULL",
    )
    .bind(user_id)
    .bind(lab_id)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn increment_completions(
    executor: impl sqlx::PgExecutor<'_>,
    lab_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE labs SET completions_count = completions_count + 1 WHERE id = $1")
        .bind(lab_id)
        .execute(executor)
        .await?;
    Ok(())
}
