use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Workshop;

const COLUMNS: &str = "\
    id, slug, title, description, starts_at, duration_minutes, platform, image_url, tags, \
    max_participants, registered_count, is_active, created_by, created_at, updated_at";

pub(crate) struct CreateWorkshop<'a> {
    pub(crate) id: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) starts_at: Option<time::PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) platform: &'a str,
    pub(crate) image_url: Option<&'a str>,
    pub(crate) tags: &'a [String],
    pub(crate) max_participants: i32,
    pub(crate) is_active: bool,
    pub(crate) created_by: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateWorkshop {
    pub(crate) slug: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) starts_at: Option<time::PrimitiveDateTime>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) platform: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) tags: Option<Vec<String>>,
    pub(crate) max_participants: Option<i32>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct WorkshopFilter<'a> {
    pub(crate) active_only: bool,
    pub(crate) owner: Option<&'a str>,
    pub(crate) search: Option<&'a str>,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registration {
    Registered,
    AlreadyRegistered,
    Full,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateWorkshop<'_>,
) -> Result<Workshop, sqlx::Error> {
    sqlx::query_as::<_, Workshop>(&format!(
        "INSERT INTO workshops (
            id, slug, title, description, starts_at, duration_minutes, platform, image_url,
            tags, max_participants, is_active, created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.slug)
    .bind(params.title)
    .bind(params.description)
    .bind(params.starts_at)
    .bind(params.duration_minutes)
    .bind(params.platform)
    .bind(params.image_url)
    .bind(Json(params.tags))
    .bind(params.max_participants)
    .bind(params.is_active)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    workshop_id: &str,
) -> Result<Option<Workshop>, sqlx::Error> {
    sqlx::query_as::<_, Workshop>(&format!("SELECT {COLUMNS} FROM workshops WHERE id = $1"))
        .bind(workshop_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    workshop_id: &str,
    params: UpdateWorkshop,
) -> Result<Workshop, sqlx::Error> {
    sqlx::query_as::<_, Workshop>(&format!(
        "UPDATE workshops SET
            slug = COALESCE($1, slug),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            starts_at = COALESCE($4, starts_at),
            duration_minutes = COALESCE($5, duration_minutes),
            platform = COALESCE($6, platform),
            image_url = COALESCE($7, image_url),
            tags = COALESCE($8, tags),
            max_participants = COALESCE($9, max_participants),
            is_active = COALESCE($10, is_active),
            updated_at = $11
         WHERE id = $12
         RETURNING {COLUMNS}",
    ))
    .bind(params.slug)
    .bind(params.title)
    .bind(params.description)
    .bind(params.starts_at)
    .bind(params.duration_minutes)
    .bind(params.platform)
    .bind(params.image_url)
    .bind(params.tags.map(Json))
    .bind(params.max_participants)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(workshop_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, workshop_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM workshops WHERE id = $1").bind(workshop_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &WorkshopFilter<'_>) {
    builder.push(" WHERE 1=1");
    if filter.active_only {
        builder.push(" AND is_active = TRUE");
    }
    if let Some(owner) = filter.owner {
        builder.push(" AND created_by = ");
        builder.push_bind(owner.to_string());
    }
    if let Some(search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        builder.push(" AND (lower(title) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(description) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &WorkshopFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Workshop>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM workshops"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY starts_at ASC NULLS LAST, created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Workshop>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &WorkshopFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM workshops");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Registers a user while holding the seat count inside one transaction.
pub(crate) async fn register(
    pool: &PgPool,
    user_id: &str,
    workshop_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Registration, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO workshop_registrations (user_id, workshop_id, registered_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, workshop_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(workshop_id)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .rows_affected()
        > 0;

    if !inserted {
        tx.commit().await?;
        return Ok(Registration::AlreadyRegistered);
    }

    let seated = sqlx::query(
        "UPDATE workshops SET registered_count = registered_count + 1
         WHERE id = $1 AND registered_count < max_participants",
    )
    .bind(workshop_id)
    .execute(&mut *tx)
    .await?
    .rows_affected()
        > 0;

    if !seated {
        tx.rollback().await?;
        return Ok(Registration::Full);
    }

    tx.commit().await?;
    Ok(Registration::Registered)
}
