use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Course;

const COURSE_COLUMNS: &str = "\
    id, slug, title, description, level, category, duration_hours, price, thumbnail_url, \
    is_published, created_by, enrolled_count, completions_count, published_at, \
    created_at, updated_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) level: &'a str,
    pub(crate) category: &'a str,
    pub(crate) duration_hours: i32,
    pub(crate) price: i32,
    pub(crate) thumbnail_url: Option<&'a str>,
    pub(crate) is_published: bool,
    pub(crate) created_by: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateCourse {
    pub(crate) slug: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) level: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) duration_hours: Option<i32>,
    pub(crate) price: Option<i32>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) is_published: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct CourseFilter<'a> {
    pub(crate) published_only: bool,
    pub(crate) owner: Option<&'a str>,
    pub(crate) search: Option<&'a str>,
    pub(crate) category: Option<&'a str>,
    pub(crate) level: Option<&'a str>,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateCourse<'_>,
) -> Result<Course, sqlx::Error> {
    let published_at = params.is_published.then_some(params.created_at);

    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, slug, title, description, level, category, duration_hours, price,
            thumbnail_url, is_published, created_by, published_at, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.slug)
    .bind(params.title)
    .bind(params.description)
    .bind(params.level)
    .bind(params.category)
    .bind(params.duration_hours)
    .bind(params.price)
    .bind(params.thumbnail_url)
    .bind(params.is_published)
    .bind(params.created_by)
    .bind(published_at)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

/// Public course URLs use either the slug or the id.
pub(crate) async fn find_by_slug_or_id(
    pool: &PgPool,
    key: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE slug = $1 OR id = $1 \
         ORDER BY (slug = $1) DESC LIMIT 1"
    ))
    .bind(key)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    params: UpdateCourse,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            slug = COALESCE($1, slug),
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            level = COALESCE($4, level),
            category = COALESCE($5, category),
            duration_hours = COALESCE($6, duration_hours),
            price = COALESCE($7, price),
            thumbnail_url = COALESCE($8, thumbnail_url),
            is_published = COALESCE($9, is_published),
            published_at = CASE
                WHEN COALESCE($9, is_published) AND published_at IS NULL THEN $10
                ELSE published_at
            END,
            updated_at = $10
         WHERE id = $11
         RETURNING {COURSE_COLUMNS}",
    ))
    .bind(params.slug)
    .bind(params.title)
    .bind(params.description)
    .bind(params.level)
    .bind(params.category)
    .bind(params.duration_hours)
    .bind(params.price)
    .bind(params.thumbnail_url)
    .bind(params.is_published)
    .bind(params.updated_at)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(course_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn increment_enrolled(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE courses SET enrolled_count = enrolled_count + 1 WHERE id = $1")
        .bind(course_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn increment_completions(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE courses SET completions_count = completions_count + 1 WHERE id = $1")
        .bind(course_id)
        .execute(executor)
        .await?;
    Ok(())
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CourseFilter<'_>) {
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
        builder.push(" OR lower(description) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category.to_string());
    }
    if let Some(level) = filter.level {
        builder.push(" AND level = ");
        builder.push_bind(level.to_string());
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &CourseFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COURSE_COLUMNS} FROM courses"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Course>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &CourseFilter<'_>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn list_by_ids(pool: &PgPool, ids: &[String]) -> Result<Vec<Course>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub(crate) async fn top_by_enrollment(pool: &PgPool, limit: i64) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY enrolled_count DESC, title LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}
