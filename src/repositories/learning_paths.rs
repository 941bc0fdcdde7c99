use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::LearningPath;

const COLUMNS: &str = "\
    id, user_id, skill_name, industry, current_level, goal, content, generated_by, created_at";

pub(crate) struct CreateLearningPath<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) skill_name: &'a str,
    pub(crate) industry: &'a str,
    pub(crate) current_level: &'a str,
    pub(crate) goal: &'a str,
    pub(crate) content: &'a serde_json::Value,
    pub(crate) generated_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateLearningPath<'_>,
) -> Result<LearningPath, sqlx::Error> {
    sqlx::query_as::<_, LearningPath>(&format!(
        "INSERT INTO learning_paths (
            id, user_id, skill_name, industry, current_level, goal, content, generated_by,
            created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.skill_name)
    .bind(params.industry)
    .bind(params.current_level)
    .bind(params.goal)
    .bind(Json(params.content))
    .bind(params.generated_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<LearningPath>, sqlx::Error> {
    sqlx::query_as::<_, LearningPath>(&format!(
        "SELECT {COLUMNS} FROM learning_paths WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    user_id: &str,
    path_id: &str,
) -> Result<Option<LearningPath>, sqlx::Error> {
    sqlx::query_as::<_, LearningPath>(&format!(
        "SELECT {COLUMNS} FROM learning_paths WHERE id = $1 AND user_id = $2"
    ))
    .bind(path_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_for_user(
    pool: &PgPool,
    user_id: &str,
    path_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM learning_paths WHERE id = $1 AND user_id = $2")
        .bind(path_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
