use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, email, hashed_password, first_name, last_name, bio, skills, role, \
    is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) first_name: &'a str,
    pub(crate) last_name: &'a str,
    pub(crate) role: UserRole,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Fails with a unique violation when the email is taken.
pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, hashed_password, first_name, last_name, role, is_active,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,TRUE,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.role)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateProfile {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) bio: Option<String>,
    pub(crate) skills: Option<Vec<String>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update_profile(
    pool: &PgPool,
    id: &str,
    params: UpdateProfile,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            bio = COALESCE($3, bio),
            skills = COALESCE($4, skills),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.bio)
    .bind(params.skills.map(sqlx::types::Json))
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update_password(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET hashed_password = $1, updated_at = $2 WHERE id = $3")
        .bind(hashed_password)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn update_role(
    pool: &PgPool,
    id: &str,
    role: UserRole,
    updated_at: time::PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}"
    ))
    .bind(role)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Restores an account to an active admin with the given password hash.
pub(crate) async fn promote_to_admin(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users
         SET hashed_password = $1, role = $2, is_active = TRUE, updated_at = $3
         WHERE id = $4",
    )
    .bind(hashed_password)
    .bind(UserRole::Admin)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, role: Option<UserRole>, search: Option<&str>) {
    builder.push(" WHERE 1=1");
    if let Some(role) = role {
        builder.push(" AND role = ");
        builder.push_bind(role);
    }
    if let Some(search) = search {
        let pattern = format!("%{}%", search.to_lowercase());
        builder.push(" AND (lower(email) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lower(first_name || ' ' || last_name) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    role: Option<UserRole>,
    search: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users"));
    push_filters(&mut builder, role, search);
    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    role: Option<UserRole>,
    search: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
    push_filters(&mut builder, role, search);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn count_by_role(pool: &PgPool) -> Result<Vec<(UserRole, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (UserRole, i64)>(
        "SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role",
    )
    .fetch_all(pool)
    .await
}
