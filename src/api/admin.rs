use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::admin::{AnalyticsResponse, StatsResponse, TopCourse, TopLab, UserListQuery};
use crate::schemas::user::{RoleUpdate, UserResponse};

const TOP_LIMIT: i64 = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id/role", put(update_role))
        .route("/stats", get(stats))
        .route("/analytics", get(analytics))
}

async fn list_users(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(params): Query<UserListQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let window = PageWindow::from_query(params.page, params.limit);
    let search = params.search.as_deref().map(str::trim).filter(|value| !value.is_empty());

    let total = repositories::users::count(state.db(), params.role, search)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;
    let users =
        repositories::users::list(state.db(), params.role, search, window.skip(), window.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    let items = users.into_iter().map(UserResponse::from_db).collect();
    Ok(Json(PaginatedResponse::new(items, total, window)))
}

async fn update_role(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(user_id): Path<String>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    if user_id == admin.id && payload.role != UserRole::Admin {
        return Err(ApiError::BadRequest("Admins cannot demote themselves".to_string()));
    }

    let updated =
        repositories::users::update_role(state.db(), &user_id, payload.role, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update role"))?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        user_id = %updated.id,
        role = updated.role.as_str(),
        admin_id = %admin.id,
        "User role changed"
    );
    Ok(Json(UserResponse::from_db(updated)))
}

async fn stats(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<StatsResponse>, ApiError> {
    let totals = repositories::stats::platform_totals(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load platform stats"))?;
    Ok(Json(totals.into()))
}

async fn analytics(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let courses = repositories::courses::top_by_enrollment(state.db(), TOP_LIMIT)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load top courses"))?;
    let labs = repositories::labs::top_by_completions(state.db(), TOP_LIMIT)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load top labs"))?;
    let roles = repositories::users::count_by_role(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users by role"))?;

    let mut users_by_role: BTreeMap<&'static str, i64> =
        [UserRole::Learner, UserRole::Trainer, UserRole::Admin]
            .into_iter()
            .map(|role| (role.as_str(), 0))
            .collect();
    for (role, count) in roles {
        users_by_role.insert(role.as_str(), count);
    }

    Ok(Json(AnalyticsResponse {
        top_courses: courses.into_iter().map(TopCourse::from_db).collect(),
        top_labs: labs.into_iter().map(TopLab::from_db).collect(),
        users_by_role,
    }))
}
