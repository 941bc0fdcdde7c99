use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::learning_path::{GeneratePathRequest, LearningPathResponse};
use crate::services::learning_paths::PathRequest;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/paths", get(list_paths))
        .route("/paths/:path_id", get(get_path).delete(delete_path))
}

async fn generate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<GeneratePathRequest>,
) -> Result<(StatusCode, Json<LearningPathResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let request = PathRequest {
        skill_name: payload.skill_name.trim().to_string(),
        current_level: payload.current_level.trim().to_string(),
        industry: payload.industry.trim().to_string(),
        goal: payload.goal.trim().to_string(),
    };
    let generated = state.path_generator().generate(&request).await;

    let id = Uuid::new_v4().to_string();
    let path = repositories::learning_paths::create(
        state.db(),
        repositories::learning_paths::CreateLearningPath {
            id: &id,
            user_id: &user.id,
            skill_name: &request.skill_name,
            industry: &request.industry,
            current_level: &request.current_level,
            goal: &request.goal,
            content: &generated.content,
            generated_by: &generated.generated_by,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store learning path"))?;

    tracing::info!(
        user_id = %user.id,
        path_id = %path.id,
        generated_by = %path.generated_by,
        "Learning path created"
    );
    Ok((StatusCode::CREATED, Json(LearningPathResponse::from_db(path))))
}

async fn list_paths(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<LearningPathResponse>>, ApiError> {
    let paths = repositories::learning_paths::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list learning paths"))?;

    Ok(Json(paths.into_iter().map(LearningPathResponse::from_db).collect()))
}

async fn get_path(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path_id): Path<String>,
) -> Result<Json<LearningPathResponse>, ApiError> {
    let path = repositories::learning_paths::find_for_user(state.db(), &user.id, &path_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch learning path"))?
        .ok_or_else(|| ApiError::NotFound("Learning path not found".to_string()))?;

    Ok(Json(LearningPathResponse::from_db(path)))
}

async fn delete_path(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::learning_paths::delete_for_user(state.db(), &user.id, &path_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete learning path"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Learning path not found".to_string()))
    }
}
