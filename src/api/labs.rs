use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Lab, User};
use crate::repositories;
use crate::repositories::labs::LabFilter;
use crate::schemas::lab::{
    ExecuteRequest, LabCompleteResponse, LabListQuery, LabProgressResponse, LabResponse,
    SaveProgressQuery,
};
use crate::services::lab_sandbox::{ExecutionRequest, ExecutionResult};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_labs))
        .route("/execute", post(execute_code))
        .route("/:lab_id", get(get_lab))
        .route("/:lab_id/start", post(start_lab))
        .route("/:lab_id/save-progress", post(save_progress))
        .route("/:lab_id/progress", get(get_progress))
        .route("/:lab_id/complete", post(complete_lab))
}

async fn list_labs(
    State(state): State<AppState>,
    Query(params): Query<LabListQuery>,
) -> Result<Json<PaginatedResponse<LabResponse>>, ApiError> {
    let window = PageWindow::from_query(params.page, params.limit);
    let filter = LabFilter {
        published_only: true,
        search: params.search.as_deref().filter(|value| !value.trim().is_empty()),
        difficulty: params.difficulty.as_deref(),
        ..LabFilter::default()
    };

    let total = repositories::labs::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count labs"))?;
    let labs = repositories::labs::list(state.db(), &filter, window.skip(), window.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list labs"))?;

    let items = labs.into_iter().map(LabResponse::from_db).collect();
    Ok(Json(PaginatedResponse::new(items, total, window)))
}

async fn get_lab(
    State(state): State<AppState>,
    Path(key): Path<String>,
    viewer: Option<CurrentUser>,
) -> Result<Json<LabResponse>, ApiError> {
    let viewer = viewer.map(|CurrentUser(user)| user);
    let lab = repositories::labs::find_by_slug_or_id(state.db(), &key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lab"))?
        .filter(|lab| lab.is_published || viewer.as_ref().is_some_and(|user| can_preview(user, lab)))
        .ok_or_else(|| ApiError::NotFound("Lab not found".to_string()))?;

    Ok(Json(LabResponse::from_db(lab)))
}

fn can_preview(user: &User, lab: &Lab) -> bool {
    user.role.is_admin() || lab.is_owned_by(&user.id)
}

async fn load_visible_lab(state: &AppState, user: &User, lab_id: &str) -> Result<Lab, ApiError> {
    repositories::labs::find_by_id(state.db(), lab_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lab"))?
        .filter(|lab| lab.is_published || can_preview(user, lab))
        .ok_or_else(|| ApiError::NotFound("Lab not found".to_string()))
}

fn ensure_step(lab: &Lab, step_id: &str) -> Result<(), ApiError> {
    if lab.steps.0.iter().any(|step| step.id == step_id) {
        Ok(())
    } else {
        Err(ApiError::NotFound("Step not found in this lab".to_string()))
    }
}

async fn execute_code(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let lab = load_visible_lab(&state, &user, &payload.lab_id).await?;
    ensure_step(&lab, &payload.step_id)?;

    let result = state
        .sandbox()
        .execute(ExecutionRequest {
            lab_id: lab.id,
            step_id: payload.step_id,
            code: payload.code,
            execution_type: payload.execution_type,
        })
        .await?;

    tracing::debug!(user_id = %user.id, success = result.success, "Lab code executed");
    Ok(Json(result))
}

async fn start_lab(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lab_id): Path<String>,
) -> Result<Json<LabProgressResponse>, ApiError> {
    let lab = load_visible_lab(&state, &user, &lab_id).await?;

    let progress =
        repositories::labs::start_progress(state.db(), &user.id, &lab.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to start lab"))?;

    Ok(Json(LabProgressResponse::from_db(lab.id, Some(progress))))
}

async fn save_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lab_id): Path<String>,
    Query(params): Query<SaveProgressQuery>,
) -> Result<Json<LabProgressResponse>, ApiError> {
    let lab = load_visible_lab(&state, &user, &lab_id).await?;
    ensure_step(&lab, &params.step_id)?;

    let now = primitive_now_utc();
    repositories::labs::start_progress(state.db(), &user.id, &lab.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start lab"))?;
    let progress =
        repositories::labs::record_step(state.db(), &user.id, &lab.id, &params.step_id, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to save lab progress"))?;

    Ok(Json(LabProgressResponse::from_db(lab.id, progress)))
}

async fn get_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lab_id): Path<String>,
) -> Result<Json<LabProgressResponse>, ApiError> {
    let lab = load_visible_lab(&state, &user, &lab_id).await?;
    let progress = repositories::labs::find_progress(state.db(), &user.id, &lab.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lab progress"))?;

    Ok(Json(LabProgressResponse::from_db(lab.id, progress)))
}

/// Repeats succeed without moving the completion counter.
async fn complete_lab(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lab_id): Path<String>,
) -> Result<Json<LabCompleteResponse>, ApiError> {
    let lab = load_visible_lab(&state, &user, &lab_id).await?;

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let newly_completed =
        repositories::labs::complete(&mut *tx, &user.id, &lab.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to complete lab"))?;
    if newly_completed {
        repositories::labs::increment_completions(&mut *tx, &lab.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update lab counters"))?;
    }
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit lab completion"))?;

    if newly_completed {
        tracing::info!(user_id = %user.id, lab_id = %lab.id, "Lab completed");
    }

    Ok(Json(LabCompleteResponse { lab_id: lab.id, completed: true, newly_completed }))
}
