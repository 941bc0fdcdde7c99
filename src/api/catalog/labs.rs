use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::helpers::{map_write_error, normalize_steps, owner_scope, CatalogListQuery};
use crate::api::errors::ApiError;
use crate::api::guards::{ensure_can_manage, CurrentStaff};
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::api::validation::{resolve_slug, validate_slug};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Lab;
use crate::repositories;
use crate::repositories::labs::LabFilter;
use crate::schemas::lab::{LabCreate, LabResponse, LabUpdate};

pub(super) async fn list_labs(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Query(params): Query<CatalogListQuery>,
) -> Result<Json<PaginatedResponse<LabResponse>>, ApiError> {
    let window = PageWindow::from_query(params.page, params.limit);
    let filter = LabFilter {
        owner: owner_scope(&user),
        search: params.search.as_deref().filter(|value| !value.trim().is_empty()),
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

pub(super) async fn get_lab(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(lab_id): Path<String>,
) -> Result<Json<LabResponse>, ApiError> {
    let lab = load_lab(&state, &lab_id).await?;
    ensure_can_manage(&user, lab.created_by.as_deref())?;
    Ok(Json(LabResponse::from_db(lab)))
}

pub(super) async fn create_lab(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Json(payload): Json<LabCreate>,
) -> Result<(StatusCode, Json<LabResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let slug = resolve_slug(payload.slug.as_deref(), &payload.title)?;
    let steps = normalize_steps(payload.steps)?;
    let id = Uuid::new_v4().to_string();

    let lab = repositories::labs::create(
        state.db(),
        repositories::labs::CreateLab {
            id: &id,
            slug: &slug,
            title: payload.title.trim(),
            topic: &payload.topic,
            difficulty: &payload.difficulty,
            duration: &payload.duration,
            description: &payload.description,
            steps: &steps,
            video_url: payload.video_url.as_deref(),
            is_published: payload.is_published,
            created_by: Some(&user.id),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| map_write_error(e, "lab", "Failed to create lab"))?;

    tracing::info!(lab_id = %lab.id, user_id = %user.id, "Lab created");
    Ok((StatusCode::CREATED, Json(LabResponse::from_db(lab))))
}

pub(super) async fn update_lab(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(lab_id): Path<String>,
    Json(payload): Json<LabUpdate>,
) -> Result<Json<LabResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let lab = load_lab(&state, &lab_id).await?;
    ensure_can_manage(&user, lab.created_by.as_deref())?;

    let slug = payload.slug.map(|slug| slug.trim().to_string());
    if let Some(slug) = &slug {
        validate_slug(slug)?;
    }
    let steps = payload.steps.map(normalize_steps).transpose()?;

    let updated = repositories::labs::update(
        state.db(),
        &lab.id,
        repositories::labs::UpdateLab {
            slug,
            title: payload.title.map(|title| title.trim().to_string()),
            topic: payload.topic,
            difficulty: payload.difficulty,
            duration: payload.duration,
            description: payload.description,
            steps,
            video_url: payload.video_url,
            is_published: payload.is_published,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| map_write_error(e, "lab", "Failed to update lab"))?;

    Ok(Json(LabResponse::from_db(updated)))
}

pub(super) async fn delete_lab(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(lab_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let lab = load_lab(&state, &lab_id).await?;
    ensure_can_manage(&user, lab.created_by.as_deref())?;

    repositories::labs::delete_by_id(state.db(), &lab.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete lab"))?;

    tracing::info!(lab_id = %lab.id, user_id = %user.id, "Lab deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_lab(state: &AppState, lab_id: &str) -> Result<Lab, ApiError> {
    repositories::labs::find_by_id(state.db(), lab_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch lab"))?
        .ok_or_else(|| ApiError::NotFound("Lab not found".to_string()))
}
