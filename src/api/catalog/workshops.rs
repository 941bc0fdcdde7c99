use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::helpers::{map_write_error, owner_scope, CatalogListQuery};
use crate::api::errors::ApiError;
use crate::api::guards::{ensure_can_manage, CurrentStaff};
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::api::validation::{resolve_slug, validate_slug};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::Workshop;
use crate::repositories;
use crate::repositories::workshops::WorkshopFilter;
use crate::schemas::workshop::{WorkshopCreate, WorkshopResponse, WorkshopUpdate};

pub(super) async fn list_workshops(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Query(params): Query<CatalogListQuery>,
) -> Result<Json<PaginatedResponse<WorkshopResponse>>, ApiError> {
    let window = PageWindow::from_query(params.page, params.limit);
    let filter = WorkshopFilter {
        owner: owner_scope(&user),
        search: params.search.as_deref().filter(|value| !value.trim().is_empty()),
        ..WorkshopFilter::default()
    };

    let total = repositories::workshops::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count workshops"))?;
    let workshops =
        repositories::workshops::list(state.db(), &filter, window.skip(), window.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list workshops"))?;

    let items = workshops.into_iter().map(WorkshopResponse::from_db).collect();
    Ok(Json(PaginatedResponse::new(items, total, window)))
}

pub(super) async fn get_workshop(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(workshop_id): Path<String>,
) -> Result<Json<WorkshopResponse>, ApiError> {
    let workshop = load_workshop(&state, &workshop_id).await?;
    ensure_can_manage(&user, workshop.created_by.as_deref())?;
    Ok(Json(WorkshopResponse::from_db(workshop)))
}

pub(super) async fn create_workshop(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Json(payload): Json<WorkshopCreate>,
) -> Result<(StatusCode, Json<WorkshopResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let slug = resolve_slug(payload.slug.as_deref(), &payload.title)?;
    let tags: Vec<String> = payload.tags.iter().map(|tag| tag.trim().to_string()).collect();
    let id = Uuid::new_v4().to_string();

    let workshop = repositories::workshops::create(
        state.db(),
        repositories::workshops::CreateWorkshop {
            id: &id,
            slug: &slug,
            title: payload.title.trim(),
            description: &payload.description,
            starts_at: payload.starts_at.map(to_primitive_utc),
            duration_minutes: payload.duration_minutes,
            platform: &payload.platform,
            image_url: payload.image_url.as_deref(),
            tags: &tags,
            max_participants: payload.max_participants,
            is_active: payload.is_active,
            created_by: Some(&user.id),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| map_write_error(e, "workshop", "Failed to create workshop"))?;

    tracing::info!(workshop_id = %workshop.id, user_id = %user.id, "Workshop created");
    Ok((StatusCode::CREATED, Json(WorkshopResponse::from_db(workshop))))
}

pub(super) async fn update_workshop(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(workshop_id): Path<String>,
    Json(payload): Json<WorkshopUpdate>,
) -> Result<Json<WorkshopResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let workshop = load_workshop(&state, &workshop_id).await?;
    ensure_can_manage(&user, workshop.created_by.as_deref())?;

    if let Some(capacity) = payload.max_participants {
        if capacity < workshop.registered_count {
            return Err(ApiError::Conflict(format!(
                "max_participants cannot drop below the {} registered participants",
                workshop.registered_count
            )));
        }
    }

    let slug = payload.slug.map(|slug| slug.trim().to_string());
    if let Some(slug) = &slug {
        validate_slug(slug)?;
    }

    let updated = repositories::workshops::update(
        state.db(),
        &workshop.id,
        repositories::workshops::UpdateWorkshop {
            slug,
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            starts_at: payload.starts_at.map(to_primitive_utc),
            duration_minutes: payload.duration_minutes,
            platform: payload.platform,
            image_url: payload.image_url,
            tags: payload.tags,
            max_participants: payload.max_participants,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| map_write_error(e, "workshop", "Failed to update workshop"))?;

    Ok(Json(WorkshopResponse::from_db(updated)))
}

pub(super) async fn delete_workshop(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(workshop_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let workshop = load_workshop(&state, &workshop_id).await?;
    ensure_can_manage(&user, workshop.created_by.as_deref())?;

    repositories::workshops::delete_by_id(state.db(), &workshop.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete workshop"))?;

    tracing::info!(workshop_id = %workshop.id, user_id = %user.id, "Workshop deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_workshop(state: &AppState, workshop_id: &str) -> Result<Workshop, ApiError> {
    repositories::workshops::find_by_id(state.db(), workshop_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch workshop"))?
        .ok_or_else(|| ApiError::NotFound("Workshop not found".to_string()))
}
