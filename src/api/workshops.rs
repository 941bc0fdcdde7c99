use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::workshops::{Registration, WorkshopFilter};
use crate::schemas::workshop::{RegistrationResponse, WorkshopListQuery, WorkshopResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_workshops))
        .route("/:workshop_id", get(get_workshop))
        .route("/:workshop_id/register", post(register))
}

async fn list_workshops(
    State(state): State<AppState>,
    Query(params): Query<WorkshopListQuery>,
) -> Result<Json<PaginatedResponse<WorkshopResponse>>, ApiError> {
    let window = PageWindow::from_query(params.page, params.limit);
    let filter = WorkshopFilter {
        active_only: true,
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

async fn get_workshop(
    State(state): State<AppState>,
    Path(workshop_id): Path<String>,
) -> Result<Json<WorkshopResponse>, ApiError> {
    let workshop = repositories::workshops::find_by_id(state.db(), &workshop_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch workshop"))?
        .filter(|workshop| workshop.is_active)
        .ok_or_else(|| ApiError::NotFound("Workshop not found".to_string()))?;

    Ok(Json(WorkshopResponse::from_db(workshop)))
}

async fn register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(workshop_id): Path<String>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    let workshop = repositories::workshops::find_by_id(state.db(), &workshop_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch workshop"))?
        .filter(|workshop| workshop.is_active)
        .ok_or_else(|| ApiError::NotFound("Workshop not found".to_string()))?;

    let outcome =
        repositories::workshops::register(state.db(), &user.id, &workshop.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to register for workshop"))?;

    let (status, already_registered) = match outcome {
        Registration::Registered => {
            tracing::info!(user_id = %user.id, workshop_id = %workshop.id, "Workshop registration");
            (StatusCode::CREATED, false)
        }
        Registration::AlreadyRegistered => (StatusCode::OK, true),
        Registration::Full => return Err(ApiError::Conflict("Workshop is full".to_string())),
    };

    Ok((
        status,
        Json(RegistrationResponse { workshop_id: workshop.id, registered: true, already_registered }),
    ))
}

#[cfg(test)]
mod tests;
