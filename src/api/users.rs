use axum::{extract::State, routing::get, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{ProfileUpdate, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile).put(update_profile))
}

async fn profile(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let skills = payload.skills.map(|skills| {
        skills
            .into_iter()
            .map(|skill| skill.trim().to_string())
            .filter(|skill| !skill.is_empty())
            .collect()
    });

    let updated = repositories::users::update_profile(
        state.db(),
        &user.id,
        repositories::users::UpdateProfile {
            first_name: payload.first_name.map(|value| value.trim().to_string()),
            last_name: payload.last_name.map(|value| value.trim().to_string()),
            bio: payload.bio,
            skills,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?;

    Ok(Json(UserResponse::from_db(updated)))
}

#[cfg(test)]
mod tests;
