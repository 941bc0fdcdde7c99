use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::progress::{
    ModuleCompleteRequest, ModuleCompleteResponse, ProgressResponse, QuizSubmitRequest,
    QuizSubmitResponse,
};
use crate::services::quiz_policy::QuizPolicy;
use crate::services::{progress_tracker, quiz_evaluator};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/module/complete", post(complete_module))
        .route("/quiz/submit", post(submit_quiz))
        .route("/:course_id", get(get_progress))
}

async fn complete_module(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ModuleCompleteRequest>,
) -> Result<Json<ModuleCompleteResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let outcome = progress_tracker::mark_module_complete(
        state.db(),
        &user,
        &payload.course_id,
        &payload.module_id,
        payload.time_spent_minutes,
    )
    .await?;

    Ok(Json(ModuleCompleteResponse::from_outcome(outcome)))
}

async fn submit_quiz(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<QuizSubmitRequest>,
) -> Result<Json<QuizSubmitResponse>, ApiError> {
    let quiz = state.settings().quiz();
    let policy = QuizPolicy::from_settings(quiz);

    let outcome = quiz_evaluator::submit_quiz(
        state.db(),
        &policy,
        quiz.require_modules_complete,
        &user,
        &payload.course_id,
        &payload.answers,
    )
    .await?;

    Ok(Json(QuizSubmitResponse::from_outcome(outcome)))
}

async fn get_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let policy = QuizPolicy::from_settings(state.settings().quiz());
    let progress =
        progress_tracker::get_progress(state.db(), &policy, &user.id, &course_id).await?;

    Ok(Json(ProgressResponse::from_progress(course_id, progress)))
}

#[cfg(test)]
mod tests;
