use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{ensure_can_manage, CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::{Assignment, Course};
use crate::repositories;
use crate::schemas::assignment::{
    AssignmentCreate, AssignmentResponse, GradeRequest, GradeResponse, LearnerSubmissionResponse,
    SubmissionResponse, SubmitWorkRequest,
};
use crate::services::{assignment_review, enrollment_ledger};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/assignments", post(create_assignment))
        .route("/assignments/:assignment_id", delete(delete_assignment))
        .route("/assignments/:assignment_id/submit", post(submit_assignment))
        .route("/assignments/:assignment_id/submissions", get(list_submissions))
        .route("/submissions/:submission_id/grade", put(grade_submission))
}

/// Every assignment of a visible course, with the caller's own submission attached.
pub(crate) async fn list_for_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .filter(|course| course.is_published || enrollment_ledger::can_access_course(&user, course))
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let assignments = repositories::assignments::list_for_course(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;
    let mut submissions: HashMap<String, _> =
        repositories::assignments::list_submissions_for_learner(state.db(), &user.id, &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?
            .into_iter()
            .map(|submission| (submission.assignment_id.clone(), submission))
            .collect();

    let items = assignments
        .into_iter()
        .map(|assignment| {
            let submission = submissions.remove(&assignment.id);
            AssignmentResponse::from_db(assignment, submission)
        })
        .collect();
    Ok(Json(items))
}

async fn create_assignment(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let course = load_course(&state, &payload.course_id).await?;
    ensure_can_manage(&user, course.created_by.as_deref())?;

    let module_id = payload.module_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    if let Some(module_id) = module_id {
        let exists = repositories::course_content::module_exists(state.db(), &course.id, module_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check module"))?;
        if !exists {
            return Err(ApiError::BadRequest(format!("Module '{module_id}' is not part of this course")));
        }
    }

    let id = Uuid::new_v4().to_string();
    let assignment = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &id,
            course_id: &course.id,
            module_id,
            title: payload.title.trim(),
            description: &payload.description,
            instructions: &payload.instructions,
            due_date: payload.due_date.map(to_primitive_utc),
            max_score: payload.max_score,
            is_required: payload.is_required,
            created_by: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    tracing::info!(
        assignment_id = %assignment.id,
        course_id = %course.id,
        is_required = assignment.is_required,
        "Assignment created"
    );
    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment, None))))
}

async fn delete_assignment(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(assignment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (assignment, course) = load_managed_assignment(&state, &assignment_id).await?;
    ensure_can_manage(&user, course.created_by.as_deref())?;

    repositories::assignments::delete_by_id(state.db(), &assignment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete assignment"))?;

    tracing::info!(assignment_id = %assignment.id, "Assignment deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_assignment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(assignment_id): Path<String>,
    Json(payload): Json<SubmitWorkRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;
    if payload.is_empty() {
        return Err(ApiError::BadRequest("Provide a submission_url or notes".to_string()));
    }

    let assignment = load_assignment(&state, &assignment_id).await?;
    let submission_url =
        payload.submission_url.as_deref().map(str::trim).filter(|url| !url.is_empty());

    let submission = assignment_review::submit_work(
        state.db(),
        &user,
        &assignment,
        submission_url,
        payload.notes.trim(),
    )
    .await?;

    let status = if submission.resubmitted { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(SubmissionResponse::from_db(submission))))
}

async fn list_submissions(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(assignment_id): Path<String>,
) -> Result<Json<Vec<LearnerSubmissionResponse>>, ApiError> {
    let (assignment, course) = load_managed_assignment(&state, &assignment_id).await?;
    ensure_can_manage(&user, course.created_by.as_deref())?;

    let rows = repositories::assignments::list_submissions(state.db(), &assignment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(rows.into_iter().map(LearnerSubmissionResponse::from_row).collect()))
}

async fn grade_submission(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(submission_id): Path<String>,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<GradeResponse>, ApiError> {
    let submission = repositories::assignments::find_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
    let (assignment, course) = load_managed_assignment(&state, &submission.assignment_id).await?;
    ensure_can_manage(&user, course.created_by.as_deref())?;

    let outcome = assignment_review::grade_submission(
        state.db(),
        &user,
        &assignment,
        &submission,
        payload.grade,
        payload.feedback.trim(),
    )
    .await?;

    Ok(Json(GradeResponse::from_outcome(outcome)))
}

async fn load_course(state: &AppState, course_id: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

async fn load_assignment(state: &AppState, assignment_id: &str) -> Result<Assignment, ApiError> {
    repositories::assignments::find_by_id(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))
}

/// Assignments are managed by whoever manages their course.
async fn load_managed_assignment(
    state: &AppState,
    assignment_id: &str,
) -> Result<(Assignment, Course), ApiError> {
    let assignment = load_assignment(state, assignment_id).await?;
    let course = load_course(state, &assignment.course_id).await?;
    Ok((assignment, course))
}

#[cfg(test)]
mod tests;
