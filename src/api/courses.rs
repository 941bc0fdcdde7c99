use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::assignments;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::repositories;
use crate::repositories::courses::CourseFilter;
use crate::schemas::course::{
    CourseDetailResponse, CourseListQuery, CourseResponse, EnrollRequest, EnrollmentResponse,
    ModuleResponse, MyCourseResponse, QuestionResponse,
};
use crate::services::enrollment_ledger;
use crate::services::quiz_policy::Percent;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/enroll", post(enroll))
        .route("/:course_id", get(get_course))
        .route("/:course_id/enroll", post(enroll_by_path))
        .route("/:course_id/assignments", get(assignments::list_for_course))
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseListQuery>,
) -> Result<Json<PaginatedResponse<CourseResponse>>, ApiError> {
    let window = PageWindow::from_query(params.page, params.limit);
    let filter = CourseFilter {
        published_only: true,
        search: params.search.as_deref().filter(|value| !value.trim().is_empty()),
        category: params.category.as_deref(),
        level: params.level.as_deref(),
        ..CourseFilter::default()
    };

    let total = repositories::courses::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count courses"))?;
    let courses = repositories::courses::list(state.db(), &filter, window.skip(), window.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    let items = courses.into_iter().map(CourseResponse::from_db).collect();
    Ok(Json(PaginatedResponse::new(items, total, window)))
}

/// Accepts a slug or an id. Drafts are only visible to their author and admins.
async fn get_course(
    State(state): State<AppState>,
    Path(key): Path<String>,
    viewer: Option<CurrentUser>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let viewer = viewer.map(|CurrentUser(user)| user);

    let course = repositories::courses::find_by_slug_or_id(state.db(), &key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .filter(|course| {
            course.is_published
                || viewer
                    .as_ref()
                    .is_some_and(|user| enrollment_ledger::can_access_course(user, course))
        })
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let reveal_answers = viewer
        .as_ref()
        .is_some_and(|user| can_see_answers(user, course.created_by.as_deref()));

    let modules = repositories::course_content::list_modules(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course modules"))?;
    let questions = repositories::course_content::list_questions(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz questions"))?;

    let is_enrolled = match &viewer {
        Some(user) => enrollment_ledger::is_enrolled(state.db(), &user.id, &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?,
        None => false,
    };

    Ok(Json(CourseDetailResponse {
        course: CourseResponse::from_db(course),
        modules: modules.into_iter().map(ModuleResponse::from_db).collect(),
        quiz_questions: questions
            .into_iter()
            .map(|question| QuestionResponse::from_db(question, reveal_answers))
            .collect(),
        is_enrolled,
    }))
}

fn can_see_answers(user: &User, created_by: Option<&str>) -> bool {
    user.role.is_admin() || (user.role.is_staff() && created_by == Some(user.id.as_str()))
}

async fn enroll(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    enroll_user(&state, &user, &payload.course_id).await
}

async fn enroll_by_path(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    enroll_user(&state, &user, &course_id).await
}

async fn enroll_user(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let outcome = enrollment_ledger::enroll(state.db(), user, course_id).await?;
    let status = if outcome.newly_enrolled { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(EnrollmentResponse::from_db(outcome.enrollment, outcome.newly_enrolled))))
}

pub(crate) async fn my_courses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<MyCourseResponse>>, ApiError> {
    let enrollments = repositories::enrollments::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    let course_ids: Vec<String> =
        enrollments.iter().map(|enrollment| enrollment.course_id.clone()).collect();
    let mut courses: HashMap<String, _> = repositories::courses::list_by_ids(state.db(), &course_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrolled courses"))?
        .into_iter()
        .map(|course| (course.id.clone(), course))
        .collect();

    let certificates: HashMap<String, String> =
        repositories::certificates::list_for_user(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load certificates"))?
            .into_iter()
            .map(|certificate| (certificate.course_id, certificate.certificate_number))
            .collect();

    let mut items = Vec::with_capacity(enrollments.len());
    for enrollment in enrollments {
        let Some(course) = courses.remove(&enrollment.course_id) else {
            continue;
        };

        let completed =
            repositories::module_progress::count_completed(state.db(), &user.id, &course.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to count completed modules"))?;
        let total = repositories::course_content::count_modules(state.db(), &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count modules"))?;

        items.push(MyCourseResponse {
            certificate_number: certificates.get(&course.id).cloned(),
            course: CourseResponse::from_db(course),
            enrolled_at: format_primitive(enrollment.enrolled_at),
            last_accessed: format_primitive(enrollment.last_accessed),
            overall_progress: Percent::from_ratio(completed, total).value(),
        });
    }

    Ok(Json(items))
}
