use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::helpers::{build_modules, build_questions, map_write_error, owner_scope, CatalogListQuery};
use crate::api::errors::ApiError;
use crate::api::guards::{ensure_can_manage, CurrentStaff};
use crate::api::pagination::{PageWindow, PaginatedResponse};
use crate::api::validation::{resolve_slug, validate_slug};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::Course;
use crate::repositories;
use crate::repositories::courses::CourseFilter;
use crate::schemas::course::{
    CourseCreate, CourseDetailResponse, CourseResponse, CourseUpdate, ModuleResponse,
    QuestionResponse,
};

pub(super) async fn list_courses(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Query(params): Query<CatalogListQuery>,
) -> Result<Json<PaginatedResponse<CourseResponse>>, ApiError> {
    let window = PageWindow::from_query(params.page, params.limit);
    let filter = CourseFilter {
        owner: owner_scope(&user),
        search: params.search.as_deref().filter(|value| !value.trim().is_empty()),
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

pub(super) async fn get_course(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let course = load_managed_course(&state, &course_id).await?;
    ensure_can_manage(&user, course.created_by.as_deref())?;

    Ok(Json(course_detail(&state, course).await?))
}

pub(super) async fn create_course(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseDetailResponse>), ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let slug = resolve_slug(payload.slug.as_deref(), &payload.title)?;
    let modules = build_modules(payload.modules)?;
    let questions = build_questions(payload.quiz_questions)?;

    let id = Uuid::new_v4().to_string();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let course = repositories::courses::create(
        &mut *tx,
        repositories::courses::CreateCourse {
            id: &id,
            slug: &slug,
            title: payload.title.trim(),
            description: &payload.description,
            level: &payload.level,
            category: &payload.category,
            duration_hours: payload.duration_hours,
            price: payload.price,
            thumbnail_url: payload.thumbnail_url.as_deref(),
            is_published: payload.is_published,
            created_by: Some(&user.id),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| map_write_error(e, "course", "Failed to create course"))?;

    repositories::course_content::replace_modules(&mut tx, &course.id, &modules)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store course modules"))?;
    repositories::course_content::replace_questions(&mut tx, &course.id, &questions)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store quiz questions"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit course"))?;

    tracing::info!(course_id = %course.id, user_id = %user.id, "Course created");
    Ok((StatusCode::CREATED, Json(course_detail(&state, course).await?)))
}

pub(super) async fn update_course(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(course_id): Path<String>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    payload.validate().map_err(ApiError::validation)?;

    let course = load_managed_course(&state, &course_id).await?;
    ensure_can_manage(&user, course.created_by.as_deref())?;

    let slug = match payload.slug.as_deref().map(str::trim) {
        Some(slug) if slug != course.slug => {
            if course.published_at.is_some() {
                return Err(ApiError::BadRequest(
                    "Slug cannot change once the course has been published".to_string(),
                ));
            }
            validate_slug(slug)?;
            Some(slug.to_string())
        }
        _ => None,
    };
    let modules = payload.modules.map(build_modules).transpose()?;
    let questions = payload.quiz_questions.map(build_questions).transpose()?;

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::courses::update(
        &mut *tx,
        &course.id,
        repositories::courses::UpdateCourse {
            slug,
            title: payload.title.map(|title| title.trim().to_string()),
            description: payload.description,
            level: payload.level,
            category: payload.category,
            duration_hours: payload.duration_hours,
            price: payload.price,
            thumbnail_url: payload.thumbnail_url,
            is_published: payload.is_published,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| map_write_error(e, "course", "Failed to update course"))?;

    if let Some(modules) = modules {
        repositories::course_content::replace_modules(&mut tx, &course.id, &modules)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store course modules"))?;
    }
    if let Some(questions) = questions {
        repositories::course_content::replace_questions(&mut tx, &course.id, &questions)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store quiz questions"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit course"))?;

    tracing::info!(course_id = %course.id, user_id = %user.id, "Course updated");
    Ok(Json(course_detail(&state, updated).await?))
}

/// Courses with learners keep their enrollment history; deleting them is refused.
pub(super) async fn delete_course(
    State(state): State<AppState>,
    CurrentStaff(user): CurrentStaff,
    Path(course_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let course = load_managed_course(&state, &course_id).await?;
    ensure_can_manage(&user, course.created_by.as_deref())?;

    let enrolled = repositories::enrollments::count_for_course(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;
    if enrolled > 0 {
        return Err(ApiError::Conflict("Course has enrolled learners and cannot be deleted".to_string()));
    }

    repositories::courses::delete_by_id(state.db(), &course.id).await.map_err(|e| {
        if db::is_foreign_key_violation(&e) {
            ApiError::Conflict("Course has enrolled learners and cannot be deleted".to_string())
        } else {
            ApiError::internal(e, "Failed to delete course")
        }
    })?;

    tracing::info!(course_id = %course.id, user_id = %user.id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_managed_course(state: &AppState, course_id: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

async fn course_detail(state: &AppState, course: Course) -> Result<CourseDetailResponse, ApiError> {
    let modules = repositories::course_content::list_modules(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course modules"))?;
    let questions = repositories::course_content::list_questions(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz questions"))?;

    Ok(CourseDetailResponse {
        course: CourseResponse::from_db(course),
        modules: modules.into_iter().map(ModuleResponse::from_db).collect(),
        quiz_questions: questions
            .into_iter()
            .map(|question| QuestionResponse::from_db(question, true))
            .collect(),
        is_enrolled: false,
    })
}
