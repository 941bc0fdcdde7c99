use sqlx::PgPool;
use uuid::Uuid;

use crate::core::{metrics, time::primitive_now_utc};
use crate::db::models::{Course, Enrollment, User};
use crate::repositories;
use crate::services::workflow::WorkflowError;

#[derive(Debug, Clone)]
pub(crate) struct EnrollOutcome {
    pub(crate) enrollment: Enrollment,
    pub(crate) course: Course,
    pub(crate) newly_enrolled: bool,
}

/// Drafts stay hidden from everyone except their author and admins.
pub(crate) fn can_access_course(user: &User, course: &Course) -> bool {
    course.is_published || user.role.is_admin() || course.is_owned_by(&user.id)
}

/// Enrolls once; repeats return the stored enrollment unchanged.
pub(crate) async fn enroll(
    pool: &PgPool,
    user: &User,
    course_id: &str,
) -> Result<EnrollOutcome, WorkflowError> {
    let course = repositories::courses::find_by_id(pool, course_id)
        .await?
        .filter(|course| can_access_course(user, course))
        .ok_or(WorkflowError::CourseNotFound)?;

    let mut tx = pool.begin().await?;

    let enrollment_id = Uuid::new_v4().to_string();
    let newly_enrolled = repositories::enrollments::create_if_absent(
        &mut *tx,
        repositories::enrollments::CreateEnrollment {
            id: &enrollment_id,
            user_id: &user.id,
            course_id: &course.id,
            enrolled_at: primitive_now_utc(),
        },
    )
    .await?;

    if newly_enrolled {
        repositories::courses::increment_enrolled(&mut *tx, &course.id).await?;
    }

    let enrollment = repositories::enrollments::find(&mut *tx, &user.id, &course.id)
        .await?
        .ok_or(WorkflowError::Storage(sqlx::Error::RowNotFound))?;

    tx.commit().await?;

    if newly_enrolled {
        metrics::record_enrollment(&course.id);
        tracing::info!(user_id = %user.id, course_id = %course.id, "User enrolled");
    }

    Ok(EnrollOutcome { enrollment, course, newly_enrolled })
}

pub(crate) async fn is_enrolled(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    repositories::enrollments::exists(pool, user_id, course_id).await
}

/// Loads the course and checks the caller is enrolled, in the order the errors are reported.
pub(crate) async fn require_enrollment(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Course, WorkflowError> {
    let course = repositories::courses::find_by_id(pool, course_id)
        .await?
        .ok_or(WorkflowError::CourseNotFound)?;

    if !is_enrolled(pool, user_id, course_id).await? {
        return Err(WorkflowError::NotEnrolled);
    }

    Ok(course)
}
