use sqlx::PgPool;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Assignment, AssignmentSubmission, Certificate, User};
use crate::repositories;
use crate::services::certificate_issuer::{self, IssueTrigger};
use crate::services::workflow::WorkflowError;

#[derive(Debug, Clone)]
pub(crate) struct GradeOutcome {
    pub(crate) submission: AssignmentSubmission,
    pub(crate) certificate_issued: bool,
    pub(crate) certificate: Option<Certificate>,
}

pub(crate) fn check_grade(assignment: &Assignment, grade: f64) -> Result<(), WorkflowError> {
    if grade.is_finite() && (0.0..=f64::from(assignment.max_score)).contains(&grade) {
        Ok(())
    } else {
        Err(WorkflowError::GradeOutOfRange { max_score: assignment.max_score })
    }
}

/// Stores the learner's work for an assignment of a course they are enrolled in.
pub(crate) async fn submit_work(
    pool: &PgPool,
    user: &User,
    assignment: &Assignment,
    submission_url: Option<&str>,
    notes: &str,
) -> Result<AssignmentSubmission, WorkflowError> {
    if !repositories::enrollments::exists(pool, &user.id, &assignment.course_id).await? {
        return Err(WorkflowError::NotEnrolled);
    }

    let id = Uuid::new_v4().to_string();
    let submission = repositories::assignments::submit(
        pool,
        repositories::assignments::SubmitWork {
            id: &id,
            assignment_id: &assignment.id,
            user_id: &user.id,
            submission_url,
            notes,
            submitted_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(
        user_id = %user.id,
        assignment_id = %assignment.id,
        resubmitted = submission.resubmitted,
        "Assignment submitted"
    );
    Ok(submission)
}

/// Grades a submission and, when that was the learner's last open requirement,
/// issues their certificate in the same transaction.
pub(crate) async fn grade_submission(
    pool: &PgPool,
    grader: &User,
    assignment: &Assignment,
    submission: &AssignmentSubmission,
    grade: f64,
    feedback: &str,
) -> Result<GradeOutcome, WorkflowError> {
    check_grade(assignment, grade)?;

    let course = repositories::courses::find_by_id(pool, &assignment.course_id)
        .await?
        .ok_or(WorkflowError::CourseNotFound)?;
    let learner = repositories::users::find_by_id(pool, &submission.user_id)
        .await?
        .ok_or(WorkflowError::NotEnrolled)?;

    let mut tx = pool.begin().await?;
    repositories::enrollments::acquire_progress_lock(&mut *tx, &learner.id, &course.id).await?;

    let graded = repositories::assignments::grade(
        &mut *tx,
        &submission.id,
        repositories::assignments::GradeWork {
            grade,
            feedback,
            graded_by: &grader.id,
            graded_at: primitive_now_utc(),
        },
    )
    .await?;

    let issued = certificate_issuer::issue_if_eligible(
        &mut *tx,
        &learner,
        &course,
        IssueTrigger::AssignmentGraded,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        grader_id = %grader.id,
        user_id = %learner.id,
        assignment_id = %assignment.id,
        grade,
        "Assignment graded"
    );

    let (certificate, certificate_issued) = match issued {
        Some(issued) => (Some(issued.certificate), issued.newly_issued),
        None => (None, false),
    };
    Ok(GradeOutcome { submission: graded, certificate_issued, certificate })
}
