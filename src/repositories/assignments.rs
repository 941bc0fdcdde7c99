use sqlx::{FromRow, PgPool};

use crate::db::models::{Assignment, AssignmentSubmission};

const COLUMNS: &str = "\
    id, course_id, module_id, title, description, instructions, due_date, max_score, \
    is_required, created_by, created_at";

const SUBMISSION_COLUMNS: &str = "\
    id, assignment_id, user_id, submission_url, notes, submitted_at, resubmitted, grade, \
    feedback, graded_at, graded_by";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) module_id: Option<&'a str>,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) instructions: &'a str,
    pub(crate) due_date: Option<time::PrimitiveDateTime>,
    pub(crate) max_score: i32,
    pub(crate) is_required: bool,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct SubmitWork<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) submission_url: Option<&'a str>,
    pub(crate) notes: &'a str,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

pub(crate) struct GradeWork<'a> {
    pub(crate) grade: f64,
    pub(crate) feedback: &'a str,
    pub(crate) graded_by: &'a str,
    pub(crate) graded_at: time::PrimitiveDateTime,
}

#[derive(Debug, FromRow)]
pub(crate) struct SubmissionWithLearner {
    #[sqlx(flatten)]
    pub(crate) submission: AssignmentSubmission,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
}

/// Required assignments of a course and how many of them the learner has had graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub(crate) struct RequiredWork {
    pub(crate) required: i64,
    pub(crate) graded: i64,
}

impl RequiredWork {
    pub(crate) fn is_complete(&self) -> bool {
        self.graded >= self.required
    }
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, course_id, module_id, title, description, instructions, due_date, max_score,
            is_required, created_by, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.module_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.instructions)
    .bind(params.due_date)
    .bind(params.max_score)
    .bind(params.is_required)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(assignment_id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_for_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE course_id = $1 ORDER BY created_at, id"
    ))
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, assignment_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
        .bind(assignment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// One submission per learner and assignment. Resubmitting replaces the work and clears the grade.
pub(crate) async fn submit(
    executor: impl sqlx::PgExecutor<'_>,
    params: SubmitWork<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "INSERT INTO assignment_submissions (
            id, assignment_id, user_id, submission_url, notes, submitted_at
         ) VALUES ($1,$2,$3,$4,$5,$6)
         ON CONFLICT (assignment_id, user_id) DO UPDATE SET
            submission_url = EXCLUDED.submission_url,
            notes = EXCLUDED.notes,
            submitted_at = EXCLUDED.submitted_at,
            resubmitted = TRUE,
            grade = NULL,
            feedback = NULL,
            graded_at = NULL,
            graded_by = NULL
         RETURNING {SUBMISSION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.assignment_id)
    .bind(params.user_id)
    .bind(params.submission_url)
    .bind(params.notes)
    .bind(params.submitted_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_submission(
    executor: impl sqlx::PgExecutor<'_>,
    submission_id: &str,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM assignment_submissions WHERE id = $1"
    ))
    .bind(submission_id)
    .fetch_optional(executor)
    .await
}

/// The learner's submissions for every assignment of a course.
pub(crate) async fn list_submissions_for_learner(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<Vec<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(
        "SELECT s.id, s.assignment_id, s.user_id, s.submission_url, s.notes, s.submitted_at,
                s.resubmitted, s.grade, s.feedback, s.graded_at, s.graded_by
         FROM assignment_submissions s
         JOIN assignments a ON a.id = s.assignment_id
         WHERE s.user_id = $1 AND a.course_id = $2",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_submissions(
    executor: impl sqlx::PgExecutor<'_>,
    assignment_id: &str,
) -> Result<Vec<SubmissionWithLearner>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionWithLearner>(
        "SELECT s.id, s.assignment_id, s.user_id, s.submission_url, s.notes, s.submitted_at,
                s.resubmitted, s.grade, s.feedback, s.graded_at, s.graded_by,
                u.first_name, u.last_name, u.email
         FROM assignment_submissions s
         JOIN users u ON u.id = s.user_id
         WHERE s.assignment_id = $1
         ORDER BY s.submitted_at, s.id",
    )
    .bind(assignment_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn grade(
    executor: impl sqlx::PgExecutor<'_>,
    submission_id: &str,
    params: GradeWork<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "UPDATE assignment_submissions SET
            grade = $1, feedback = $2, graded_by = $3, graded_at = $4
         WHERE id = $5
         RETURNING {SUBMISSION_COLUMNS}",
    ))
    .bind(params.grade)
    .bind(params.feedback)
    .bind(params.graded_by)
    .bind(params.graded_at)
    .bind(submission_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn required_work(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<RequiredWork, sqlx::Error> {
    sqlx::query_as::<_, RequiredWork>(
        "SELECT COUNT(*) AS required, COUNT(s.id) AS graded
         FROM assignments a
         LEFT JOIN assignment_submissions s
            ON s.assignment_id = a.id AND s.user_id = $1 AND s.grade IS NOT NULL
         WHERE a.course_id = $2 AND a.is_required",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_work_completion() {
        assert!(RequiredWork { required: 0, graded: 0 }.is_complete());
        assert!(RequiredWork { required: 2, graded: 2 }.is_complete());
        assert!(!RequiredWork { required: 2, graded: 1 }.is_complete());
    }
}
