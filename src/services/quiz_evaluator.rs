use std::collections::BTreeMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::{metrics, time::primitive_now_utc};
use crate::db::models::{Certificate, User};
use crate::repositories;
use crate::services::certificate_issuer::{self, IssueTrigger};
use crate::services::enrollment_ledger;
use crate::services::quiz_policy::{self, Percent, QuizPolicy, SubmissionProblem};
use crate::services::workflow::WorkflowError;

#[derive(Debug, Clone)]
pub(crate) struct QuizOutcome {
    pub(crate) score: Percent,
    pub(crate) correct_answers: i64,
    pub(crate) total_questions: i64,
    pub(crate) passed: bool,
    pub(crate) attempt_number: i32,
    pub(crate) attempts_remaining: i64,
    pub(crate) certificate_issued: bool,
    pub(crate) certificate: Option<Certificate>,
}

/// Scores a full submission and records it as the next attempt.
///
/// The attempt count is checked and written under the per-(user, course) progress lock,
/// so concurrent submissions can never exceed the cap. A pass only yields the certificate
/// once the rest of the course is finished too.
pub(crate) async fn submit_quiz(
    pool: &PgPool,
    policy: &QuizPolicy,
    require_modules_complete: bool,
    user: &User,
    course_id: &str,
    answers: &BTreeMap<String, i32>,
) -> Result<QuizOutcome, WorkflowError> {
    let course = enrollment_ledger::require_enrollment(pool, &user.id, course_id).await?;

    let questions = repositories::course_content::list_questions(pool, &course.id).await?;
    if questions.is_empty() {
        return Err(WorkflowError::QuizNotAvailable);
    }

    if require_modules_complete {
        let completed =
            repositories::module_progress::count_completed(pool, &user.id, &course.id).await?;
        let total = repositories::course_content::count_modules(pool, &course.id).await?;
        if total > 0 && !Percent::from_ratio(completed, total).is_complete() {
            return Err(WorkflowError::ModulesIncomplete);
        }
    }

    // Spent attempts are reported before the answers are looked at.
    let used = repositories::quiz_attempts::count_for(pool, &user.id, &course.id).await?;
    if !policy.has_attempts_left(used) {
        return Err(WorkflowError::NoAttemptsRemaining { max_attempts: policy.max_attempts() });
    }

    let graded = quiz_policy::grade(&questions, answers).map_err(|problem| match problem {
        SubmissionProblem::Missing(missing_question_ids) => {
            WorkflowError::IncompleteSubmission { missing_question_ids }
        }
        SubmissionProblem::Unknown(question_ids) => WorkflowError::UnknownQuestion { question_ids },
    })?;
    let passed = policy.passes(graded.score);

    let mut tx = pool.begin().await?;
    repositories::enrollments::acquire_progress_lock(&mut *tx, &user.id, &course.id).await?;

    let used = repositories::quiz_attempts::count_for(&mut *tx, &user.id, &course.id).await?;
    if !policy.has_attempts_left(used) {
        return Err(WorkflowError::NoAttemptsRemaining { max_attempts: policy.max_attempts() });
    }

    let attempt_id = Uuid::new_v4().to_string();
    let attempt = repositories::quiz_attempts::create(
        &mut *tx,
        repositories::quiz_attempts::CreateAttempt {
            id: &attempt_id,
            user_id: &user.id,
            course_id: &course.id,
            attempt_number: (used + 1) as i32,
            answers: &graded.answers,
            correct_answers: graded.correct_answers as i32,
            total_questions: graded.total_questions as i32,
            score: graded.score.value(),
            passed,
            submitted_at: primitive_now_utc(),
        },
    )
    .await?;

    let issued = if passed {
        certificate_issuer::issue_if_eligible(&mut *tx, user, &course, IssueTrigger::QuizPassed)
            .await?
    } else {
        None
    };
    let (certificate, certificate_issued) = match issued {
        Some(issued) => (Some(issued.certificate), issued.newly_issued),
        None => (repositories::certificates::find_for(&mut *tx, &user.id, &course.id).await?, false),
    };

    tx.commit().await?;

    metrics::record_quiz_attempt(passed);
    tracing::info!(
        user_id = %user.id,
        course_id = %course.id,
        attempt_number = attempt.attempt_number,
        score = graded.score.value(),
        passed,
        "Quiz attempt recorded"
    );

    Ok(QuizOutcome {
        score: graded.score,
        correct_answers: graded.correct_answers,
        total_questions: graded.total_questions,
        passed,
        attempt_number: attempt.attempt_number,
        attempts_remaining: policy.attempts_remaining(used + 1),
        certificate_issued,
        certificate,
    })
}
