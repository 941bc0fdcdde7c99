use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::core::{metrics, time::primitive_now_utc};
use crate::db::models::{Certificate, Course, User};
use crate::repositories;
use crate::services::certificate_numbers::{
    generate_certificate_number, looks_like_certificate_number,
};
use crate::services::quiz_policy::Percent;
use crate::services::workflow::WorkflowError;

const MAX_NUMBER_ATTEMPTS: usize = 5;

/// What triggered an issuance; used as a metrics label.
#[derive(Debug, Clone, Copy)]
pub(crate) enum IssueTrigger {
    ModulesCompleted,
    QuizPassed,
    AssignmentGraded,
}

impl IssueTrigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::ModulesCompleted => "modules_completed",
            Self::QuizPassed => "quiz_passed",
            Self::AssignmentGraded => "assignment_graded",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Issued {
    pub(crate) certificate: Certificate,
    pub(crate) newly_issued: bool,
}

/// Issues the certificate once every requirement of the course is met, in whatever
/// order the learner meets them: all current modules complete, a passing quiz attempt
/// when the course has questions, and every required assignment graded.
///
/// Callers hold `enrollments::acquire_progress_lock` for (user, course) so that two
/// triggers finishing at the same time cannot both miss the other's write.
/// Returns `None` while a requirement is still open and no certificate exists.
pub(crate) async fn issue_if_eligible(
    conn: &mut PgConnection,
    user: &User,
    course: &Course,
    trigger: IssueTrigger,
) -> Result<Option<Issued>, WorkflowError> {
    if let Some(existing) =
        repositories::certificates::find_for(&mut *conn, &user.id, &course.id).await?
    {
        return Ok(Some(Issued { certificate: existing, newly_issued: false }));
    }

    let completed =
        repositories::module_progress::count_completed(&mut *conn, &user.id, &course.id).await?;
    let total = repositories::course_content::count_modules(&mut *conn, &course.id).await?;
    if completed < total {
        return Ok(None);
    }

    let quiz_score =
        if repositories::course_content::count_questions(&mut *conn, &course.id).await? > 0 {
            match repositories::quiz_attempts::best_passing_score(&mut *conn, &user.id, &course.id)
                .await?
            {
                Some(score) => Percent::from_value(score),
                None => return Ok(None),
            }
        } else {
            Percent::ZERO
        };

    if !repositories::assignments::required_work(&mut *conn, &user.id, &course.id)
        .await?
        .is_complete()
    {
        return Ok(None);
    }

    issue(conn, user, course, quiz_score, trigger).await.map(Some)
}

/// Issues the certificate for (user, course) at most once.
///
/// Must run inside the caller's transaction so the completion counter moves with the row.
/// Concurrent callers converge on the same stored certificate.
async fn issue(
    conn: &mut PgConnection,
    user: &User,
    course: &Course,
    quiz_score: Percent,
    trigger: IssueTrigger,
) -> Result<Issued, WorkflowError> {
    let user_name = user.full_name();

    for _ in 0..MAX_NUMBER_ATTEMPTS {
        let id = Uuid::new_v4().to_string();
        let number = generate_certificate_number();

        let inserted = repositories::certificates::insert_if_absent(
            &mut *conn,
            repositories::certificates::NewCertificate {
                id: &id,
                certificate_number: &number,
                user_id: &user.id,
                course_id: &course.id,
                user_name: &user_name,
                course_title: &course.title,
                quiz_score: quiz_score.value(),
                issued_at: primitive_now_utc(),
            },
        )
        .await?;

        if let Some(certificate) = inserted {
            repositories::courses::increment_completions(&mut *conn, &course.id).await?;
            metrics::record_certificate_issued(trigger.as_str());
            tracing::info!(
                user_id = %user.id,
                course_id = %course.id,
                certificate_number = %certificate.certificate_number,
                trigger = trigger.as_str(),
                "Certificate issued"
            );
            return Ok(Issued { certificate, newly_issued: true });
        }

        if let Some(existing) =
            repositories::certificates::find_for(&mut *conn, &user.id, &course.id).await?
        {
            return Ok(Issued { certificate: existing, newly_issued: false });
        }

        tracing::warn!(certificate_number = %number, "Certificate number collision, retrying");
    }

    Err(WorkflowError::CertificateNumberExhausted)
}

/// Public lookup. Unknown or malformed numbers are simply absent.
pub(crate) async fn verify(
    pool: &PgPool,
    certificate_number: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    let normalized = certificate_number.trim().to_ascii_uppercase();
    if !looks_like_certificate_number(&normalized) {
        return Ok(None);
    }
    repositories::certificates::find_by_number(pool, &normalized).await
}
