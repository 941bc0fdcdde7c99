use std::collections::HashMap;

use sqlx::PgPool;

use crate::core::{metrics, time::primitive_now_utc};
use crate::db::models::{Certificate, CourseModule, ModuleProgress, QuizAttempt, User};
use crate::repositories;
use crate::repositories::assignments::RequiredWork;
use crate::services::certificate_issuer::{self, IssueTrigger};
use crate::services::enrollment_ledger;
use crate::services::quiz_policy::{Percent, QuizPolicy};
use crate::services::workflow::WorkflowError;

#[derive(Debug, Clone)]
pub(crate) struct CompletionOutcome {
    pub(crate) overall_progress: Percent,
    pub(crate) newly_completed: bool,
    pub(crate) certificate_issued: bool,
    pub(crate) certificate: Option<Certificate>,
}

#[derive(Debug, Clone)]
pub(crate) struct ModuleState {
    pub(crate) module: CourseModule,
    pub(crate) progress: Option<ModuleProgress>,
}

#[derive(Debug, Clone)]
pub(crate) struct QuizState {
    pub(crate) attempts: Vec<QuizAttempt>,
    pub(crate) passed: bool,
    pub(crate) best_score: Percent,
    pub(crate) attempts_remaining: i64,
    pub(crate) max_attempts: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct CourseProgress {
    pub(crate) overall_progress: Percent,
    pub(crate) modules: Vec<ModuleState>,
    pub(crate) quiz: Option<QuizState>,
    pub(crate) assignments: RequiredWork,
    pub(crate) certificate: Option<Certificate>,
}

/// Records a module as completed for an enrolled learner.
///
/// Repeats are no-ops that report the current state. Finishing the last module issues
/// the certificate when nothing else is outstanding: no quiz, or a quiz already passed,
/// and no ungraded required assignment.
pub(crate) async fn mark_module_complete(
    pool: &PgPool,
    user: &User,
    course_id: &str,
    module_id: &str,
    time_spent_minutes: i32,
) -> Result<CompletionOutcome, WorkflowError> {
    let course = enrollment_ledger::require_enrollment(pool, &user.id, course_id).await?;

    if !repositories::course_content::module_exists(pool, &course.id, module_id).await? {
        return Err(WorkflowError::ModuleNotFound);
    }

    let now = primitive_now_utc();
    let mut tx = pool.begin().await?;
    repositories::enrollments::acquire_progress_lock(&mut *tx, &user.id, &course.id).await?;

    let newly_completed = repositories::module_progress::complete_if_absent(
        &mut *tx,
        repositories::module_progress::CompleteModule {
            user_id: &user.id,
            course_id: &course.id,
            module_id,
            time_spent_minutes: time_spent_minutes.max(0),
            completed_at: now,
        },
    )
    .await?;

    let completed =
        repositories::module_progress::count_completed(&mut *tx, &user.id, &course.id).await?;
    let total = repositories::course_content::count_modules(&mut *tx, &course.id).await?;
    let overall_progress = Percent::from_ratio(completed, total);

    let issued = if overall_progress.is_complete() {
        certificate_issuer::issue_if_eligible(
            &mut *tx,
            user,
            &course,
            IssueTrigger::ModulesCompleted,
        )
        .await?
    } else {
        None
    };
    let (certificate, certificate_issued) = match issued {
        Some(issued) => (Some(issued.certificate), issued.newly_issued),
        None => (repositories::certificates::find_for(&mut *tx, &user.id, &course.id).await?, false),
    };

    repositories::enrollments::touch(&mut *tx, &user.id, &course.id, now).await?;
    tx.commit().await?;

    if newly_completed {
        metrics::record_module_completion();
        tracing::info!(
            user_id = %user.id,
            course_id = %course.id,
            module_id,
            overall_progress = overall_progress.value(),
            "Module completed"
        );
    }

    Ok(CompletionOutcome { overall_progress, newly_completed, certificate_issued, certificate })
}

pub(crate) async fn get_progress(
    pool: &PgPool,
    policy: &QuizPolicy,
    user_id: &str,
    course_id: &str,
) -> Result<CourseProgress, WorkflowError> {
    let course = enrollment_ledger::require_enrollment(pool, user_id, course_id).await?;

    let modules = repositories::course_content::list_modules(pool, &course.id).await?;
    let mut progress_by_module: HashMap<String, ModuleProgress> =
        repositories::module_progress::list_for_enrollment(pool, user_id, &course.id)
            .await?
            .into_iter()
            .map(|row| (row.module_id.clone(), row))
            .collect();

    let modules: Vec<ModuleState> = modules
        .into_iter()
        .map(|module| {
            let progress = progress_by_module.remove(&module.id);
            ModuleState { module, progress }
        })
        .collect();

    let completed = modules.iter().filter(|state| state.progress.is_some()).count() as i64;
    let overall_progress = Percent::from_ratio(completed, modules.len() as i64);

    let quiz = if repositories::course_content::count_questions(pool, &course.id).await? > 0 {
        let attempts = repositories::quiz_attempts::list_for(pool, user_id, &course.id).await?;
        Some(summarize_attempts(policy, attempts))
    } else {
        None
    };

    let assignments = repositories::assignments::required_work(pool, user_id, &course.id).await?;
    let certificate = repositories::certificates::find_for(pool, user_id, &course.id).await?;

    Ok(CourseProgress { overall_progress, modules, quiz, assignments, certificate })
}

fn summarize_attempts(policy: &QuizPolicy, attempts: Vec<QuizAttempt>) -> QuizState {
    let best_score = attempts
        .iter()
        .map(|attempt| Percent::from_value(attempt.score))
        .max()
        .unwrap_or(Percent::ZERO);
    let passed = attempts.iter().any(|attempt| attempt.passed);
    let used = attempts.len() as i64;

    QuizState {
        passed,
        best_score,
        attempts_remaining: policy.attempts_remaining(used),
        max_attempts: policy.max_attempts(),
        attempts,
    }
}
