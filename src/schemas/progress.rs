use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::QuizAttempt;
use crate::schemas::certificate::CertificateResponse;
use crate::services::progress_tracker::{CompletionOutcome, CourseProgress, ModuleState, QuizState};
use crate::services::quiz_evaluator::QuizOutcome;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCompleteRequest {
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
    #[serde(alias = "moduleId")]
    pub(crate) module_id: String,
    #[serde(default, alias = "timeSpentMinutes", alias = "time_spent")]
    #[validate(range(min = 0, max = 10080, message = "time_spent_minutes is out of range"))]
    pub(crate) time_spent_minutes: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleCompleteResponse {
    pub(crate) overall_progress: f64,
    pub(crate) newly_completed: bool,
    pub(crate) certificate_issued: bool,
    pub(crate) certificate: Option<CertificateResponse>,
}

impl ModuleCompleteResponse {
    pub(crate) fn from_outcome(outcome: CompletionOutcome) -> Self {
        Self {
            overall_progress: outcome.overall_progress.value(),
            newly_completed: outcome.newly_completed,
            certificate_issued: outcome.certificate_issued,
            certificate: outcome.certificate.map(CertificateResponse::from_db),
        }
    }
}

/// Answers keyed by question id; values are option indexes.
#[derive(Debug, Deserialize)]
pub(crate) struct QuizSubmitRequest {
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
    pub(crate) answers: BTreeMap<String, i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizSubmitResponse {
    pub(crate) score: f64,
    pub(crate) correct_answers: i64,
    pub(crate) total_questions: i64,
    pub(crate) passed: bool,
    pub(crate) attempt_number: i32,
    pub(crate) attempts_remaining: i64,
    pub(crate) certificate_issued: bool,
    pub(crate) certificate: Option<CertificateResponse>,
}

impl QuizSubmitResponse {
    pub(crate) fn from_outcome(outcome: QuizOutcome) -> Self {
        Self {
            score: outcome.score.value(),
            correct_answers: outcome.correct_answers,
            total_questions: outcome.total_questions,
            passed: outcome.passed,
            attempt_number: outcome.attempt_number,
            attempts_remaining: outcome.attempts_remaining,
            certificate_issued: outcome.certificate_issued,
            certificate: outcome.certificate.map(CertificateResponse::from_db),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleProgressResponse {
    pub(crate) module_id: String,
    pub(crate) title: String,
    pub(crate) completed: bool,
    pub(crate) time_spent_minutes: i32,
    pub(crate) completed_at: Option<String>,
}

impl ModuleProgressResponse {
    fn from_state(state: ModuleState) -> Self {
        let (completed, time_spent_minutes, completed_at) = match state.progress {
            Some(progress) => (true, progress.time_spent_minutes, Some(progress.completed_at)),
            None => (false, 0, None),
        };
        Self {
            module_id: state.module.id,
            title: state.module.title,
            completed,
            time_spent_minutes,
            completed_at: format_optional(completed_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) attempt_number: i32,
    pub(crate) score: f64,
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) passed: bool,
    pub(crate) submitted_at: String,
}

impl AttemptResponse {
    fn from_db(attempt: QuizAttempt) -> Self {
        Self {
            attempt_number: attempt.attempt_number,
            score: attempt.score,
            correct_answers: attempt.correct_answers,
            total_questions: attempt.total_questions,
            passed: attempt.passed,
            submitted_at: format_primitive(attempt.submitted_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizProgressResponse {
    pub(crate) passed: bool,
    pub(crate) best_score: f64,
    pub(crate) attempts_remaining: i64,
    pub(crate) max_attempts: i64,
    pub(crate) attempts: Vec<AttemptResponse>,
}

impl QuizProgressResponse {
    fn from_state(state: QuizState) -> Self {
        Self {
            passed: state.passed,
            best_score: state.best_score.value(),
            attempts_remaining: state.attempts_remaining,
            max_attempts: state.max_attempts,
            attempts: state.attempts.into_iter().map(AttemptResponse::from_db).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentProgressResponse {
    pub(crate) required: i64,
    pub(crate) graded: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressResponse {
    pub(crate) course_id: String,
    pub(crate) overall_progress: f64,
    pub(crate) modules_progress: Vec<ModuleProgressResponse>,
    pub(crate) quiz_progress: Option<QuizProgressResponse>,
    pub(crate) assignment_progress: AssignmentProgressResponse,
    pub(crate) certificate: Option<CertificateResponse>,
}

impl ProgressResponse {
    pub(crate) fn from_progress(course_id: String, progress: CourseProgress) -> Self {
        Self {
            course_id,
            overall_progress: progress.overall_progress.value(),
            modules_progress: progress
                .modules
                .into_iter()
                .map(ModuleProgressResponse::from_state)
                .collect(),
            quiz_progress: progress.quiz.map(QuizProgressResponse::from_state),
            assignment_progress: AssignmentProgressResponse {
                required: progress.assignments.required,
                graded: progress.assignments.graded,
            },
            certificate: progress.certificate.map(CertificateResponse::from_db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_reads_answer_map() {
        let request: QuizSubmitRequest = serde_json::from_value(serde_json::json!({
            "courseId": "c1",
            "answers": {"q2": 1, "q1": 0}
        }))
        .unwrap();

        assert_eq!(request.course_id, "c1");
        assert_eq!(request.answers.keys().collect::<Vec<_>>(), vec!["q1", "q2"]);
    }

    #[test]
    fn negative_time_is_rejected() {
        let request = ModuleCompleteRequest {
            course_id: "c1".into(),
            module_id: "m1".into(),
            time_spent_minutes: -5,
        };
        assert!(request.validate().is_err());
    }
}
