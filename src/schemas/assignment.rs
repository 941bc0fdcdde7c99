use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::{Assignment, AssignmentSubmission};
use crate::repositories::assignments::SubmissionWithLearner;
use crate::schemas::certificate::CertificateResponse;
use crate::services::assignment_review::GradeOutcome;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
    #[serde(default, alias = "moduleId")]
    pub(crate) module_id: Option<String>,
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) instructions: String,
    #[serde(
        default,
        alias = "dueDate",
        deserialize_with = "crate::schemas::workshop::deserialize_optional_datetime"
    )]
    pub(crate) due_date: Option<OffsetDateTime>,
    #[serde(default = "default_max_score", alias = "maxScore")]
    #[validate(range(min = 1, max = 1000, message = "max_score must be between 1 and 1000"))]
    pub(crate) max_score: i32,
    #[serde(default = "default_required", alias = "isRequired")]
    pub(crate) is_required: bool,
}

/// Work is handed in as a link, as notes, or both.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitWorkRequest {
    #[serde(default, alias = "submissionUrl", alias = "file_url")]
    #[validate(url(message = "submission_url must be a valid URL"))]
    pub(crate) submission_url: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20000, message = "notes are too long"))]
    pub(crate) notes: String,
}

impl SubmitWorkRequest {
    pub(crate) fn is_empty(&self) -> bool {
        self.submission_url.as_deref().map_or(true, |url| url.trim().is_empty())
            && self.notes.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradeRequest {
    pub(crate) grade: f64,
    #[serde(default)]
    pub(crate) feedback: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) user_id: String,
    pub(crate) submission_url: Option<String>,
    pub(crate) notes: String,
    pub(crate) submitted_at: String,
    pub(crate) resubmitted: bool,
    pub(crate) grade: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) graded_at: Option<String>,
    pub(crate) graded_by: Option<String>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: AssignmentSubmission) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            user_id: submission.user_id,
            submission_url: submission.submission_url,
            notes: submission.notes,
            submitted_at: format_primitive(submission.submitted_at),
            resubmitted: submission.resubmitted,
            grade: submission.grade,
            feedback: submission.feedback,
            graded_at: format_optional(submission.graded_at),
            graded_by: submission.graded_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) module_id: Option<String>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) instructions: String,
    pub(crate) due_date: Option<String>,
    pub(crate) max_score: i32,
    pub(crate) is_required: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: String,
    /// The caller's own submission, when listing for a learner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) submission: Option<SubmissionResponse>,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: Assignment, submission: Option<AssignmentSubmission>) -> Self {
        Self {
            id: assignment.id,
            course_id: assignment.course_id,
            module_id: assignment.module_id,
            title: assignment.title,
            description: assignment.description,
            instructions: assignment.instructions,
            due_date: format_optional(assignment.due_date),
            max_score: assignment.max_score,
            is_required: assignment.is_required,
            created_by: assignment.created_by,
            created_at: format_primitive(assignment.created_at),
            submission: submission.map(SubmissionResponse::from_db),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LearnerSubmissionResponse {
    #[serde(flatten)]
    pub(crate) submission: SubmissionResponse,
    pub(crate) user_name: String,
    pub(crate) user_email: String,
}

impl LearnerSubmissionResponse {
    pub(crate) fn from_row(row: SubmissionWithLearner) -> Self {
        Self {
            user_name: format!("{} {}", row.first_name, row.last_name).trim().to_string(),
            user_email: row.email,
            submission: SubmissionResponse::from_db(row.submission),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse {
    #[serde(flatten)]
    pub(crate) submission: SubmissionResponse,
    pub(crate) certificate_issued: bool,
    pub(crate) certificate: Option<CertificateResponse>,
}

impl GradeResponse {
    pub(crate) fn from_outcome(outcome: GradeOutcome) -> Self {
        Self {
            submission: SubmissionResponse::from_db(outcome.submission),
            certificate_issued: outcome.certificate_issued,
            certificate: outcome.certificate.map(CertificateResponse::from_db),
        }
    }
}

fn default_max_score() -> i32 {
    100
}

fn default_required() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_applies_defaults() {
        let payload: AssignmentCreate = serde_json::from_value(serde_json::json!({
            "courseId": "c1",
            "title": "Capstone"
        }))
        .unwrap();
        assert_eq!(payload.max_score, 100);
        assert!(payload.is_required);
        assert!(payload.due_date.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn submission_needs_link_or_notes() {
        let empty: SubmitWorkRequest =
            serde_json::from_value(serde_json::json!({ "notes": "   " })).unwrap();
        assert!(empty.is_empty());

        let linked: SubmitWorkRequest = serde_json::from_value(serde_json::json!({
            "submission_url": "https://github.com/learner/capstone"
        }))
        .unwrap();
        assert!(!linked.is_empty());
        assert!(linked.validate().is_ok());

        let bad: SubmitWorkRequest =
            serde_json::from_value(serde_json::json!({ "submission_url": "not a url" })).unwrap();
        assert!(bad.validate().is_err());
    }
}
