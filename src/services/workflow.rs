use thiserror::Error;

/// Failures of the enrollment → progress → quiz/assignments → certificate workflow.
#[derive(Debug, Error)]
pub(crate) enum WorkflowError {
    #[error("Course not found")]
    CourseNotFound,
    #[error("Module not found in this course")]
    ModuleNotFound,
    #[error("You are not enrolled in this course")]
    NotEnrolled,
    #[error("This course has no quiz")]
    QuizNotAvailable,
    #[error("Complete all modules before taking the quiz")]
    ModulesIncomplete,
    #[error("All questions must be answered")]
    IncompleteSubmission { missing_question_ids: Vec<String> },
    #[error("Submission references questions that are not part of this course")]
    UnknownQuestion { question_ids: Vec<String> },
    #[error("Grade must be between 0 and {max_score}")]
    GradeOutOfRange { max_score: i32 },
    #[error("Maximum attempts reached ({max_attempts})")]
    NoAttemptsRemaining { max_attempts: i64 },
    #[error("could not allocate a unique certificate number")]
    CertificateNumberExhausted,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl WorkflowError {
    /// Stable machine-readable tag rendered next to the human message.
    pub(crate) fn kind(&self) -> Option<&'static str> {
        match self {
            Self::CourseNotFound => Some("course_not_found"),
            Self::ModuleNotFound => Some("module_not_found"),
            Self::NotEnrolled => Some("not_enrolled"),
            Self::QuizNotAvailable => Some("quiz_not_available"),
            Self::ModulesIncomplete => Some("modules_incomplete"),
            Self::IncompleteSubmission { .. } => Some("incomplete_submission"),
            Self::UnknownQuestion { .. } => Some("unknown_question"),
            Self::NoAttemptsRemaining { .. } => Some("no_attempts_remaining"),
            Self::GradeOutOfRange { .. } => Some("grade_out_of_range"),
            Self::CertificateNumberExhausted | Self::Storage(_) => None,
        }
    }
}
