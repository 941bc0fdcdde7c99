use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::UserRole;

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) bio: Option<String>,
    pub(crate) skills: Json<Vec<String>>,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) level: String,
    pub(crate) category: String,
    pub(crate) duration_hours: i32,
    pub(crate) price: i32,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) enrolled_count: i32,
    pub(crate) completions_count: i32,
    pub(crate) published_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Course {
    pub(crate) fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CourseModule {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) video_url: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuizQuestion {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) question: String,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_answer: i32,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) enrolled_at: PrimitiveDateTime,
    pub(crate) last_accessed: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ModuleProgress {
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) module_id: String,
    pub(crate) time_spent_minutes: i32,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) answers: Json<Vec<QuizAnswer>>,
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) score: f64,
    pub(crate) passed: bool,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// One recorded answer; `selected` is the chosen option index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct QuizAnswer {
    pub(crate) question_id: String,
    pub(crate) selected: i32,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Certificate {
    pub(crate) id: String,
    pub(crate) certificate_number: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) user_name: String,
    pub(crate) course_title: String,
    pub(crate) quiz_score: f64,
    pub(crate) issued_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Assignment {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) module_id: Option<String>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) instructions: String,
    pub(crate) due_date: Option<PrimitiveDateTime>,
    pub(crate) max_score: i32,
    pub(crate) is_required: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// A learner's single submission for an assignment; resubmitting clears the grade.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AssignmentSubmission {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) user_id: String,
    pub(crate) submission_url: Option<String>,
    pub(crate) notes: String,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) resubmitted: bool,
    pub(crate) grade: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) graded_at: Option<PrimitiveDateTime>,
    pub(crate) graded_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LabStep {
    #[serde(default)]
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) instruction: String,
    #[serde(default)]
    pub(crate) code_snippet: Option<String>,
    #[serde(default)]
    pub(crate) hint: Option<String>,
    #[serde(default = "default_validation_type")]
    pub(crate) validation_type: String,
    #[serde(default)]
    pub(crate) validation_criteria: Option<String>,
}

fn default_validation_type() -> String {
    "manual".to_string()
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Lab {
    pub(crate) id: String,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) topic: String,
    pub(crate) difficulty: String,
    pub(crate) duration: String,
    pub(crate) description: String,
    pub(crate) steps: Json<Vec<LabStep>>,
    pub(crate) video_url: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) completions_count: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Lab {
    pub(crate) fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct LabProgress {
    pub(crate) user_id: String,
    pub(crate) lab_id: String,
    pub(crate) completed_steps: Json<Vec<String>>,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Workshop {
    pub(crate) id: String,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) starts_at: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) platform: String,
    pub(crate) image_url: Option<String>,
    pub(crate) tags: Json<Vec<String>>,
    pub(crate) max_participants: i32,
    pub(crate) registered_count: i32,
    pub(crate) is_active: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Workshop {
    pub(crate) fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct LearningPath {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) skill_name: String,
    pub(crate) industry: String,
    pub(crate) current_level: String,
    pub(crate) goal: String,
    pub(crate) content: Json<serde_json::Value>,
    pub(crate) generated_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}
