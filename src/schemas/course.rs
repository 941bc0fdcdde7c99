use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::{Course, CourseModule, Enrollment, QuizQuestion};

#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct ModuleInput {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[validate(length(min = 1, max = 300, message = "module title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default, alias = "videoUrl")]
    pub(crate) video_url: Option<String>,
    #[serde(default, alias = "durationMinutes", alias = "duration")]
    #[validate(range(min = 0, message = "duration_minutes must be non-negative"))]
    pub(crate) duration_minutes: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct QuestionInput {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub(crate) question: String,
    #[validate(length(min = 2, message = "a question needs at least two options"))]
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    #[validate(range(min = 0, message = "correct_answer must be non-negative"))]
    pub(crate) correct_answer: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "slug must not be empty"))]
    pub(crate) slug: Option<String>,
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default = "default_level")]
    pub(crate) level: String,
    #[serde(default = "default_category")]
    pub(crate) category: String,
    #[serde(default, alias = "durationHours")]
    #[validate(range(min = 0, message = "duration_hours must be non-negative"))]
    pub(crate) duration_hours: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "price must be non-negative"))]
    pub(crate) price: i32,
    #[serde(default, alias = "thumbnailUrl")]
    pub(crate) thumbnail_url: Option<String>,
    #[serde(default, alias = "isPublished")]
    pub(crate) is_published: bool,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) modules: Vec<ModuleInput>,
    #[serde(default, alias = "quizQuestions", alias = "quiz")]
    #[validate(nested)]
    pub(crate) quiz_questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "slug must not be empty"))]
    pub(crate) slug: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) level: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default, alias = "durationHours")]
    #[validate(range(min = 0, message = "duration_hours must be non-negative"))]
    pub(crate) duration_hours: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0, message = "price must be non-negative"))]
    pub(crate) price: Option<i32>,
    #[serde(default, alias = "thumbnailUrl")]
    pub(crate) thumbnail_url: Option<String>,
    #[serde(default, alias = "isPublished")]
    pub(crate) is_published: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) modules: Option<Vec<ModuleInput>>,
    #[serde(default, alias = "quizQuestions", alias = "quiz")]
    #[validate(nested)]
    pub(crate) quiz_questions: Option<Vec<QuestionInput>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseListQuery {
    pub(crate) search: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) level: Option<String>,
    pub(crate) page: Option<i64>,
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
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
    pub(crate) published_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            slug: course.slug,
            title: course.title,
            description: course.description,
            level: course.level,
            category: course.category,
            duration_hours: course.duration_hours,
            price: course.price,
            thumbnail_url: course.thumbnail_url,
            is_published: course.is_published,
            created_by: course.created_by,
            enrolled_count: course.enrolled_count,
            completions_count: course.completions_count,
            published_at: format_optional(course.published_at),
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) video_url: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) order_index: i32,
}

impl ModuleResponse {
    pub(crate) fn from_db(module: CourseModule) -> Self {
        Self {
            id: module.id,
            title: module.title,
            content: module.content,
            video_url: module.video_url,
            duration_minutes: module.duration_minutes,
            order_index: module.order_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question: String,
    pub(crate) options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) correct_answer: Option<i32>,
}

impl QuestionResponse {
    /// Learners never see the answer key.
    pub(crate) fn from_db(question: QuizQuestion, reveal_answer: bool) -> Self {
        Self {
            id: question.id,
            question: question.question,
            options: question.options.0,
            correct_answer: reveal_answer.then_some(question.correct_answer),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseDetailResponse {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    pub(crate) modules: Vec<ModuleResponse>,
    pub(crate) quiz_questions: Vec<QuestionResponse>,
    pub(crate) is_enrolled: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollRequest {
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) enrolled_at: String,
    pub(crate) last_accessed: String,
    pub(crate) newly_enrolled: bool,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment, newly_enrolled: bool) -> Self {
        Self {
            id: enrollment.id,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            enrolled_at: format_primitive(enrollment.enrolled_at),
            last_accessed: format_primitive(enrollment.last_accessed),
            newly_enrolled,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MyCourseResponse {
    pub(crate) course: CourseResponse,
    pub(crate) enrolled_at: String,
    pub(crate) last_accessed: String,
    pub(crate) overall_progress: f64,
    pub(crate) certificate_number: Option<String>,
}

fn default_level() -> String {
    "beginner".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    #[test]
    fn create_validates_nested_questions() {
        let payload: CourseCreate = serde_json::from_value(serde_json::json!({
            "title": "Rust Basics",
            "quiz_questions": [{"question": "Pick one", "options": ["only"], "correct_answer": 0}]
        }))
        .unwrap();

        assert!(payload.validate().is_err());
        assert_eq!(payload.level, "beginner");
        assert!(!payload.is_published);
    }

    #[test]
    fn question_hides_answer_unless_revealed() {
        let question = QuizQuestion {
            id: "q1".into(),
            course_id: "c1".into(),
            question: "2 + 2?".into(),
            options: Json(vec!["3".into(), "4".into()]),
            correct_answer: 1,
            order_index: 0,
        };

        let hidden = serde_json::to_value(QuestionResponse::from_db(question.clone(), false)).unwrap();
        assert!(hidden.get("correct_answer").is_none());

        let shown = serde_json::to_value(QuestionResponse::from_db(question, true)).unwrap();
        assert_eq!(shown["correct_answer"], 1);
    }
}
