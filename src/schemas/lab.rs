use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::{Lab, LabProgress, LabStep};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LabCreate {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "slug must not be empty"))]
    pub(crate) slug: Option<String>,
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) topic: String,
    #[serde(default = "default_difficulty")]
    pub(crate) difficulty: String,
    #[serde(default)]
    pub(crate) duration: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) steps: Vec<LabStep>,
    #[serde(default, alias = "videoUrl")]
    pub(crate) video_url: Option<String>,
    #[serde(default = "default_true", alias = "isPublished")]
    pub(crate) is_published: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LabUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "slug must not be empty"))]
    pub(crate) slug: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) difficulty: Option<String>,
    #[serde(default)]
    pub(crate) duration: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) steps: Option<Vec<LabStep>>,
    #[serde(default, alias = "videoUrl")]
    pub(crate) video_url: Option<String>,
    #[serde(default, alias = "isPublished")]
    pub(crate) is_published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabListQuery {
    pub(crate) search: Option<String>,
    pub(crate) difficulty: Option<String>,
    pub(crate) page: Option<i64>,
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LabResponse {
    pub(crate) id: String,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) topic: String,
    pub(crate) difficulty: String,
    pub(crate) duration: String,
    pub(crate) description: String,
    pub(crate) steps: Vec<LabStep>,
    pub(crate) video_url: Option<String>,
    pub(crate) is_published: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) completions_count: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl LabResponse {
    pub(crate) fn from_db(lab: Lab) -> Self {
        Self {
            id: lab.id,
            slug: lab.slug,
            title: lab.title,
            topic: lab.topic,
            difficulty: lab.difficulty,
            duration: lab.duration,
            description: lab.description,
            steps: lab.steps.0,
            video_url: lab.video_url,
            is_published: lab.is_published,
            created_by: lab.created_by,
            completions_count: lab.completions_count,
            created_at: format_primitive(lab.created_at),
            updated_at: format_primitive(lab.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExecuteRequest {
    #[serde(alias = "labId")]
    pub(crate) lab_id: String,
    #[serde(alias = "stepId")]
    pub(crate) step_id: String,
    #[validate(length(min = 1, max = 20000, message = "code must be between 1 and 20000 characters"))]
    pub(crate) code: String,
    #[serde(default = "default_execution_type", alias = "executionType", alias = "language")]
    pub(crate) execution_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveProgressQuery {
    pub(crate) step_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LabProgressResponse {
    pub(crate) lab_id: String,
    pub(crate) completed_steps: Vec<String>,
    pub(crate) is_completed: bool,
    pub(crate) started_at: Option<String>,
    pub(crate) updated_at: Option<String>,
    pub(crate) completed_at: Option<String>,
}

impl LabProgressResponse {
    pub(crate) fn from_db(lab_id: String, progress: Option<LabProgress>) -> Self {
        match progress {
            Some(progress) => Self {
                lab_id,
                completed_steps: progress.completed_steps.0,
                is_completed: progress.completed_at.is_some(),
                started_at: Some(format_primitive(progress.started_at)),
                updated_at: Some(format_primitive(progress.updated_at)),
                completed_at: format_optional(progress.completed_at),
            },
            None => Self {
                lab_id,
                completed_steps: Vec::new(),
                is_completed: false,
                started_at: None,
                updated_at: None,
                completed_at: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LabCompleteResponse {
    pub(crate) lab_id: String,
    pub(crate) completed: bool,
    pub(crate) newly_completed: bool,
}

fn default_difficulty() -> String {
    "beginner".to_string()
}

fn default_execution_type() -> String {
    "python".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_create_defaults_to_published_manual_steps() {
        let payload: LabCreate = serde_json::from_value(serde_json::json!({
            "title": "Docker 101",
            "steps": [{"title": "Pull", "instruction": "docker pull nginx"}]
        }))
        .unwrap();

        assert!(payload.is_published);
        assert_eq!(payload.steps[0].validation_type, "manual");
        assert!(payload.steps[0].id.is_empty());
    }

    #[test]
    fn progress_without_row_is_empty() {
        let response = LabProgressResponse::from_db("lab".into(), None);
        assert!(!response.is_completed);
        assert!(response.completed_steps.is_empty());
    }
}
