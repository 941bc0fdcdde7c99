use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::LearningPath;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GeneratePathRequest {
    #[serde(alias = "skillName")]
    #[validate(length(min = 1, max = 200, message = "skill_name must not be empty"))]
    pub(crate) skill_name: String,
    #[serde(default = "default_level", alias = "currentLevel")]
    #[validate(length(min = 1, max = 50, message = "current_level must not be empty"))]
    pub(crate) current_level: String,
    #[serde(default = "default_industry")]
    #[validate(length(min = 1, max = 200, message = "industry must not be empty"))]
    pub(crate) industry: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "goal is too long"))]
    pub(crate) goal: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LearningPathResponse {
    pub(crate) id: String,
    pub(crate) skill_name: String,
    pub(crate) industry: String,
    pub(crate) current_level: String,
    pub(crate) goal: String,
    pub(crate) content: serde_json::Value,
    pub(crate) generated_by: String,
    pub(crate) created_at: String,
}

impl LearningPathResponse {
    pub(crate) fn from_db(path: LearningPath) -> Self {
        Self {
            id: path.id,
            skill_name: path.skill_name,
            industry: path.industry,
            current_level: path.current_level,
            goal: path.goal,
            content: path.content.0,
            generated_by: path.generated_by,
            created_at: format_primitive(path.created_at),
        }
    }
}

fn default_level() -> String {
    "beginner".to_string()
}

fn default_industry() -> String {
    "general".to_string()
}
