use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;

#[derive(Debug, Clone)]
pub(crate) struct PathRequest {
    pub(crate) skill_name: String,
    pub(crate) current_level: String,
    pub(crate) industry: String,
    pub(crate) goal: String,
}

#[derive(Debug, Clone)]
pub(crate) struct GeneratedPath {
    pub(crate) content: Value,
    pub(crate) generated_by: String,
}

/// Produces a week-by-week learning plan. Implementations never fail the request:
/// when the model is unreachable they fall back to a template.
#[async_trait]
pub(crate) trait LearningPathGenerator: Send + Sync {
    async fn generate(&self, request: &PathRequest) -> GeneratedPath;
}

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub(crate) struct ChatCompletionsGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    configured: bool,
}

impl ChatCompletionsGenerator {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let ai = settings.ai();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(ai.ai_request_timeout))
            .build()?;

        Ok(Self {
            client,
            api_key: ai.openai_api_key.clone(),
            base_url: ai.openai_base_url.trim_end_matches('/').to_string(),
            model: ai.ai_model.clone(),
            max_tokens: ai.ai_max_tokens,
            configured: ai.is_configured(),
        })
    }

    async fn request_path(&self, request: &PathRequest) -> anyhow::Result<Value> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(request)}
            ],
            "max_completion_tokens": self.max_tokens,
            "temperature": 0.7,
            "response_format": {"type": "json_object"}
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = None;
        let mut body = Value::Null;

        for attempt in 0..=2u32 {
            match self.client.post(&url).bearer_auth(&self.api_key).json(&payload).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    body = resp.json().await.unwrap_or(Value::Null);
                    if status.is_success() {
                        last_error = None;
                        break;
                    }
                    last_error = Some(anyhow::anyhow!("AI API error ({status}): {body}"));
                }
                Err(err) => {
                    last_error = Some(anyhow::Error::new(err).context("Failed to call AI API"));
                }
            }

            if attempt < 2 {
                tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt))).await;
            }
        }

        if let Some(err) = last_error {
            return Err(err);
        }

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("Missing AI response content"))?;

        let parsed: Value = serde_json::from_str(content)?;
        if !parsed.get("steps").is_some_and(Value::is_array) {
            anyhow::bail!("AI response has no steps");
        }
        Ok(parsed)
    }
}

#[async_trait]
impl LearningPathGenerator for ChatCompletionsGenerator {
    async fn generate(&self, request: &PathRequest) -> GeneratedPath {
        if !self.configured {
            tracing::debug!("AI generator not configured, using template path");
            return fallback_path(request);
        }

        match self.request_path(request).await {
            Ok(content) => {
                tracing::info!(skill = %request.skill_name, model = %self.model, "Learning path generated");
                GeneratedPath { content, generated_by: self.model.clone() }
            }
            Err(err) => {
                tracing::error!(error = %err, skill = %request.skill_name, "Learning path generation failed");
                fallback_path(request)
            }
        }
    }
}

const SYSTEM_PROMPT: &str = "You are an expert technical curriculum designer. \
You recommend curated, high-quality, free learning resources and answer with JSON only.";

fn user_prompt(request: &PathRequest) -> String {
    format!(
        "Create a detailed 4-week learning path to learn {skill} for the {industry} industry.\n\
         Current level: {level}\n\
         Goal: {goal}\n\n\
         Return a JSON object with keys skill_name, industry, description, difficulty, \
         estimated_weeks (4) and steps. Each step has week, title, description, \
         skills_covered (array of strings) and resources (2-4 items with title, url, type, \
         description). Use real, working URLs to free resources.",
        skill = request.skill_name,
        industry = request.industry,
        level = request.current_level,
        goal = request.goal,
    )
}

fn search_terms(skill_name: &str) -> String {
    skill_name.split_whitespace().collect::<Vec<_>>().join("+")
}

pub(crate) fn fallback_path(request: &PathRequest) -> GeneratedPath {
    let skill = &request.skill_name;
    let terms = search_terms(skill);

    let content = json!({
        "skill_name": skill,
        "industry": request.industry,
        "description": format!("Standard learning path for {skill}."),
        "difficulty": request.current_level,
        "estimated_weeks": 4,
        "steps": [
            {
                "week": 1,
                "title": format!("Introduction to {skill}"),
                "description": "Core concepts and fundamentals",
                "skills_covered": ["Basics", "Setup"],
                "resources": [{
                    "title": "Official Documentation",
                    "url": format!("https://google.com/search?q={terms}+documentation"),
                    "type": "article",
                    "description": "Official docs"
                }]
            },
            {
                "week": 2,
                "title": format!("Intermediate {skill}"),
                "description": "Building on the fundamentals",
                "skills_covered": ["Practice", "Projects"],
                "resources": [{
                    "title": "YouTube Tutorials",
                    "url": format!("https://youtube.com/results?search_query={terms}+tutorial"),
                    "type": "video",
                    "description": "Video tutorials"
                }]
            }
        ]
    });

    GeneratedPath { content, generated_by: "fallback".to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PathRequest {
        PathRequest {
            skill_name: "Machine Learning".into(),
            current_level: "beginner".into(),
            industry: "Healthcare".into(),
            goal: "Ship a model".into(),
        }
    }

    #[test]
    fn fallback_path_is_marked_and_shaped() {
        let path = fallback_path(&request());

        assert_eq!(path.generated_by, "fallback");
        assert_eq!(path.content["skill_name"], "Machine Learning");
        assert_eq!(path.content["steps"].as_array().map(Vec::len), Some(2));
        assert_eq!(
            path.content["steps"][0]["resources"][0]["url"],
            "https://google.com/search?q=Machine+Learning+documentation"
        );
    }

    #[test]
    fn prompt_mentions_inputs() {
        let prompt = user_prompt(&request());
        assert!(prompt.contains("Machine Learning"));
        assert!(prompt.contains("Healthcare"));
        assert!(prompt.contains("beginner"));
    }

    #[tokio::test]
    async fn unconfigured_generator_uses_template() {
        let generator = ChatCompletionsGenerator {
            client: Client::new(),
            api_key: String::new(),
            base_url: String::new(),
            model: "test-model".into(),
            max_tokens: 100,
            configured: false,
        };

        let path = generator.generate(&request()).await;
        assert_eq!(path.generated_by, "fallback");
    }
}
