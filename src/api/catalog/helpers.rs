use std::collections::HashSet;

use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::validation::validate_question_options;
use crate::db;
use crate::db::models::{LabStep, User};
use crate::repositories::course_content::{NewModule, NewQuestion};
use crate::schemas::course::{ModuleInput, QuestionInput};

#[derive(Debug, Deserialize)]
pub(super) struct CatalogListQuery {
    pub(super) search: Option<String>,
    pub(super) page: Option<i64>,
    pub(super) limit: Option<i64>,
}

/// `None` lets admins see everything; trainers are scoped to their own rows.
pub(super) fn owner_scope(user: &User) -> Option<&str> {
    if user.role.is_admin() {
        None
    } else {
        Some(user.id.as_str())
    }
}

fn ensure_unique_ids<'a>(ids: impl Iterator<Item = &'a str>, what: &str) -> Result<(), ApiError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ApiError::BadRequest(format!("Duplicate {what} id '{id}'")));
        }
    }
    Ok(())
}

fn given_or_new(id: Option<String>) -> String {
    id.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub(super) fn build_modules(inputs: Vec<ModuleInput>) -> Result<Vec<NewModule>, ApiError> {
    let modules: Vec<NewModule> = inputs
        .into_iter()
        .map(|input| NewModule {
            id: given_or_new(input.id),
            title: input.title.trim().to_string(),
            content: input.content,
            video_url: input.video_url,
            duration_minutes: input.duration_minutes,
        })
        .collect();

    ensure_unique_ids(modules.iter().map(|module| module.id.as_str()), "module")?;
    Ok(modules)
}

pub(super) fn build_questions(inputs: Vec<QuestionInput>) -> Result<Vec<NewQuestion>, ApiError> {
    let mut questions = Vec::with_capacity(inputs.len());
    for input in inputs {
        validate_question_options(&input.options, input.correct_answer)?;
        questions.push(NewQuestion {
            id: given_or_new(input.id),
            question: input.question.trim().to_string(),
            options: input.options,
            correct_answer: input.correct_answer,
        });
    }

    ensure_unique_ids(questions.iter().map(|question| question.id.as_str()), "question")?;
    Ok(questions)
}

/// Steps without an id get a positional one so progress can refer to them.
pub(super) fn normalize_steps(steps: Vec<LabStep>) -> Result<Vec<LabStep>, ApiError> {
    let steps: Vec<LabStep> = steps
        .into_iter()
        .enumerate()
        .map(|(index, mut step)| {
            step.id = step.id.trim().to_string();
            if step.id.is_empty() {
                step.id = format!("step-{}", index + 1);
            }
            step
        })
        .collect();

    ensure_unique_ids(steps.iter().map(|step| step.id.as_str()), "step")?;
    Ok(steps)
}

pub(super) fn map_write_error(err: sqlx::Error, what: &str, context: &str) -> ApiError {
    if db::is_unique_violation(&err) {
        ApiError::Conflict(format!("A {what} with this slug already exists"))
    } else {
        ApiError::internal(err, context)
    }
}
