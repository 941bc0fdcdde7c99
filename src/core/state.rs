use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::lab_sandbox::CodeSandbox;
use crate::services::learning_paths::LearningPathGenerator;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    sandbox: Arc<dyn CodeSandbox>,
    path_generator: Arc<dyn LearningPathGenerator>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        sandbox: Arc<dyn CodeSandbox>,
        path_generator: Arc<dyn LearningPathGenerator>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, sandbox, path_generator }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn sandbox(&self) -> &dyn CodeSandbox {
        self.inner.sandbox.as_ref()
    }

    pub(crate) fn path_generator(&self) -> &dyn LearningPathGenerator {
        self.inner.path_generator.as_ref()
    }
}
