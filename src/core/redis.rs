use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError, Script};
use tokio::sync::RwLock;

const RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

const FIXED_WINDOW_SCRIPT: &str = r#"
    local current = redis.call("INCR", KEYS[1])
    if current == 1 then
        redis.call("EXPIRE", KEYS[1], ARGV[1])
    end
    return current
"#;

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        *self.manager.write().await = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        *self.manager.write().await = None;
    }

    async fn manager(&self) -> Option<ConnectionManager> {
        self.manager.read().await.clone()
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let Some(mut manager) = self.manager().await else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Fixed one-minute window per `scope:subject`. Without a connection every call is allowed.
    pub(crate) async fn allow(
        &self,
        scope: &str,
        subject: &str,
        per_minute: u64,
    ) -> Result<bool, RedisError> {
        let Some(mut manager) = self.manager().await else {
            return Ok(true);
        };

        let key = format!("ratelimit:{scope}:{subject}");
        let current: i64 = Script::new(FIXED_WINDOW_SCRIPT)
            .key(key)
            .arg(RATE_LIMIT_WINDOW_SECONDS as i64)
            .invoke_async(&mut manager)
            .await?;

        Ok(current <= per_minute as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use crate::test_support;
    use uuid::Uuid;

    #[tokio::test]
    async fn disconnected_handle_allows_everything() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());
        assert!(redis.allow("login", "anyone", 0).await.expect("allow"));
        assert!(matches!(redis.health().await, RedisHealth::Disconnected));
    }

    #[tokio::test]
    async fn fixed_window_enforces_limit() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let redis = RedisHandle::new(settings.redis().redis_url());
        if redis.connect().await.is_err() {
            eprintln!("skipping: redis unavailable");
            return;
        }

        let subject = Uuid::new_v4().to_string();
        assert!(redis.allow("test", &subject, 2).await.expect("first"));
        assert!(redis.allow("test", &subject, 2).await.expect("second"));
        assert!(!redis.allow("test", &subject, 2).await.expect("third"));
    }
}
