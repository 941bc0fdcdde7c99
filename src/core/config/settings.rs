use super::parsing::{
    env_optional, env_or_default, normalize_api_prefix, parse_bool, parse_cors_origins,
    parse_environment, parse_percentage, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, AiSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings,
    QuizSettings, RateLimitSettings, RedisSettings, RuntimeSettings, SandboxSettings,
    SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings,
    WorkerSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("PLURALSKILL_HOST", "0.0.0.0");
        let port = env_or_default("PLURALSKILL_PORT", "8000");

        let environment = parse_environment(
            env_optional("PLURALSKILL_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("PLURALSKILL_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "PluralSkill API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_prefix = normalize_api_prefix(env_or_default("API_PREFIX", "/api"));

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "pluralskill");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "pluralskill");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DB_MAX_CONNECTIONS", env_or_default("DB_MAX_CONNECTIONS", "20"))?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let openai_api_key = env_or_default("OPENAI_API_KEY", "");
        let openai_base_url = env_or_default("OPENAI_BASE_URL", "");
        let ai_model = env_or_default("AI_MODEL", "gpt-4o-mini");
        let ai_max_tokens = parse_u32("AI_MAX_TOKENS", env_or_default("AI_MAX_TOKENS", "4000"))?;
        let ai_request_timeout =
            parse_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "120"))?;

        let sandbox_base_url = env_or_default("SANDBOX_BASE_URL", "");
        let sandbox_api_key = env_or_default("SANDBOX_API_KEY", "");
        let sandbox_request_timeout = parse_u64(
            "SANDBOX_REQUEST_TIMEOUT",
            env_or_default("SANDBOX_REQUEST_TIMEOUT", "30"),
        )?;

        let max_attempts =
            parse_u32("QUIZ_MAX_ATTEMPTS", env_or_default("QUIZ_MAX_ATTEMPTS", "2"))?;
        let pass_threshold =
            parse_percentage("QUIZ_PASS_THRESHOLD", env_or_default("QUIZ_PASS_THRESHOLD", "80"))?;
        let require_modules_complete = env_optional("QUIZ_REQUIRE_MODULES_COMPLETE")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);

        let auth_per_minute = parse_u64(
            "RATE_LIMIT_AUTH_PER_MINUTE",
            env_or_default("RATE_LIMIT_AUTH_PER_MINUTE", "20"),
        )?;
        let verify_per_minute = parse_u64(
            "RATE_LIMIT_VERIFY_PER_MINUTE",
            env_or_default("RATE_LIMIT_VERIFY_PER_MINUTE", "60"),
        )?;

        let first_admin_email = env_or_default("FIRST_ADMIN_EMAIL", "admin@pluralskill.com");
        let first_admin_password = env_or_default("FIRST_ADMIN_PASSWORD", "");

        let reconcile_interval_seconds = parse_u64(
            "COUNTER_RECONCILE_INTERVAL_SECONDS",
            env_or_default("COUNTER_RECONCILE_INTERVAL_SECONDS", "300"),
        )?;

        let log_level = env_or_default("PLURALSKILL_LOG_LEVEL", "info");
        let json = env_optional("PLURALSKILL_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings { host: ServerHost::parse(host)?, port: ServerPort::parse(port)? },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_prefix },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            ai: AiSettings {
                openai_api_key,
                openai_base_url,
                ai_model,
                ai_max_tokens,
                ai_request_timeout,
            },
            sandbox: SandboxSettings {
                base_url: sandbox_base_url,
                api_key: sandbox_api_key,
                request_timeout: sandbox_request_timeout,
            },
            quiz: QuizSettings { max_attempts, pass_threshold, require_modules_complete },
            rate_limit: RateLimitSettings { auth_per_minute, verify_per_minute },
            admin: AdminSettings { first_admin_email, first_admin_password },
            worker: WorkerSettings { reconcile_interval_seconds },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub(crate) fn sandbox(&self) -> &SandboxSettings {
        &self.sandbox
    }

    pub(crate) fn quiz(&self) -> &QuizSettings {
        &self.quiz
    }

    pub(crate) fn rate_limit(&self) -> &RateLimitSettings {
        &self.rate_limit
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn worker(&self) -> &WorkerSettings {
        &self.worker
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.quiz.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "QUIZ_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        if self.worker.reconcile_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "COUNTER_RECONCILE_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if !self.security.algorithm.eq_ignore_ascii_case("HS256") {
            return Err(ConfigError::InvalidValue {
                field: "ALGORITHM",
                value: self.security.algorithm.clone(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if env_optional("SECRET_KEY").is_none() {
            return Err(ConfigError::MissingSecret("SECRET_KEY"));
        }
        if self.admin.first_admin_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD"));
        }

        Ok(())
    }
}
