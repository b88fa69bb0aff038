//! Service configuration.

use ml_rewards_core::EngineCatalog;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/ml-rewards").
    pub data_dir: String,

    /// JWT validation base URL; JWKS is fetched from
    /// `{auth_base_url}/.well-known/jwks.json`.
    pub auth_base_url: String,

    /// Expected JWT audience (default: "ml-rewards").
    pub auth_audience: String,

    /// Accept `test-token:<uuid>` bearer tokens instead of JWTs.
    /// Integration tests only; defaults to off.
    pub allow_test_tokens: bool,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// Admin API key for privileged endpoints.
    pub admin_api_key: Option<String>,

    /// Webhook URL for outbound engine events (optional).
    pub notify_webhook_url: Option<String>,

    /// API key sent with outbound webhook deliveries (optional).
    pub notify_webhook_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Minimum seconds between submissions per (user, exercise).
    pub submission_window_seconds: u64,

    /// Submissions claiming less time than this are rejected.
    pub min_submission_seconds: u32,

    /// Submissions claiming more time than this are rejected as an
    /// expired session.
    pub max_session_seconds: u32,

    /// Scheduled mission generation covers users active within this
    /// many days.
    pub active_user_window_days: i64,

    /// Finished missions older than this many days are purged.
    pub mission_retention_days: i64,

    /// Rank tiers, mission templates, and the achievement catalog.
    pub catalog: EngineCatalog,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/ml-rewards".into()),
            auth_base_url: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://auth.example.com".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "ml-rewards".into()),
            allow_test_tokens: env_bool("ALLOW_TEST_TOKENS", false),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            notify_webhook_key: std::env::var("NOTIFY_WEBHOOK_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES", 1024 * 1024),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS", 30),
            submission_window_seconds: env_parse("SUBMISSION_WINDOW_SECONDS", 5),
            min_submission_seconds: env_parse("MIN_SUBMISSION_SECONDS", 1),
            max_session_seconds: env_parse("MAX_SESSION_SECONDS", 24 * 60 * 60),
            active_user_window_days: env_parse("ACTIVE_USER_WINDOW_DAYS", 7),
            mission_retention_days: env_parse("MISSION_RETENTION_DAYS", 30),
            catalog: EngineCatalog::default(),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map_or(default, |s| matches!(s.as_str(), "1" | "true" | "yes"))
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/ml-rewards".into(),
            auth_base_url: "https://auth.example.com".into(),
            auth_audience: "ml-rewards".into(),
            allow_test_tokens: false,
            service_api_key: None,
            admin_api_key: None,
            notify_webhook_url: None,
            notify_webhook_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            submission_window_seconds: 5,
            min_submission_seconds: 1,
            max_session_seconds: 24 * 60 * 60,
            active_user_window_days: 7,
            mission_retention_days: 30,
            catalog: EngineCatalog::default(),
        }
    }
}
