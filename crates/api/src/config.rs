/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Fixed UTC offset of the storefront's display timezone, in minutes.
    /// Drives the "today" / "tomorrow" calendar boundaries on the homepage.
    pub display_tz_offset_minutes: i32,
    /// Cap on the homepage "tomorrow" section (display-only limit).
    pub homepage_tomorrow_limit: usize,
    /// How many times the allocator retries a contended offer lock before
    /// reporting `Contention` to the caller.
    pub allocation_retry_budget: u32,
    /// Base backoff between lock retries, in milliseconds. Each retry
    /// doubles it and adds jitter.
    pub allocation_retry_base_backoff_ms: u64,
    /// How long allocation attempts stay in the idempotency ledger.
    pub attempt_retention_hours: i64,
    /// Shared secret for the admin surface (`x-admin-token` header).
    pub admin_api_token: String,
    /// Base URL of the external catalog service. `None` skips variant
    /// verification at sale creation (local development).
    pub catalog_base_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default                 |
    /// |------------------------------------|-------------------------|
    /// | `HOST`                             | `0.0.0.0`               |
    /// | `PORT`                             | `3000`                  |
    /// | `CORS_ORIGINS`                     | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`             | `30`                    |
    /// | `DISPLAY_TZ_OFFSET_MINUTES`        | `0`                     |
    /// | `HOMEPAGE_TOMORROW_LIMIT`          | `3`                     |
    /// | `ALLOCATION_RETRY_BUDGET`          | `5`                     |
    /// | `ALLOCATION_RETRY_BASE_BACKOFF_MS` | `5`                     |
    /// | `ATTEMPT_RETENTION_HOURS`          | `48`                    |
    /// | `ADMIN_API_TOKEN`                  | `dev-admin-token`       |
    /// | `CATALOG_BASE_URL`                 | unset                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let display_tz_offset_minutes: i32 = std::env::var("DISPLAY_TZ_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("DISPLAY_TZ_OFFSET_MINUTES must be a valid i32");

        let homepage_tomorrow_limit: usize = std::env::var("HOMEPAGE_TOMORROW_LIMIT")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("HOMEPAGE_TOMORROW_LIMIT must be a valid usize");

        let allocation_retry_budget: u32 = std::env::var("ALLOCATION_RETRY_BUDGET")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("ALLOCATION_RETRY_BUDGET must be a valid u32");

        let allocation_retry_base_backoff_ms: u64 =
            std::env::var("ALLOCATION_RETRY_BASE_BACKOFF_MS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .expect("ALLOCATION_RETRY_BASE_BACKOFF_MS must be a valid u64");

        let attempt_retention_hours: i64 = std::env::var("ATTEMPT_RETENTION_HOURS")
            .unwrap_or_else(|_| "48".into())
            .parse()
            .expect("ATTEMPT_RETENTION_HOURS must be a valid i64");

        let admin_api_token =
            std::env::var("ADMIN_API_TOKEN").unwrap_or_else(|_| "dev-admin-token".into());

        let catalog_base_url = std::env::var("CATALOG_BASE_URL").ok();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            display_tz_offset_minutes,
            homepage_tomorrow_limit,
            allocation_retry_budget,
            allocation_retry_base_backoff_ms,
            attempt_retention_hours,
            admin_api_token,
            catalog_base_url,
        }
    }
}
