use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "THREADLINE_DATABASE_URL")]
    pub database_url: String,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub messaging: MessagingConfig,

    #[command(flatten)]
    pub notifications: NotificationConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "THREADLINE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "THREADLINE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management (health probe) listener
    #[arg(long, env = "THREADLINE_MGMT_PORT", default_value_t = 3001)]
    pub mgmt_port: u16,

    /// Seconds to wait for background tasks during shutdown
    #[arg(long, env = "THREADLINE_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "THREADLINE_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,

    /// Reject requests outside the open hours window
    #[arg(long, env = "THREADLINE_QUIET_HOURS_ENABLED", default_value_t = false)]
    pub quiet_hours_enabled: bool,

    /// First hour of the day (UTC) at which requests are accepted
    #[arg(long, env = "THREADLINE_OPEN_HOUR", default_value_t = 6)]
    pub open_hour: u8,

    /// Hour of the day (UTC) from which requests are rejected again
    #[arg(long, env = "THREADLINE_CLOSE_HOUR", default_value_t = 21)]
    pub close_hour: u8,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for JWT signing
    #[arg(long, env = "THREADLINE_JWT_SECRET")]
    pub jwt_secret: String,

    /// Access token time-to-live in seconds
    #[arg(long, env = "THREADLINE_ACCESS_TOKEN_TTL_SECS", default_value_t = 900)]
    pub access_token_ttl_secs: u64,

    /// Refresh token time-to-live in days
    #[arg(long, env = "THREADLINE_REFRESH_TOKEN_TTL_DAYS", default_value_t = 30)]
    pub refresh_token_ttl_days: i64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long, env = "THREADLINE_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long, env = "THREADLINE_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter rate limit for expensive auth-related endpoints (register/login)
    #[arg(long, env = "THREADLINE_AUTH_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub auth_per_second: u32,

    /// Burst allowance for expensive auth-related endpoints
    #[arg(long, env = "THREADLINE_AUTH_RATE_LIMIT_BURST", default_value_t = 3)]
    pub auth_burst: u32,

    /// Message sends allowed per minute per client IP
    #[arg(long, env = "THREADLINE_SEND_RATE_LIMIT_PER_MINUTE", default_value_t = 5)]
    pub send_per_minute: u32,

    /// Burst allowance for message sends
    #[arg(long, env = "THREADLINE_SEND_RATE_LIMIT_BURST", default_value_t = 5)]
    pub send_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct MessagingConfig {
    /// Default page size for message and inbox listings
    #[arg(long, env = "THREADLINE_PAGE_SIZE", default_value_t = 20)]
    pub page_size: i64,

    /// Maximum page size a client may request
    #[arg(long, env = "THREADLINE_MAX_PAGE_SIZE", default_value_t = 100)]
    pub max_page_size: i64,

    /// Hours after creation during which a message may still be edited
    #[arg(long, env = "THREADLINE_EDIT_WINDOW_HOURS", default_value_t = 24)]
    pub edit_window_hours: i64,

    /// Maximum number of edits per message
    #[arg(long, env = "THREADLINE_MAX_EDITS", default_value_t = 5)]
    pub max_edits: i32,

    /// How often the inbox sweeper runs
    #[arg(long, env = "THREADLINE_SWEEP_INTERVAL_SECS", default_value_t = 3600)]
    pub sweep_interval_secs: u64,

    /// Age in days after which unread messages are auto-marked read
    #[arg(long, env = "THREADLINE_SWEEP_AFTER_DAYS", default_value_t = 30)]
    pub sweep_after_days: i64,

    /// Maximum rows the sweeper touches per batch
    #[arg(long, env = "THREADLINE_SWEEP_BATCH_LIMIT", default_value_t = 500)]
    pub sweep_batch_limit: i64,

    /// Seconds an inbox summary may be served from cache
    #[arg(long, env = "THREADLINE_SUMMARY_CACHE_TTL_SECS", default_value_t = 30)]
    pub summary_cache_ttl_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct NotificationConfig {
    /// Webhook URL notifications are pushed to; dispatch is disabled when unset
    #[arg(long, env = "THREADLINE_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// How often the notification dispatch worker runs
    #[arg(long, env = "THREADLINE_DISPATCH_INTERVAL_SECS", default_value_t = 15)]
    pub dispatch_interval_secs: u64,

    /// Maximum notifications dispatched per worker iteration
    #[arg(long, env = "THREADLINE_DISPATCH_BATCH_LIMIT", default_value_t = 50)]
    pub dispatch_batch_limit: i64,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP endpoint for traces and metrics; exporting is disabled when unset
    #[arg(long, env = "THREADLINE_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "THREADLINE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }
}
