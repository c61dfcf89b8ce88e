use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;
use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    // Login lockout
    pub login_max_failures: u32,
    pub login_lockout_minutes: u64,
    /// Take the client address from the last `X-Forwarded-For` hop
    pub trust_proxy: bool,

    /// Base allotment handed out by `POST /balance/init`
    pub default_leave_days: Decimal,
    pub api_prefix: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed(&lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed(&lookup, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parsed(&lookup, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            login_max_failures: parsed(&lookup, "LOGIN_MAX_FAILURES", 5)?,
            login_lockout_minutes: parsed(&lookup, "LOGIN_LOCKOUT_MINUTES", 30)?,
            trust_proxy: parsed(&lookup, "TRUST_PROXY", false)?,

            default_leave_days: parsed(&lookup, "DEFAULT_LEAVE_DAYS", Decimal::from(26))?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api/v1".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }

    pub fn lockout_window(&self) -> Duration {
        Duration::from_secs(self.login_lockout_minutes * 60)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
