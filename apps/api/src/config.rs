use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};

use crate::matching::evaluator::DEFAULT_THRESHOLD;
use crate::matching::scheduler::WeeklySchedule;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub match_threshold: u32,
    pub scorer_timeout: Duration,
    pub weekly_match_enabled: bool,
    pub weekly_schedule: WeeklySchedule,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let match_threshold: u32 = parse_or(
            "MATCH_SCORE_THRESHOLD",
            env("MATCH_SCORE_THRESHOLD"),
            DEFAULT_THRESHOLD,
        )?;
        ensure!(
            match_threshold <= 100,
            "MATCH_SCORE_THRESHOLD must be between 0 and 100, got {match_threshold}"
        );

        let weekly_schedule = WeeklySchedule::new(
            parse_or("WEEKLY_MATCH_DAY", env("WEEKLY_MATCH_DAY"), 1)?,
            parse_or("WEEKLY_MATCH_HOUR", env("WEEKLY_MATCH_HOUR"), 3)?,
            parse_or("WEEKLY_MATCH_MINUTE", env("WEEKLY_MATCH_MINUTE"), 0)?,
            parse_or(
                "WEEKLY_MATCH_UTC_OFFSET_MINUTES",
                env("WEEKLY_MATCH_UTC_OFFSET_MINUTES"),
                0,
            )?,
        )
        .context("Invalid weekly match schedule")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                env("DATABASE_MAX_CONNECTIONS"),
                10,
            )?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_or("PORT", env("PORT"), 8080)?,
            rust_log: env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            match_threshold,
            scorer_timeout: Duration::from_secs(parse_or(
                "SCORER_TIMEOUT_SECS",
                env("SCORER_TIMEOUT_SECS"),
                180,
            )?),
            weekly_match_enabled: parse_flag(env("ENABLE_WEEKLY_MATCH").as_deref()),
            weekly_schedule,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parses `raw` when present, falling back to `default` when unset.
/// A present but malformed value is an error, never silently defaulted.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}

/// Only an explicit "1" or "true" (any case) enables a flag.
fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(|v| {
        let v = v.trim();
        v == "1" || v.eq_ignore_ascii_case("true")
    })
    .unwrap_or(false)
}
