use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter::FilterCriteria;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    match profiled_env_opt(profile, key) {
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, default, "not a number, using default");
            default
        }),
        None => default,
    }
}

fn profiled_env_bool(profile: &str, key: &str) -> bool {
    matches!(
        profiled_env_or(profile, key, "false").to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Comma-separated list: split, trim, drop empties.
fn profiled_env_list(profile: &str, key: &str) -> Vec<String> {
    profiled_env_opt(profile, key)
        .map(|v| parse_list(&v))
        .unwrap_or_default()
}

/// Header list `Name: value, Other: value`. Entries without a colon are
/// skipped with a warning.
pub fn parse_headers(value: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for entry in parse_list(value) {
        match entry.split_once(':') {
            Some((name, val)) if !name.trim().is_empty() => {
                headers.insert(name.trim().to_string(), val.trim().to_string());
            }
            _ => tracing::warn!(entry = %entry, "malformed header entry, skipping"),
        }
    }
    headers
}

pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Mask a secret for logs: `[NOT SET]`, `****`, or `abcd****wxyz`.
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        None | Some("") => "[NOT SET]".to_string(),
        Some(s) if s.chars().count() <= 8 => "****".to_string(),
        Some(s) => {
            let chars: Vec<char> = s.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}****{tail}")
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub monitor: MonitorConfig,
    pub store: StoreConfig,
    pub filter: FilterCriteria,
    pub search: SearchConfig,
    pub console: ConsoleConfig,
    pub telegram: TelegramConfig,
    pub webhook: WebhookConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `JOBWATCH_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("JOBWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            monitor: MonitorConfig::from_env_profiled(p),
            store: StoreConfig::from_env_profiled(p),
            filter: FilterCriteria {
                excluded_titles: profiled_env_list(p, "EXCLUDED_TITLE_TERMS"),
                positions: profiled_env_list(p, "SEARCH_POSITIONS"),
                levels: profiled_env_list(p, "SEARCH_LEVELS"),
                excluded_descriptions: profiled_env_list(p, "EXCLUDED_PAGE_TERMS"),
            },
            search: SearchConfig::from_env_profiled(p),
            console: ConsoleConfig::from_env_profiled(p),
            telegram: TelegramConfig::from_env_profiled(p),
            webhook: WebhookConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Check value ranges the scheduler depends on, and that description
    /// validation has terms to match against.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;
        if self.search.validate_descriptions
            && (self.filter.positions.is_empty() || self.filter.levels.is_empty())
        {
            return Err(ConfigError::Invalid {
                key: "VALIDATE_DESCRIPTIONS",
                value: "true".to_string(),
                reason: "requires SEARCH_POSITIONS and SEARCH_LEVELS, otherwise every posting is rejected",
            });
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  monitor:   interval={}m, sleep_hour={}, sleep_hours={}, source_timeout={}s",
            self.monitor.check_interval_minutes,
            self.monitor.sleep_hour,
            self.monitor.sleep_hours,
            self.monitor.source_timeout_secs,
        );
        tracing::info!("  store:     jobs_file={}", self.store.jobs_file.display());
        tracing::info!(
            "  filter:    excluded_titles={:?}, positions={:?}, levels={:?}",
            self.filter.excluded_titles,
            self.filter.positions,
            self.filter.levels,
        );
        tracing::info!(
            "  search:    api_key={}, cx={}, country={}",
            mask_secret(self.search.api_key.as_deref()),
            self.search.search_engine_id.as_deref().unwrap_or("(none)"),
            self.search.country_code,
        );
        tracing::info!(
            "  telegram:  token={}, chat_id={}",
            mask_secret(self.telegram.bot_token.as_deref()),
            self.telegram.chat_id.as_deref().unwrap_or("(none)"),
        );
        tracing::info!(
            "  webhook:   url={}, headers={:?}",
            if self.webhook.is_configured() { "(set)" } else { "(none)" },
            self.webhook.headers.keys().collect::<Vec<_>>()
        );
    }
}

// ── Monitor ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub check_interval_minutes: u32,
    /// Local hour (0-23) at which the quiet window starts.
    pub sleep_hour: u32,
    /// Length of the quiet window.
    pub sleep_hours: u32,
    pub source_timeout_secs: u32,
}

impl MonitorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            check_interval_minutes: profiled_env_u32(p, "CHECK_INTERVAL_MINUTES", 60),
            sleep_hour: profiled_env_u32(p, "SLEEP_HOUR", 23),
            sleep_hours: profiled_env_u32(p, "SLEEP_TIME_HOURS", 7),
            source_timeout_secs: profiled_env_u32(p, "SOURCE_TIMEOUT_SECS", 300),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.check_interval_minutes) * 60)
    }

    pub fn sleep_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.sleep_hours) * 3600)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.source_timeout_secs))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                key: "CHECK_INTERVAL_MINUTES",
                value: self.check_interval_minutes.to_string(),
                reason: "must be greater than zero",
            });
        }
        if self.sleep_hour > 23 {
            return Err(ConfigError::Invalid {
                key: "SLEEP_HOUR",
                value: self.sleep_hour.to_string(),
                reason: "must be an hour between 0 and 23",
            });
        }
        if self.sleep_hours == 0 {
            return Err(ConfigError::Invalid {
                key: "SLEEP_TIME_HOURS",
                value: self.sleep_hours.to_string(),
                reason: "must be greater than zero",
            });
        }
        if self.source_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SOURCE_TIMEOUT_SECS",
                value: self.source_timeout_secs.to_string(),
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: 60,
            sleep_hour: 23,
            sleep_hours: 7,
            source_timeout_secs: 300,
        }
    }
}

// ── Store ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub jobs_file: PathBuf,
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            jobs_file: PathBuf::from(profiled_env_or(p, "JOBS_FILE", "jobs.txt")),
        }
    }
}

// ── Google Custom Search ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub country_code: String,
    pub locations: Vec<String>,
    /// Run fetched snippets through description validation.
    pub validate_descriptions: bool,
}

impl SearchConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_key: profiled_env_opt(p, "API_KEY"),
            search_engine_id: profiled_env_opt(p, "CX"),
            country_code: profiled_env_or(p, "GOOGLE_COUNTRY_CODE", "IL"),
            locations: profiled_env_list(p, "SEARCH_LOCATIONS"),
            validate_descriptions: profiled_env_bool(p, "VALIDATE_DESCRIPTIONS"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.search_engine_id.is_some()
    }
}

// ── Console ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub snippet_max_length: u32,
}

impl ConsoleConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            snippet_max_length: profiled_env_u32(p, "SNIPPET_MAX_LENGTH", 80),
        }
    }
}

// ── Telegram ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// `MarkdownV2`, `HTML`, or unset for plain text.
    pub parse_mode: Option<String>,
}

impl TelegramConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            bot_token: profiled_env_opt(p, "TELEGRAM_BOT_TOKEN"),
            chat_id: profiled_env_opt(p, "TELEGRAM_CHAT_ID"),
            parse_mode: profiled_env_opt(p, "TELEGRAM_PARSE_MODE"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }
}

// ── Webhook ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub method: Option<String>,
    /// Extra request headers; values may reference `${VAR}`.
    pub headers: HashMap<String, String>,
    pub body_template: Option<String>,
}

impl WebhookConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "WEBHOOK_URL"),
            method: profiled_env_opt(p, "WEBHOOK_METHOD"),
            headers: profiled_env_opt(p, "WEBHOOK_HEADERS")
                .map(|v| parse_headers(&v))
                .unwrap_or_default(),
            body_template: profiled_env_opt(p, "WEBHOOK_BODY_TEMPLATE"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}
