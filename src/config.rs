use std::env;
use std::time::Duration;

use crate::error::MonitorError;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub name: Option<String>,
    pub startup_delay: Duration,
    pub interval: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            api_key: None,
            name: None,
            startup_delay: Duration::from_secs(10),
            interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, MonitorError> {
        dotenv::dotenv().ok();
        Self::load(|key| env::var(key).ok())
    }

    /// Load using an arbitrary lookup; missing keys fall back to defaults.
    pub fn load<F>(lookup: F) -> Result<Self, MonitorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            base_url:        get_env(&lookup, "JOB_MONITOR_BASE_URL", "http://127.0.0.1:5000")?,
            api_key:         get_opt(&lookup, "JOB_MONITOR_API_KEY"),
            name:            get_opt(&lookup, "JOB_MONITOR_NAME"),
            startup_delay:   get_ms(&lookup, "JOB_MONITOR_STARTUP_DELAY_MS", "10000")?,
            interval:        get_ms(&lookup, "JOB_MONITOR_INTERVAL_MS", "30000")?,
            request_timeout: get_ms(&lookup, "JOB_MONITOR_TIMEOUT_MS", "10000")?,
            log_level:       get_env(&lookup, "JOB_MONITOR_LOG", "info")?,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// --- PRIVATE HELPERS ---

fn get_env<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, MonitorError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.parse().map_err(|_| MonitorError::Config { key, value: raw })
}

fn get_ms<F>(lookup: &F, key: &'static str, default: &str) -> Result<Duration, MonitorError>
where
    F: Fn(&str) -> Option<String>,
{
    get_env::<F, u64>(lookup, key, default).map(Duration::from_millis)
}

fn get_opt<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}
