use std::env;
use std::time::Duration;

use crate::history::MergeStrategy;

const DEFAULT_MATCH_DATA: &str = "equipos.json";
const DEFAULT_HISTORY: &str = "historial_partidos.json";
const DEFAULT_AUTH_CONFIG: &str = "auth_config.json";
const DEFAULT_LOCAL_API: &str = "http://localhost:8083";

/// Runtime settings resolved from the environment (after `.env` files are loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub match_data: String,
    pub history: String,
    pub auth_config: String,
    pub site_base: Option<String>,
    pub save_api_base: Option<String>,
    pub save_api_local: String,
    pub match_poll: Duration,
    pub history_poll: Duration,
    pub merge: MergeStrategy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            match_data: DEFAULT_MATCH_DATA.to_string(),
            history: DEFAULT_HISTORY.to_string(),
            auth_config: DEFAULT_AUTH_CONFIG.to_string(),
            site_base: None,
            save_api_base: None,
            save_api_local: DEFAULT_LOCAL_API.to_string(),
            match_poll: Duration::from_secs(5),
            history_poll: Duration::from_secs(30),
            merge: MergeStrategy::Length,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let match_poll = env::var("MATCH_POLL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(5)
            .max(2);
        let history_poll = env::var("HISTORY_POLL_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(30)
            .max(10);
        let merge = env::var("HISTORY_MERGE")
            .ok()
            .map(|val| parse_merge_strategy(&val))
            .unwrap_or(MergeStrategy::Length);

        Self {
            match_data: non_empty_env("MATCH_DATA_URL").unwrap_or(defaults.match_data),
            history: non_empty_env("HISTORY_URL").unwrap_or(defaults.history),
            auth_config: non_empty_env("AUTH_CONFIG_URL").unwrap_or(defaults.auth_config),
            site_base: non_empty_env("SITE_BASE_URL").map(|v| v.trim_end_matches('/').to_string()),
            save_api_base: non_empty_env("SAVE_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string()),
            save_api_local: non_empty_env("SAVE_API_LOCAL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.save_api_local),
            match_poll: Duration::from_secs(match_poll),
            history_poll: Duration::from_secs(history_poll),
            merge,
        }
    }

    /// Resolve a configured resource against `SITE_BASE_URL` when it is relative.
    pub fn resolve(&self, location: &str) -> String {
        if is_remote(location) {
            return location.to_string();
        }
        match self.site_base.as_deref() {
            Some(base) if is_remote(base) => {
                format!("{}/{}", base, location.trim_start_matches('/'))
            }
            _ => location.to_string(),
        }
    }
}

pub fn parse_merge_strategy(raw: &str) -> MergeStrategy {
    match raw.trim().to_ascii_lowercase().as_str() {
        "id" | "by_id" | "by-id" => MergeStrategy::ById,
        _ => MergeStrategy::Length,
    }
}

pub fn is_remote(location: &str) -> bool {
    let lower = location.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn non_empty_env(key: &str) -> Option<String> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
