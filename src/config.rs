//! Environment configuration for the chat console

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
const DEFAULT_PAGE_LIMIT: u32 = 50;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
/// The backend falls back to a smaller page above this
const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend origin; `/api/chat/...` is appended
    pub base_url: String,
    pub poll_interval: Duration,
    /// Messages requested per fetch
    pub page_limit: u32,
    pub http_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            page_limit: DEFAULT_PAGE_LIMIT,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable values use defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let base_url = lookup("CHAT_API_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);

        let poll_interval = number("CHAT_POLL_INTERVAL_SECS")
            .filter(|secs| *secs > 0)
            .map_or(defaults.poll_interval, Duration::from_secs);

        let page_limit = number("CHAT_PAGE_LIMIT")
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| (1..=MAX_PAGE_LIMIT).contains(n))
            .unwrap_or(defaults.page_limit);

        let http_timeout = number("CHAT_HTTP_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .map_or(defaults.http_timeout, Duration::from_secs);

        Self {
            base_url,
            poll_interval,
            page_limit,
            http_timeout,
        }
    }
}
