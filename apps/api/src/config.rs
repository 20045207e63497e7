use std::str::FromStr;

use anyhow::{Context, Result};

pub const DEFAULT_GENAI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// Application configuration loaded from environment variables.
/// Read once at startup. Every field has a default except the optional
/// credential and Redis URL; a malformed numeric value fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub rust_log: String,
    /// Absent key degrades suggestions, it does not block startup.
    pub genai_api_key: Option<String>,
    pub genai_api_url: String,
    pub genai_timeout_secs: u64,
    pub vectorizer_path: String,
    pub classifier_path: String,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub result_ttl_secs: u64,
    /// When set, rate limiting and the result handoff move to Redis.
    pub redis_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let debug = optional_env("DEBUG")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Ok(Config {
            host: optional_env("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_env("PORT", 5000)?,
            debug,
            rust_log: optional_env("RUST_LOG")
                .unwrap_or_else(|| if debug { "debug" } else { "info" }.to_string()),
            genai_api_key: optional_env("GENAI_API_KEY"),
            genai_api_url: optional_env("GENAI_API_URL")
                .unwrap_or_else(|| DEFAULT_GENAI_API_URL.to_string()),
            genai_timeout_secs: parse_env("GENAI_TIMEOUT_SECS", 30)?,
            vectorizer_path: optional_env("VECTORIZER_PATH")
                .unwrap_or_else(|| "model/tfidf.json".to_string()),
            classifier_path: optional_env("CLASSIFIER_PATH")
                .unwrap_or_else(|| "model/classifier.json".to_string()),
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", 5)?,
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 60)?,
            result_ttl_secs: parse_env("RESULT_TTL_SECS", 600)?,
            redis_url: optional_env("REDIS_URL"),
        })
    }
}

/// Returns the variable's value, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with no credential and no Redis, for handler tests.
    pub fn for_tests() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            debug: false,
            rust_log: "info".to_string(),
            genai_api_key: None,
            genai_api_url: DEFAULT_GENAI_API_URL.to_string(),
            genai_timeout_secs: 30,
            vectorizer_path: "model/tfidf.json".to_string(),
            classifier_path: "model/classifier.json".to_string(),
            rate_limit_max_requests: 5,
            rate_limit_window_secs: 60,
            result_ttl_secs: 600,
            redis_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("SCREENER_TEST_UNSET_VALUE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_reads_value() {
        std::env::set_var("SCREENER_TEST_WINDOW", " 90 ");
        let value: u64 = parse_env("SCREENER_TEST_WINDOW", 60).unwrap();
        assert_eq!(value, 90);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("SCREENER_TEST_PORT", "eighty");
        let err = parse_env::<u16>("SCREENER_TEST_PORT", 5000).unwrap_err();
        assert!(err.to_string().contains("SCREENER_TEST_PORT"));
    }

    #[test]
    fn test_blank_env_is_treated_as_unset() {
        std::env::set_var("SCREENER_TEST_BLANK", "   ");
        assert_eq!(optional_env("SCREENER_TEST_BLANK"), None);
    }
}
