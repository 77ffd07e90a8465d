// src/config/settings.rs
use std::{env, path::PathBuf, time::Duration};

// --- env names ---
pub const ENV_GENAI_API_KEY: &str = "GENAI_API_KEY";
pub const ENV_GENAI_MODEL: &str = "GENAI_MODEL";
pub const ENV_CSE_API_KEY: &str = "CSE_API_KEY";
pub const ENV_CSE_ID: &str = "CSE_ID";
pub const ENV_CANNED_CLAIMS_PATH: &str = "CANNED_CLAIMS_PATH";
pub const ENV_TRUSTED_DOMAINS_PATH: &str = "TRUSTED_DOMAINS_PATH";
pub const ENV_SEARCH_LIMIT: &str = "SEARCH_LIMIT";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

// --- defaults ---
pub const DEFAULT_GENAI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_CANNED_CLAIMS_PATH: &str = "data/canned_claims.json";
pub const DEFAULT_TRUSTED_DOMAINS_PATH: &str = "config/trusted_domains.toml";
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 8;

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub genai_api_key: Option<String>,
    pub genai_model: String,
    pub cse_api_key: Option<String>,
    pub cse_id: Option<String>,
    pub canned_claims_path: PathBuf,
    pub trusted_domains_path: PathBuf,
    /// 1..=10
    pub search_limit: usize,
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            genai_api_key: None,
            genai_model: DEFAULT_GENAI_MODEL.to_string(),
            cse_api_key: None,
            cse_id: None,
            canned_claims_path: PathBuf::from(DEFAULT_CANNED_CLAIMS_PATH),
            trusted_domains_path: PathBuf::from(DEFAULT_TRUSTED_DOMAINS_PATH),
            search_limit: DEFAULT_SEARCH_LIMIT,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Read settings from the process environment. Never fails: blank values count as
    /// unset and unparsable numbers fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Same as `from_env`, with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let d = Self::default();

        let search_limit = get(ENV_SEARCH_LIMIT)
            .and_then(|s| s.parse::<usize>().ok())
            .map(|n| n.clamp(1, 10))
            .unwrap_or(d.search_limit);

        let http_timeout = get(ENV_HTTP_TIMEOUT_SECS)
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .map(Duration::from_secs)
            .unwrap_or(d.http_timeout);

        Self {
            genai_api_key: get(ENV_GENAI_API_KEY),
            genai_model: get(ENV_GENAI_MODEL).unwrap_or(d.genai_model),
            cse_api_key: get(ENV_CSE_API_KEY),
            cse_id: get(ENV_CSE_ID),
            canned_claims_path: get(ENV_CANNED_CLAIMS_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.canned_claims_path),
            trusted_domains_path: get(ENV_TRUSTED_DOMAINS_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.trusted_domains_path),
            search_limit,
            http_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Settings {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| m.get(k).cloned())
    }

    #[test]
    fn empty_env_gives_defaults() {
        assert_eq!(from_map(&[]), Settings::default());
    }

    #[test]
    fn reads_all_values() {
        let s = from_map(&[
            (ENV_GENAI_API_KEY, "g-key"),
            (ENV_GENAI_MODEL, "gemini-2.0-flash"),
            (ENV_CSE_API_KEY, "c-key"),
            (ENV_CSE_ID, "cx"),
            (ENV_CANNED_CLAIMS_PATH, "/srv/canned.json"),
            (ENV_TRUSTED_DOMAINS_PATH, "/srv/trusted.toml"),
            (ENV_SEARCH_LIMIT, "3"),
            (ENV_HTTP_TIMEOUT_SECS, "2"),
        ]);
        assert_eq!(s.genai_api_key.as_deref(), Some("g-key"));
        assert_eq!(s.genai_model, "gemini-2.0-flash");
        assert_eq!(s.cse_id.as_deref(), Some("cx"));
        assert_eq!(s.canned_claims_path, PathBuf::from("/srv/canned.json"));
        assert_eq!(s.search_limit, 3);
        assert_eq!(s.http_timeout, Duration::from_secs(2));
    }

    #[test]
    fn blank_and_invalid_values_fall_back() {
        let s = from_map(&[
            (ENV_GENAI_API_KEY, "   "),
            (ENV_SEARCH_LIMIT, "lots"),
            (ENV_HTTP_TIMEOUT_SECS, "0"),
        ]);
        assert_eq!(s.genai_api_key, None);
        assert_eq!(s.search_limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(s.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn search_limit_is_clamped() {
        assert_eq!(from_map(&[(ENV_SEARCH_LIMIT, "50")]).search_limit, 10);
        assert_eq!(from_map(&[(ENV_SEARCH_LIMIT, "0")]).search_limit, 1);
    }
}
